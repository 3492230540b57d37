use std::f64::consts::PI;

use crate::config::{StimulusConfig, TimingConfig};
use crate::types::PhaseState;

pub fn classify(elapsed: f64, move_duration: f64, capture_duration: f64) -> PhaseState {
    if elapsed < move_duration {
        PhaseState::Move
    } else if elapsed < move_duration + capture_duration {
        PhaseState::Capture
    } else {
        PhaseState::Done
    }
}

/// Sinusoidal "pumping" radius. Same waveform in every phase; bounded by
/// `[base_radius, base_radius + amplitude]`.
pub fn pulse_radius(elapsed: f64, base_radius: f64, amplitude: f64, pulse_freq: f64) -> f64 {
    let angle = 2.0 * PI * pulse_freq * elapsed;
    base_radius + amplitude * 0.5 * (1.0 + angle.sin())
}

/// Timing and pulse parameters for one target window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseClock {
    pub move_duration: f64,
    pub capture_duration: f64,
    pub base_radius: f64,
    pub amplitude: f64,
    pub pulse_freq: f64,
}

impl PhaseClock {
    pub fn new(timing: &TimingConfig, stimulus: &StimulusConfig) -> Self {
        Self {
            move_duration: timing.move_duration,
            capture_duration: timing.capture_duration,
            base_radius: stimulus.base_radius,
            amplitude: stimulus.amplitude,
            pulse_freq: stimulus.pulse_freq,
        }
    }

    pub fn phase(&self, elapsed: f64) -> PhaseState {
        classify(elapsed, self.move_duration, self.capture_duration)
    }

    pub fn radius(&self, elapsed: f64) -> f64 {
        pulse_radius(elapsed, self.base_radius, self.amplitude, self.pulse_freq)
    }

    /// Total time one target stays on screen.
    pub fn window(&self) -> f64 {
        self.move_duration + self.capture_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> PhaseClock {
        PhaseClock {
            move_duration: 1.0,
            capture_duration: 1.5,
            base_radius: 15.0,
            amplitude: 10.0,
            pulse_freq: 1.5,
        }
    }

    #[test]
    fn test_phase_boundaries() {
        let c = clock();
        assert_eq!(c.phase(0.0), PhaseState::Move);
        assert_eq!(c.phase(0.5), PhaseState::Move);
        assert_eq!(c.phase(0.999), PhaseState::Move);
        assert_eq!(c.phase(1.0), PhaseState::Capture);
        assert_eq!(c.phase(1.2), PhaseState::Capture);
        assert_eq!(c.phase(2.499), PhaseState::Capture);
        assert_eq!(c.phase(2.5), PhaseState::Done);
        assert_eq!(c.phase(2.6), PhaseState::Done);
        assert_eq!(c.window(), 2.5);
    }

    #[test]
    fn test_phase_depends_only_on_elapsed() {
        let c = clock();
        // Out-of-order and repeated queries give the same answers
        let samples = [2.6, 0.5, 1.2, 0.5, 2.6, 1.2];
        let first: Vec<_> = samples.iter().map(|&e| c.phase(e)).collect();
        let second: Vec<_> = samples.iter().rev().map(|&e| c.phase(e)).rev().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_radius_stays_in_bounds() {
        let c = clock();
        let mut t = 0.0;
        while t < 10.0 {
            let r = c.radius(t);
            assert!(r >= 15.0 && r <= 25.0, "radius {} out of bounds at t={}", r, t);
            t += 0.001;
        }
        // Peaks and troughs of the sine
        assert!((c.radius(1.0 / 6.0) - 25.0).abs() < 1e-9);
        assert!((c.radius(0.5) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_radius_repeats_every_period() {
        let c = clock();
        let at_zero = c.radius(0.0);
        assert_eq!(at_zero, 20.0);
        for k in 0..20 {
            let t = k as f64 / 1.5;
            assert!((c.radius(t) - at_zero).abs() < 1e-9, "k={} r={}", k, c.radius(t));
        }
    }
}
