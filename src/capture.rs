//! The acquisition state machine.
//!
//! One iteration renders one stimulus frame, reads one camera frame and, in
//! the capture phase only, persists it. Phase is recomputed from the wall
//! clock on every iteration, so slow or failed camera reads shorten the
//! captured window instead of stretching it.

use anyhow::Result;
use log::{debug, info, warn};

use crate::dataset::DatasetWriter;
use crate::devices::{Clock, FrameSink, FrameSource, UserSignal};
use crate::error::CaptureError;
use crate::session::SessionConfig;
use crate::stimulus::StimulusRenderer;
use crate::types::{CalibrationPoint, PhaseState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    MoveWait,
    CaptureWindow,
    Cancelled,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOutcome {
    Completed { saved: usize },
    Aborted { saved: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Finished { points: usize, records: usize },
    Cancelled { completed_points: usize, records: usize },
}

impl SessionOutcome {
    pub fn records(&self) -> usize {
        match *self {
            SessionOutcome::Finished { records, .. }
            | SessionOutcome::Cancelled { records, .. } => records,
        }
    }
}

pub struct CaptureLoop<'a> {
    session: &'a SessionConfig,
    source: &'a mut dyn FrameSource,
    sink: &'a mut dyn FrameSink,
    writer: &'a mut DatasetWriter,
    clock: &'a dyn Clock,
    renderer: StimulusRenderer,
    state: LoopState,
    consecutive_failures: u32,
    failed_reads: u64,
}

impl<'a> CaptureLoop<'a> {
    pub fn new(
        session: &'a SessionConfig,
        source: &'a mut dyn FrameSource,
        sink: &'a mut dyn FrameSink,
        writer: &'a mut DatasetWriter,
        clock: &'a dyn Clock,
    ) -> Self {
        let renderer = StimulusRenderer::new(
            session.screen_width as usize,
            session.screen_height as usize,
            session.show_progress,
        );
        Self {
            session,
            source,
            sink,
            writer,
            clock,
            renderer,
            state: LoopState::Idle,
            consecutive_failures: 0,
            failed_reads: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Camera reads that failed over the whole session so far.
    pub fn failed_reads(&self) -> u64 {
        self.failed_reads
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            debug!("{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    pub fn run(&mut self, points: &[CalibrationPoint]) -> Result<SessionOutcome> {
        let total = points.len();
        info!("Starting calibration over {} points.", total);

        let mut records = 0;
        for (index, &point) in points.iter().enumerate() {
            debug!("Point {}/{} at ({}, {})", index + 1, total, point.x, point.y);
            match self.run_point(index, total, point)? {
                PointOutcome::Completed { saved } => records += saved,
                PointOutcome::Aborted { saved } => {
                    records += saved;
                    self.transition(LoopState::Cancelled);
                    info!("User interrupted calibration early.");
                    return Ok(SessionOutcome::Cancelled { completed_points: index, records });
                }
            }
        }

        self.transition(LoopState::Finished);
        if self.failed_reads > 0 {
            warn!("{} camera reads failed during the session", self.failed_reads);
        }
        Ok(SessionOutcome::Finished { points: total, records })
    }

    fn run_point(
        &mut self,
        index: usize,
        total: usize,
        point: CalibrationPoint,
    ) -> Result<PointOutcome> {
        let timing = self.session.phase_clock;
        let start = self.clock.now();
        let mut saved = 0;

        loop {
            let now = self.clock.now();
            let elapsed = now - start;

            let phase = timing.phase(elapsed);
            match phase {
                PhaseState::Move => self.transition(LoopState::MoveWait),
                PhaseState::Capture => self.transition(LoopState::CaptureWindow),
                PhaseState::Done => break,
            }

            let radius = timing.radius(elapsed);
            let stimulus = self
                .renderer
                .render_with_progress(point, phase, radius, index, total);
            self.sink.present(stimulus)?;

            match self.source.capture() {
                Ok(frame) => {
                    self.consecutive_failures = 0;
                    if phase == PhaseState::Capture {
                        self.writer.record(&frame, point, now)?;
                        saved += 1;
                    }
                }
                Err(e) => {
                    self.consecutive_failures += 1;
                    self.failed_reads += 1;
                    warn!("Failed to read frame: {:#}", e);
                    if let Some(limit) = self.session.max_consecutive_failures {
                        if self.consecutive_failures >= limit {
                            let consecutive = self.consecutive_failures;
                            return Err(CaptureError::CameraStalled { consecutive }.into());
                        }
                    }
                }
            }

            if self.sink.poll_signal() == Some(UserSignal::Cancel) {
                return Ok(PointOutcome::Aborted { saved });
            }
        }

        Ok(PointOutcome::Completed { saved })
    }
}
