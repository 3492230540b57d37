use anyhow::{ensure, Result};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::GridConfig;
use crate::types::CalibrationPoint;

/// `n` evenly spaced samples over `[start, end]`, numpy style: one sample sits at `start`.
fn linspace(start: f64, end: f64, n: u32) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Axis positions for one dimension, margin and samples rounded to whole pixels.
fn axis(dimension: u32, margin_ratio: f64, n: u32) -> Vec<i32> {
    let margin = (dimension as f64 * margin_ratio).round();
    linspace(margin, dimension as f64 - margin, n)
        .into_iter()
        .map(|v| v.round() as i32)
        .collect()
}

/// Row-major grid of targets inside the margin rectangle, before shuffling.
pub fn grid_points(width: u32, height: u32, grid: &GridConfig) -> Result<Vec<CalibrationPoint>> {
    ensure!(
        grid.cols > 0 && grid.rows > 0,
        "grid needs at least one column and one row (got {}x{})",
        grid.cols,
        grid.rows
    );
    ensure!(
        (0.0..0.5).contains(&grid.margin_ratio),
        "margin ratio must be in [0, 0.5), got {}",
        grid.margin_ratio
    );

    let xs = axis(width, grid.margin_ratio, grid.cols);
    let ys = axis(height, grid.margin_ratio, grid.rows);

    Ok(ys
        .iter()
        .flat_map(|&y| xs.iter().map(move |&x| CalibrationPoint::new(x, y)))
        .collect())
}

/// Grid of targets presented in random order, so the subject cannot learn a scan pattern.
pub fn make_grid_points<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    grid: &GridConfig,
    rng: &mut R,
) -> Result<Vec<CalibrationPoint>> {
    let mut points = grid_points(width, height, grid)?;
    points.shuffle(rng);
    Ok(points)
}
