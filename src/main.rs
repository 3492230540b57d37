use anyhow::Context;
use chrono::Local;
use clap::Parser;
use colored::*;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use gaze_collect::args::Args;
use gaze_collect::camera::{self, CameraSource};
use gaze_collect::capture::{CaptureLoop, SessionOutcome};
use gaze_collect::config::AppConfig;
use gaze_collect::dataset::DatasetWriter;
use gaze_collect::devices::SystemClock;
use gaze_collect::grid;
use gaze_collect::output::WindowOutput;
use gaze_collect::screen::FixedScreen;
use gaze_collect::session::SessionConfig;
use gaze_collect::staging::{self, StageOutcome};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args = Args::parse();

    if args.list {
        return camera::list_cameras();
    }

    // 0. Load Config, CLI wins
    let mut config = AppConfig::load(&args.config)?;
    if let Some(index) = args.cam_index {
        config.camera.index = index;
    }
    if let Some(w) = args.width {
        config.screen.width = w;
    }
    if let Some(h) = args.height {
        config.screen.height = h;
    }
    if let Some(seed) = args.seed {
        config.grid.seed = Some(seed);
    }
    if let Some(dir) = args.output {
        config.output.data_dir = dir;
    }

    // 1. Session + targets
    let screen = FixedScreen::new(config.screen.width, config.screen.height);
    let session = SessionConfig::new(&config, &screen, Local::now())?;
    info!("Screen resolution: {}x{}", session.screen_width, session.screen_height);

    let mut rng = match config.grid.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (width, height) = (session.screen_width, session.screen_height);
    let points = grid::make_grid_points(width, height, &config.grid, &mut rng)?;

    // 2. Window + instructions
    let mut window = WindowOutput::new("gaze_calib", width as usize, height as usize)?;
    if staging::run_instruction_stage(&mut window)? == StageOutcome::Cancelled {
        return Ok(());
    }

    // 3. Camera (this is where the OS may ask for permission)
    let mut camera = CameraSource::open(config.camera.index)
        .context("Cannot open webcam. Check permissions / device index.")?;
    info!("Camera: {} ({}x{})", camera.name(), camera.width(), camera.height());

    let mirror = config.camera.mirror_preview;
    let preview = staging::run_preview_stage(&mut window, &mut camera, mirror)?;
    if preview == StageOutcome::Cancelled {
        return Ok(());
    }

    // 4. Record
    let mut writer = DatasetWriter::create(&session)?;
    println!("Data directory: {}", session.out_dir().display().to_string().cyan());

    let clock = SystemClock::new();
    let result =
        CaptureLoop::new(&session, &mut camera, &mut window, &mut writer, &clock).run(&points);

    // Teardown runs on every exit path: label store first, then the camera
    let closed = writer.finish();
    drop(camera);

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Err(close_err) = closed {
                error!("Label store could not be closed cleanly: {:#}", close_err);
            }
            return Err(e.context("Calibration aborted"));
        }
    };
    let rows = closed?;

    match outcome {
        SessionOutcome::Finished { points: total, .. } => {
            let message = format!(
                "Calibration finished: {} points, {} frames saved in {}",
                total,
                rows,
                session.out_dir().display()
            );
            println!("{}", message.green());
        }
        SessionOutcome::Cancelled { completed_points, .. } => {
            println!(
                "{}",
                format!(
                    "Calibration cancelled after {}/{} points; {} frames kept in {}",
                    completed_points,
                    points.len(),
                    rows,
                    session.out_dir().display()
                )
                .yellow()
            );
        }
    }

    Ok(())
}
