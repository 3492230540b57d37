use anyhow::bail;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use gaze_collect::dataset::verify_dataset;

/// Cross-check a session's labels.csv against its images/ directory.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session directories (data/gaze_data_<id>)
    #[arg(required = true)]
    dirs: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args = Args::parse();
    let mut broken = 0;

    for dir in &args.dirs {
        let summary = verify_dataset(dir)?;
        println!("{}", dir.display());
        println!("  rows:    {}", summary.rows);
        println!("  images:  {}", summary.images);
        println!("  targets: {}", summary.targets);
        if let (Some(first), Some(last)) = (summary.first_timestamp, summary.last_timestamp) {
            println!("  span:    {:.2}s", last - first);
        }

        if summary.is_consistent() {
            println!("  {}", "OK".green());
        } else {
            broken += 1;
            for problem in &summary.problems {
                println!("  {}", problem.red());
            }
        }
    }

    if broken > 0 {
        bail!("{} of {} datasets are inconsistent", broken, args.dirs.len());
    }
    Ok(())
}
