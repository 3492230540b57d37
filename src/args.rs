use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Camera Index (overrides config)
    #[arg(short, long)]
    pub cam_index: Option<u32>,

    /// Configuration file
    #[arg(long, default_value = AppConfig::DEFAULT_PATH)]
    pub config: PathBuf,

    /// Root directory for session folders (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Screen width in pixels (overrides config)
    #[arg(long)]
    pub width: Option<u32>,

    /// Screen height in pixels (overrides config)
    #[arg(long)]
    pub height: Option<u32>,

    /// Seed for the target order shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    /// List available cameras
    #[arg(long)]
    pub list: bool,
}
