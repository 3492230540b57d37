use nokhwa::{
    pixel_format::RgbFormat,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};
use anyhow::{anyhow, Context, Result};
use colored::*;
use log::{info, warn};

use crate::devices::FrameSource;
use crate::error::CaptureError;
use crate::types::Frame;

fn open_failed(index: u32, e: impl std::fmt::Display) -> CaptureError {
    CaptureError::CameraOpen { index, reason: e.to_string() }
}

pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| open_failed(index, e))?;
        camera.open_stream().map_err(|e| open_failed(index, e))?;

        println!("{}", format!("Opened camera: {}", camera.info().human_name()).green());
        info!("Format: {}", camera.camera_format());

        Ok(Self { camera })
    }

    pub fn width(&self) -> u32 {
        self.camera.resolution().width()
    }

    pub fn height(&self) -> u32 {
        self.camera.resolution().height()
    }

    pub fn name(&self) -> String {
        self.camera.info().human_name()
    }
}

impl FrameSource for CameraSource {
    fn capture(&mut self) -> Result<Frame> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| anyhow!(e))
            .context("Failed to get frame")?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| anyhow!(e))
            .context("Failed to decode frame")?;
        Ok(decoded)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("Failed to stop camera stream: {}", e);
        } else {
            info!("Camera released");
        }
    }
}

pub fn list_cameras() -> Result<()> {
    let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| anyhow!(e))?;
    println!("Available Cameras:");
    println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!("{:<5} | {:<30} | {:?}", cam.index(), cam.human_name(), cam.misc());
    }
    Ok(())
}
