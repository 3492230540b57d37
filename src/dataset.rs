use anyhow::{bail, Context, Result};
use image::ImageFormat;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::session::{SessionConfig, IMAGES_DIR, LABELS_FILE};
use crate::types::{CalibrationPoint, CaptureRecord, Frame, PhaseState};

pub const LABEL_HEADER: [&str; 7] = [
    "filename",
    "tx",
    "ty",
    "x_norm",
    "y_norm",
    "timestamp",
    "phase",
];

/// Writes captured frames to `images/` and one `labels.csv` row per frame.
///
/// Every row is flushed as soon as it is written, so the label file is a
/// complete table at any point the process stops.
pub struct DatasetWriter {
    session_id: String,
    images_dir: PathBuf,
    labels_path: PathBuf,
    ext: String,
    format: ImageFormat,
    screen_width: f64,
    screen_height: f64,
    labels: Option<csv::Writer<File>>,
    rows: usize,
    last_stem: Option<String>,
    duplicates: u32,
    last_timestamp: f64,
}

impl DatasetWriter {
    pub fn create(session: &SessionConfig) -> Result<Self> {
        let images_dir = session.images_dir();
        fs::create_dir_all(&images_dir)
            .with_context(|| format!("Failed to create {}", images_dir.display()))?;

        let format = ImageFormat::from_extension(&session.image_ext)
            .with_context(|| format!("Unsupported image extension '{}'", session.image_ext))?;

        // Never truncate the labels of an earlier session sharing this directory
        let labels_path = session.labels_path();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&labels_path)
            .with_context(|| format!("Failed to create {}", labels_path.display()))?;
        let mut labels = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        labels.write_record(LABEL_HEADER)?;
        labels.flush()?;

        info!("Dataset directory: {}", session.out_dir().display());

        Ok(Self {
            session_id: session.session_id.clone(),
            images_dir,
            labels_path,
            ext: session.image_ext.clone(),
            format,
            screen_width: session.screen_width as f64,
            screen_height: session.screen_height as f64,
            labels: Some(labels),
            rows: 0,
            last_stem: None,
            duplicates: 0,
            last_timestamp: f64::NEG_INFINITY,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// `<session>_<tx>_<ty>_<ms>`, with `-<n>` appended when the same target
    /// is captured twice within one millisecond.
    fn next_filename(&mut self, point: CalibrationPoint, timestamp: f64) -> String {
        let ts_ms = (timestamp * 1000.0) as u64;
        let stem = format!("{}_{}_{}_{}", self.session_id, point.x, point.y, ts_ms);

        let unique = if self.last_stem.as_deref() == Some(stem.as_str()) {
            self.duplicates += 1;
            format!("{}-{}", stem, self.duplicates)
        } else {
            self.duplicates = 0;
            stem.clone()
        };
        self.last_stem = Some(stem);
        format!("{}.{}", unique, self.ext)
    }

    pub fn record(
        &mut self,
        frame: &Frame,
        point: CalibrationPoint,
        timestamp: f64,
    ) -> Result<CaptureRecord> {
        if self.labels.is_none() {
            bail!("label store already closed");
        }

        // Rows stay in non-decreasing time order even if a caller's clock wobbles
        let timestamp = timestamp.max(self.last_timestamp);
        let filename = self.next_filename(point, timestamp);
        let path = self.images_dir.join(&filename);

        if let Err(e) = frame.save_with_format(&path, self.format) {
            // The encoder may have created the file before failing
            remove_orphan(&path);
            return Err(e).with_context(|| format!("Failed to write image {}", path.display()));
        }

        let record = CaptureRecord {
            filename,
            target_x: point.x,
            target_y: point.y,
            x_norm: point.x as f64 / self.screen_width,
            y_norm: point.y as f64 / self.screen_height,
            timestamp,
            phase: PhaseState::Capture,
        };

        let labels = self.labels.as_mut().context("label store already closed")?;
        let written = labels
            .serialize(&record)
            .and_then(|_| labels.flush().map_err(csv::Error::from));
        if let Err(e) = written {
            // Every image on disk must have a label row
            remove_orphan(&path);
            return Err(e)
                .with_context(|| format!("Failed to append to {}", self.labels_path.display()));
        }

        self.rows += 1;
        self.last_timestamp = timestamp;
        debug!("Saved {} ({}, {})", record.filename, point.x, point.y);
        Ok(record)
    }

    /// Flush and close the label store. Returns the number of rows written.
    pub fn finish(mut self) -> Result<usize> {
        if let Some(mut labels) = self.labels.take() {
            labels
                .flush()
                .with_context(|| format!("Failed to flush {}", self.labels_path.display()))?;
        }
        info!("Label store closed with {} rows", self.rows);
        Ok(self.rows)
    }
}

fn remove_orphan(path: &Path) {
    if !path.is_file() {
        return;
    }
    if let Err(e) = fs::remove_file(path) {
        warn!("Could not remove orphaned image {}: {}", path.display(), e);
    }
}

impl Drop for DatasetWriter {
    fn drop(&mut self) {
        if let Some(mut labels) = self.labels.take() {
            if let Err(e) = labels.flush() {
                error!("Failed to flush {} on drop: {}", self.labels_path.display(), e);
            }
        }
    }
}

/// Result of checking a dataset directory on disk.
#[derive(Debug, Default)]
pub struct DatasetSummary {
    pub rows: usize,
    pub images: usize,
    pub targets: usize,
    pub first_timestamp: Option<f64>,
    pub last_timestamp: Option<f64>,
    pub problems: Vec<String>,
}

impl DatasetSummary {
    pub fn is_consistent(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Load `labels.csv` and cross-check it against `images/`.
pub fn verify_dataset(dir: &Path) -> Result<DatasetSummary> {
    let labels_path = dir.join(LABELS_FILE);
    let images_dir = dir.join(IMAGES_DIR);

    let mut reader = csv::Reader::from_path(&labels_path)
        .with_context(|| format!("Failed to open {}", labels_path.display()))?;

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut summary = DatasetSummary::default();
    if header != LABEL_HEADER {
        summary.problems.push(format!("unexpected header: {}", header.join(",")));
    }

    let mut seen = HashSet::new();
    let mut targets = HashSet::new();
    for (i, row) in reader.deserialize::<CaptureRecord>().enumerate() {
        let line = i + 2;
        let record = match row {
            Ok(r) => r,
            Err(e) => {
                summary.problems.push(format!("line {}: {}", line, e));
                continue;
            }
        };
        summary.rows += 1;

        if !images_dir.join(&record.filename).is_file() {
            summary.problems.push(format!("line {}: missing image {}", line, record.filename));
        }
        if !seen.insert(record.filename.clone()) {
            summary
                .problems
                .push(format!("line {}: duplicate filename {}", line, record.filename));
        }
        if !(0.0..=1.0).contains(&record.x_norm) || !(0.0..=1.0).contains(&record.y_norm) {
            summary.problems.push(format!("line {}: normalised coordinates out of range", line));
        }
        if record.phase != PhaseState::Capture {
            summary
                .problems
                .push(format!("line {}: row recorded in phase {}", line, record.phase));
        }
        if let Some(prev) = summary.last_timestamp {
            if record.timestamp < prev {
                summary.problems.push(format!("line {}: timestamp goes backwards", line));
            }
        }
        summary.first_timestamp.get_or_insert(record.timestamp);
        summary.last_timestamp = Some(record.timestamp);
        targets.insert((record.target_x, record.target_y));
    }
    summary.targets = targets.len();

    if images_dir.is_dir() {
        summary.images = fs::read_dir(&images_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .count();
    }
    if summary.images != summary.rows {
        summary.problems.push(format!(
            "{} images on disk but {} label rows",
            summary.images, summary.rows
        ));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::screen::FixedScreen;
    use chrono::{Local, TimeZone};
    use image::Rgb;

    fn session(root: &Path) -> SessionConfig {
        let mut config = AppConfig::default();
        config.output.data_dir = root.to_path_buf();
        config.output.image_ext = "png".to_string();
        let started = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        SessionConfig::new(&config, &FixedScreen::new(1920, 1080), started).unwrap()
    }

    fn frame() -> Frame {
        Frame::from_pixel(8, 6, Rgb([10, 20, 30]))
    }

    #[test]
    fn test_header_written_at_creation() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        let writer = DatasetWriter::create(&s).unwrap();

        let content = fs::read_to_string(s.labels_path()).unwrap();
        assert_eq!(content.trim_end(), "filename,tx,ty,x_norm,y_norm,timestamp,phase");
        assert!(s.images_dir().is_dir());
        assert_eq!(writer.finish().unwrap(), 0);
    }

    #[test]
    fn test_record_writes_image_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        let mut writer = DatasetWriter::create(&s).unwrap();

        let rec = writer
            .record(&frame(), CalibrationPoint::new(960, 540), 1_700_000_000.25)
            .unwrap();
        assert_eq!(rec.filename, "20260102_030405_960_540_1700000000250.png");
        assert_eq!(rec.x_norm, 0.5);
        assert_eq!(rec.y_norm, 0.5);
        assert_eq!(rec.phase, PhaseState::Capture);
        assert!(s.images_dir().join(&rec.filename).is_file());

        // Row is on disk before finish()
        let content = fs::read_to_string(s.labels_path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().ends_with(",capture"));

        assert_eq!(writer.finish().unwrap(), 1);
        let summary = verify_dataset(s.out_dir()).unwrap();
        assert!(summary.is_consistent(), "{:?}", summary.problems);
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.images, 1);
    }

    #[test]
    fn test_same_millisecond_gets_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        let mut writer = DatasetWriter::create(&s).unwrap();
        let p = CalibrationPoint::new(230, 130);

        let a = writer.record(&frame(), p, 100.0001).unwrap();
        let b = writer.record(&frame(), p, 100.0002).unwrap();
        let c = writer.record(&frame(), p, 100.0003).unwrap();
        let d = writer.record(&frame(), p, 100.0015).unwrap();

        assert_eq!(a.filename, "20260102_030405_230_130_100000.png");
        assert_eq!(b.filename, "20260102_030405_230_130_100000-1.png");
        assert_eq!(c.filename, "20260102_030405_230_130_100000-2.png");
        assert_eq!(d.filename, "20260102_030405_230_130_100001.png");

        assert_eq!(writer.finish().unwrap(), 4);
        let summary = verify_dataset(s.out_dir()).unwrap();
        assert!(summary.is_consistent(), "{:?}", summary.problems);
        assert_eq!(summary.images, 4);
        assert_eq!(summary.targets, 1);
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        let mut writer = DatasetWriter::create(&s).unwrap();

        writer.record(&frame(), CalibrationPoint::new(230, 130), 50.0).unwrap();
        let late = writer.record(&frame(), CalibrationPoint::new(595, 130), 49.0).unwrap();
        assert_eq!(late.timestamp, 50.0);
    }

    #[test]
    fn test_drop_leaves_complete_table() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        {
            let mut writer = DatasetWriter::create(&s).unwrap();
            writer.record(&frame(), CalibrationPoint::new(230, 130), 10.0).unwrap();
            writer.record(&frame(), CalibrationPoint::new(230, 130), 10.5).unwrap();
            // dropped without finish()
        }
        let mut reader = csv::Reader::from_path(s.labels_path()).unwrap();
        let rows: Vec<CaptureRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_verify_reports_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        let mut writer = DatasetWriter::create(&s).unwrap();
        let rec = writer.record(&frame(), CalibrationPoint::new(230, 130), 10.0).unwrap();
        writer.finish().unwrap();

        fs::remove_file(s.images_dir().join(&rec.filename)).unwrap();
        let summary = verify_dataset(s.out_dir()).unwrap();
        assert!(!summary.is_consistent());
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.images, 0);
        assert_eq!(summary.problems.len(), 2);
    }

    #[test]
    fn test_failed_image_write_leaves_no_orphan() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        // DDS decodes but cannot be encoded
        s.image_ext = "dds".to_string();
        let mut writer = DatasetWriter::create(&s).unwrap();

        let err = writer.record(&frame(), CalibrationPoint::new(230, 130), 10.0);
        assert!(err.is_err());
        assert_eq!(writer.rows(), 0);
        assert_eq!(fs::read_dir(s.images_dir()).unwrap().count(), 0);

        assert_eq!(writer.finish().unwrap(), 0);
        let summary = verify_dataset(s.out_dir()).unwrap();
        assert!(summary.is_consistent(), "{:?}", summary.problems);
    }

    #[test]
    fn test_second_writer_does_not_truncate_labels() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        let mut first = DatasetWriter::create(&s).unwrap();
        first.record(&frame(), CalibrationPoint::new(230, 130), 10.0).unwrap();
        first.finish().unwrap();

        assert!(DatasetWriter::create(&s).is_err());
        let summary = verify_dataset(s.out_dir()).unwrap();
        assert!(summary.is_consistent(), "{:?}", summary.problems);
        assert_eq!(summary.rows, 1);
    }
}
