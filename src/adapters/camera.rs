//! Camera recorder adapter.
//!
//! Captures a raw clip with the configured capture command, then
//! converts it to mp4 with the configured converter (MP4Box on the
//! device). File names are keyed by the current date, matching the
//! one-post-per-day model.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::info;

use crate::config::CameraConfig;

use super::Recorder;

/// Recorder that shells out to the device camera tooling.
///
/// Capture is invoked as `<capture_command> <output.h264> <seconds>`;
/// conversion as `<convert_command> -add <output.h264> <output.mp4>`.
pub struct CameraRecorder {
    capture_command: String,
    convert_command: String,
    video_dir: PathBuf,
    duration_secs: u64,
}

impl CameraRecorder {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            capture_command: config.capture_command.clone(),
            convert_command: config.convert_command.clone(),
            video_dir: PathBuf::from(&config.video_dir),
            duration_secs: config.duration_secs,
        }
    }

    async fn run_command(&self, program: &str, args: &[&str], limit: Duration) -> Result<()> {
        let child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", program))?;

        let output = timeout(limit, child.wait_with_output())
            .await
            .with_context(|| format!("'{}' timed out after {:?}", program, limit))?
            .with_context(|| format!("Failed to wait for '{}'", program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "'{}' exited with {}: {}",
                program,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        Ok(())
    }
}

#[async_trait]
impl Recorder for CameraRecorder {
    async fn record(&self) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.video_dir)
            .await
            .with_context(|| {
                format!("Failed to create video directory: {}", self.video_dir.display())
            })?;

        let stem = Local::now().date_naive().to_string();
        let mp4_path = self.video_dir.join(format!("{}.mp4", stem));
        let raw = self
            .video_dir
            .join(format!("{}.h264", stem))
            .to_string_lossy()
            .into_owned();
        let mp4 = mp4_path.to_string_lossy().into_owned();
        let secs = self.duration_secs.to_string();

        info!(duration_secs = self.duration_secs, "Starting video capture");
        // Generous margin over the recording duration itself.
        let capture_limit = Duration::from_secs(self.duration_secs + 30);
        self.run_command(&self.capture_command, &[raw.as_str(), secs.as_str()], capture_limit)
            .await
            .context("Video capture failed")?;

        info!("Converting recording to mp4");
        self.run_command(
            &self.convert_command,
            &["-add", raw.as_str(), mp4.as_str()],
            Duration::from_secs(120),
        )
        .await
        .context("Video conversion failed")?;

        Ok(mp4_path)
    }
}
