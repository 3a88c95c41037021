//! Pump actuator adapter.
//!
//! The GPIO details live in an external helper command; this adapter
//! spawns it with the requested amount and treats a non-zero exit as a
//! hardware failure.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::info;

use crate::config::PumpConfig;

use super::Actuator;

/// Actuator that drives the pump through a helper command.
///
/// The command is invoked as `<command> <amount_ml>`.
pub struct PumpActuator {
    command: String,
    timeout: Duration,
}

impl PumpActuator {
    pub fn new(config: &PumpConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl Actuator for PumpActuator {
    async fn water(&self, amount_ml: u32) -> Result<()> {
        info!(amount_ml, "Starting pump");

        let child = Command::new(&self.command)
            .arg(amount_ml.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn pump command '{}'", self.command))?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| format!("Pump command timed out after {:?}", self.timeout))?
            .context("Failed to wait for pump command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Pump command exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        info!("Pump run finished");
        Ok(())
    }
}
