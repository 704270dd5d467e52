mod parser;

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::{MeasurementFailure, MeasurementReport, Target};
use crate::ports::MeasurementSource;

/// How to invoke the iperf3 client
#[derive(Debug, Clone)]
pub struct Iperf3Config {
    pub binary: PathBuf,
    pub connect_timeout: Duration,
    pub run_timeout: Duration,
}

impl Iperf3Config {
    pub fn new(binary: impl Into<PathBuf>, connect_timeout: Duration, run_timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            connect_timeout,
            run_timeout,
        }
    }
}

/// Measurement source that shells out to the iperf3 client
#[derive(Debug, Clone)]
pub struct Iperf3Source {
    config: Iperf3Config,
}

impl Iperf3Source {
    pub fn new(config: Iperf3Config) -> Self {
        Self { config }
    }

    fn command(&self, target: &Target) -> Command {
        let mut command = Command::new(&self.config.binary);
        command
            .arg("--json")
            .arg("-c")
            .arg(&target.address)
            .arg("-p")
            .arg(target.port.to_string())
            .arg("--connect-timeout")
            .arg(self.config.connect_timeout.as_millis().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl MeasurementSource for Iperf3Source {
    async fn measure(&self, target: &Target) -> Result<MeasurementReport, MeasurementFailure> {
        debug!("Running {} against {}", self.config.binary.display(), target);

        let output = tokio::time::timeout(self.config.run_timeout, self.command(target).output())
            .await
            .map_err(|_| MeasurementFailure::Timeout(self.config.run_timeout))??;

        match output.status.code() {
            None => return Err(MeasurementFailure::Terminated),
            Some(0) => {}
            Some(code) => {
                // iperf3 still prints its JSON report (with `error`) when it fails
                let message = parser::parse_raw(&output.stdout)
                    .ok()
                    .and_then(|raw| raw.error_message().map(str::to_string));
                return Err(MeasurementFailure::ExitStatus { code, message });
            }
        }

        parser::parse_report(&output.stdout)
    }
}
