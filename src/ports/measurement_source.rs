use async_trait::async_trait;

use crate::domain::{MeasurementFailure, MeasurementReport, Target};

/// Port for running a single throughput measurement
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Run exactly one measurement against the target, without retrying
    async fn measure(&self, target: &Target) -> Result<MeasurementReport, MeasurementFailure>;
}
