use serde::{Deserialize, Serialize};

/// Throughput summary for one direction of a test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionSummary {
    pub bits_per_second: f64,
    pub retransmits: f64,
}

impl DirectionSummary {
    pub fn new(bits_per_second: f64, retransmits: f64) -> Self {
        Self {
            bits_per_second,
            retransmits,
        }
    }
}

/// Outcome of one successful measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub sent: DirectionSummary,
    pub received: DirectionSummary,
}

impl MeasurementReport {
    pub fn new(sent: DirectionSummary, received: DirectionSummary) -> Self {
        Self { sent, received }
    }
}
