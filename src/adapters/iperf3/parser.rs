use serde::Deserialize;
use thiserror::Error;

use crate::domain::{DirectionSummary, MeasurementFailure, MeasurementReport};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Top level of `iperf3 --json` output, reduced to what we publish
#[derive(Debug, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub end: RawEnd,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawEnd {
    pub sum_sent: Option<RawSummary>,
    pub sum_received: Option<RawSummary>,
}

#[derive(Debug, Deserialize)]
pub struct RawSummary {
    pub bits_per_second: f64,
    // Absent for UDP tests and on platforms without TCP_INFO
    #[serde(default)]
    pub retransmits: f64,
}

impl RawResult {
    /// Embedded error message, if the tool reported one
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

impl From<&RawSummary> for DirectionSummary {
    fn from(raw: &RawSummary) -> Self {
        DirectionSummary::new(raw.bits_per_second, raw.retransmits)
    }
}

impl From<ParseError> for MeasurementFailure {
    fn from(err: ParseError) -> Self {
        MeasurementFailure::Parse(err.to_string())
    }
}

/// Decode raw stdout without interpreting it
pub fn parse_raw(stdout: &[u8]) -> ParseResult<RawResult> {
    Ok(serde_json::from_slice(stdout)?)
}

/// Turn captured stdout of a successful run into a report
pub fn parse_report(stdout: &[u8]) -> Result<MeasurementReport, MeasurementFailure> {
    let raw = parse_raw(stdout)?;

    if let Some(message) = raw.error_message() {
        return Err(MeasurementFailure::Tool(message.to_string()));
    }

    let sent = raw
        .end
        .sum_sent
        .as_ref()
        .ok_or_else(|| ParseError::MissingField("end.sum_sent".to_string()))?;
    let received = raw
        .end
        .sum_received
        .as_ref()
        .ok_or_else(|| ParseError::MissingField("end.sum_received".to_string()))?;

    Ok(MeasurementReport::new(sent.into(), received.into()))
}
