use thiserror::Error;

/// Why a single measurement attempt produced no report
#[derive(Debug, Error)]
pub enum MeasurementFailure {
    #[error("failed to launch iperf3: {0}")]
    Launch(#[from] std::io::Error),

    #[error("iperf3 was terminated without an exit code")]
    Terminated,

    #[error("exit code: {code}{}", message_suffix(.message))]
    ExitStatus { code: i32, message: Option<String> },

    #[error("iperf3 did not finish within {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid iperf3 output: {0}")]
    Parse(String),

    #[error("{0}")]
    Tool(String),
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(" ({})", m),
        None => String::new(),
    }
}

impl MeasurementFailure {
    /// Short, stable label for the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            MeasurementFailure::Launch(_) => "launch",
            MeasurementFailure::Terminated => "terminated",
            MeasurementFailure::ExitStatus { .. } => "exit_status",
            MeasurementFailure::Timeout(_) => "timeout",
            MeasurementFailure::Parse(_) => "parse",
            MeasurementFailure::Tool(_) => "tool",
        }
    }
}
