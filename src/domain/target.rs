use std::fmt;

use serde::{Deserialize, Serialize};

/// Remote iperf3 server being measured
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub address: String,
    pub port: u16,
}

impl Target {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Label values in the order of `Target::LABELS`
    pub fn label_values(&self) -> [String; 2] {
        [self.address.clone(), self.port.to_string()]
    }

    pub const LABELS: [&'static str; 2] = ["server", "port"];
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}
