use thiserror::Error;

use crate::domain::{Counter, Gauge, MeasurementReport, Target};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("metrics registry error: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("exposition output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Port for publishing per-target measurement values
pub trait MetricStore: Send + Sync {
    /// Set a gauge, replacing any previous value
    fn set(&self, gauge: Gauge, target: &Target, value: f64);

    /// Return a gauge to the absent state so it is left out of the export
    fn clear(&self, gauge: Gauge, target: &Target);

    /// Add one to a counter
    fn increment(&self, counter: Counter, target: &Target);

    /// Current gauge value, `None` while absent
    fn gauge(&self, gauge: Gauge, target: &Target) -> Option<f64>;

    /// All four gauges as one report, `None` unless every gauge is present
    fn published(&self, target: &Target) -> Option<MeasurementReport>;

    /// Current counter value
    fn count(&self, counter: Counter, target: &Target) -> u64;

    /// Serialize everything in the Prometheus text format
    fn render(&self) -> Result<String, StoreError>;

    /// Write all four gauges from one report
    fn publish(&self, target: &Target, report: &MeasurementReport) {
        for gauge in Gauge::ALL {
            self.set(gauge, target, gauge.value_of(report));
        }
    }

    /// Clear all four gauges
    fn reset(&self, target: &Target) {
        for gauge in Gauge::ALL {
            self.clear(gauge, target);
        }
    }
}
