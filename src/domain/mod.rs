pub mod failure;
pub mod metrics;
pub mod report;
pub mod target;

pub use failure::MeasurementFailure;
pub use metrics::{Counter, Gauge, NAMESPACE, SUBSYSTEM};
pub use report::{DirectionSummary, MeasurementReport};
pub use target::Target;
