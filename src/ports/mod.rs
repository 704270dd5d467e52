pub mod measurement_source;
pub mod metric_store;

pub use measurement_source::MeasurementSource;
pub use metric_store::{MetricStore, StoreError};
