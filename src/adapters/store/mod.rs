mod registry;

pub use registry::PrometheusStore;
