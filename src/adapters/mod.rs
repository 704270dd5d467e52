pub mod iperf3;
pub mod store;

pub use iperf3::{Iperf3Config, Iperf3Source};
pub use store::PrometheusStore;
