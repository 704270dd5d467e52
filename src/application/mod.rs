pub mod sampler;

pub use sampler::{Sampler, SamplerStatus, StatusSnapshot, RETRY_BACKOFF};
