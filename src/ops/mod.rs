pub mod activations;
pub mod sgemv;

pub use activations::Activation;
pub use sgemv::{sgemv, SgemvConfig};
