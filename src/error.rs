//! Error types for kernel entry points.

use thiserror::Error;

use crate::ops::activations::Activation;

/// Errors a kernel call can report. All validation happens before the first
/// write to the output buffer, so on any of these the output is untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// Dimensions are zero, overflow, or a buffer length is inconsistent
    /// with the requested shape and transpose mode.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// The activation descriptor names a variant the fused kernel does not
    /// implement. Unfused slice appliers for these variants live in
    /// [`crate::ops::activations`].
    #[error("unsupported fused activation: {0:?}")]
    UnsupportedActivation(Activation),

    /// A bounded activation was requested with a non-positive clamp bound.
    #[error("clamp bound must be > 0, got {0}")]
    InvalidClampBound(f32),
}

pub type KernelResult<T> = Result<T, KernelError>;
