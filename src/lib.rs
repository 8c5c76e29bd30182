//! enclave-kernels: fused SGEMV for constrained isolated execution.
//!
//! The crate's single hot primitive computes
//! `y = act(alpha * op(A) * x + beta * y + bias)` in one pass, built for
//! inference runtimes hosted inside resource-restricted isolated
//! environments:
//! - **Injected capabilities**: an [`ExecutionContext`] describes what the
//!   environment allows (lanes, vector unit); there is no global singleton
//!   and no hidden probing on the hot path.
//! - **Bit-reproducible**: one documented reduction order per output element;
//!   scalar and AVX2 paths round identically, lane count never changes
//!   results.
//! - **Zero-cost dispatch**: flags resolve once at call entry into a
//!   monomorphized specialized loop; raw slice APIs, no heap scratch.
//! - **Fail-fast**: all validation precedes the first write to `y`; on error
//!   the output is untouched.
//!
//! # Quick Start
//!
//! ```
//! use enclave_kernels::{sgemv, Activation, ExecutionContext, SgemvConfig};
//!
//! let a = vec![1.0f32, 2.0, 3.0, 4.0]; // 2x2 row-major
//! let x = vec![1.0f32, 1.0];
//! let mut y = vec![0.0f32; 2];
//! let config = SgemvConfig {
//!     activation: Some(Activation::Relu6),
//!     ..SgemvConfig::default()
//! };
//! sgemv(&a, &x, &mut y, 2, 2, None, &config, &ExecutionContext::scalar()).unwrap();
//! assert_eq!(y, vec![3.0, 6.0]); // 7.0 clamped to six
//! ```

pub mod context;
pub mod error;
pub mod ops;
pub mod validation;

pub use context::{detect_isa_level, ExecutionContext, IsaLevel};
pub use error::{KernelError, KernelResult};
pub use ops::activations::Activation;
pub use ops::sgemv::{sgemv, SgemvConfig};
