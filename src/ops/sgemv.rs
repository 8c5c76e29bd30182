//! Fused single-precision matrix-vector multiply.
//!
//! Computes `y = act(alpha * op(A) * x + beta * y + bias)` in one pass over
//! the output, where `op(A)` is `A` (M×N row-major) or `A^T`. The bias is
//! added after the affine step and before the activation. `beta == 0` is
//! special-cased as write-only: prior `y` contents are never read, so the
//! caller may pass an uninitialized or NaN-filled buffer.
//!
//! # Reduction order
//!
//! Results are bit-reproducible across execution contexts. For every output
//! element the inner reduction over `k` products is fixed:
//!
//! 1. eight interleaved partial sums — lane `l` accumulates products at
//!    indices `j ≡ l (mod 8)` over the first `8*(k/8)` products;
//! 2. a fixed fold `((s0+s4)+(s2+s6)) + ((s1+s5)+(s3+s7))` — the shape an
//!    8-lane horizontal sum over 128-bit halves produces;
//! 3. the remaining `k % 8` products added sequentially.
//!
//! The scalar loop is the canonical definition; the AVX2 path implements the
//! identical order (mul+add, no FMA, so both round the same way). Lane count
//! only changes how output rows are split across threads, never the order of
//! any per-element reduction.
//!
//! # Validation
//!
//! All shape and configuration checks happen before the first write to `y`;
//! on error `y` is byte-for-byte untouched.

use rayon::prelude::*;

use crate::context::{ExecutionContext, IsaLevel};
use crate::error::{KernelError, KernelResult};
use crate::ops::activations::Activation;
use crate::validation;

/// Below this output length, splitting across lanes costs more than it saves.
const PARALLEL_THRESHOLD_OUT: usize = 256;

/// Interleaved partial sums per reduction; matches one AVX2 register.
const DOT_LANES: usize = 8;

/// Configuration for the fused SGEMV kernel.
///
/// Replaces the boolean flags and trailing default parameters of the classic
/// `sgemv(A, x, y, transA, M, N, beta, is_bias, bias, flag_act, act, ctx,
/// six, alpha)` surface with named fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SgemvConfig {
    /// Use `A^T` instead of `A`. With `trans`, `x` has length M and `y`
    /// length N; without, `x` has length N and `y` length M.
    pub trans: bool,
    /// Scale on the matrix-vector product. Also the slope of
    /// [`Activation::LeakyRelu`] when that variant is fused — the kernel
    /// keeps the original single-scalar parameter surface. Default 1.0.
    pub alpha: f32,
    /// Scale on the prior contents of `y`. 0.0 (the default) makes `y`
    /// write-only.
    pub beta: f32,
    /// Upper clamp bound for [`Activation::Relu6`]; must be > 0 when that
    /// variant is requested. Default 6.0.
    pub six: f32,
    /// Fused activation; `None` leaves the affine result untouched.
    pub activation: Option<Activation>,
}

impl Default for SgemvConfig {
    fn default() -> Self {
        Self {
            trans: false,
            alpha: 1.0,
            beta: 0.0,
            six: 6.0,
            activation: None,
        }
    }
}

/// Fused matrix-vector multiply: `y = act(alpha * op(A) * x + beta * y + bias)`.
///
/// # Arguments
///
/// * `a` - M×N row-major matrix, `m * n` elements
/// * `x` - input vector, length N (or M with `config.trans`)
/// * `y` - in/out vector, length M (or N with `config.trans`)
/// * `m`, `n` - matrix dimensions, both > 0
/// * `bias` - optional bias, same length as `y`, added after the affine step
/// * `config` - transpose mode, scalars, fused activation
/// * `ctx` - capability bound of the hosting environment
///
/// # Errors
///
/// [`KernelError::InvalidShape`] on zero dimensions, overflow, or any buffer
/// length inconsistent with `m`, `n` and the transpose mode;
/// [`KernelError::InvalidClampBound`] if `Relu6` is requested with
/// `six <= 0`; [`KernelError::UnsupportedActivation`] for activation variants
/// the fused epilogue does not implement. On any error `y` is untouched.
pub fn sgemv(
    a: &[f32],
    x: &[f32],
    y: &mut [f32],
    m: usize,
    n: usize,
    bias: Option<&[f32]>,
    config: &SgemvConfig,
    ctx: &ExecutionContext,
) -> KernelResult<()> {
    validation::validate_gemv_dims(m, n).map_err(KernelError::InvalidShape)?;
    let a_len = validation::compute_matrix_len(m, n).map_err(KernelError::InvalidShape)?;
    validation::validate_input_len(a.len(), a_len, "a").map_err(KernelError::InvalidShape)?;

    let (in_len, out_len) = if config.trans { (m, n) } else { (n, m) };
    validation::validate_input_len(x.len(), in_len, "x").map_err(KernelError::InvalidShape)?;
    validation::validate_input_len(y.len(), out_len, "y").map_err(KernelError::InvalidShape)?;
    if let Some(b) = bias {
        validation::validate_input_len(b.len(), out_len, "bias")
            .map_err(KernelError::InvalidShape)?;
    }
    if config.activation == Some(Activation::Relu6) && config.six <= 0.0 {
        return Err(KernelError::InvalidClampBound(config.six));
    }

    // Resolve the operation mode once; each arm monomorphizes the whole pass
    // for its activation, so the hot loops carry no flag branches.
    let alpha = config.alpha;
    let six = config.six;
    match config.activation {
        None => run(a, x, y, bias, m, n, config, ctx, |v| v),
        Some(Activation::Relu) => run(a, x, y, bias, m, n, config, ctx, |v| v.max(0.0)),
        Some(Activation::Relu6) => run(a, x, y, bias, m, n, config, ctx, move |v| {
            v.max(0.0).min(six)
        }),
        Some(Activation::LeakyRelu) => run(a, x, y, bias, m, n, config, ctx, move |v| {
            if v > 0.0 {
                v
            } else {
                alpha * v
            }
        }),
        Some(other) => return Err(KernelError::UnsupportedActivation(other)),
    }
    Ok(())
}

/// Split the output across lanes when the context allows and the shape pays
/// for it. Chunking never changes results: every output element's reduction
/// is self-contained.
#[allow(clippy::too_many_arguments)]
fn run<A: Fn(f32) -> f32 + Sync>(
    a: &[f32],
    x: &[f32],
    y: &mut [f32],
    bias: Option<&[f32]>,
    m: usize,
    n: usize,
    config: &SgemvConfig,
    ctx: &ExecutionContext,
    act: A,
) {
    let out_len = y.len();
    let lanes = ctx.max_lanes.max(1);
    let (trans, alpha, beta) = (config.trans, config.alpha, config.beta);
    let isa = ctx.isa;

    if lanes > 1 && out_len >= PARALLEL_THRESHOLD_OUT {
        let chunk = out_len.div_ceil(lanes);
        y.par_chunks_mut(chunk).enumerate().for_each(|(ci, yc)| {
            pass(a, x, yc, bias, m, n, trans, alpha, beta, isa, ci * chunk, &act);
        });
    } else {
        pass(a, x, y, bias, m, n, trans, alpha, beta, isa, 0, &act);
    }
}

/// One fused pass over a chunk of the output. `out0` is the logical index of
/// the chunk's first output element.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn pass<A: Fn(f32) -> f32>(
    a: &[f32],
    x: &[f32],
    yc: &mut [f32],
    bias: Option<&[f32]>,
    m: usize,
    n: usize,
    trans: bool,
    alpha: f32,
    beta: f32,
    isa: IsaLevel,
    out0: usize,
    act: &A,
) {
    if trans {
        pass_cols(a, x, yc, bias, m, n, out0, alpha, beta, act);
    } else {
        pass_rows(a, x, yc, bias, n, out0, alpha, beta, isa, act);
    }
}

/// Non-transposed pass: output element i reduces row i of A against x.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn pass_rows<A: Fn(f32) -> f32>(
    a: &[f32],
    x: &[f32],
    yc: &mut [f32],
    bias: Option<&[f32]>,
    n: usize,
    row0: usize,
    alpha: f32,
    beta: f32,
    isa: IsaLevel,
    act: &A,
) {
    debug_assert_eq!(x.len(), n);
    // beta/bias resolved once; each arm is a single specialized loop.
    match (beta == 0.0, bias) {
        (true, None) => {
            for (i, out) in yc.iter_mut().enumerate() {
                let row = &a[(row0 + i) * n..(row0 + i + 1) * n];
                *out = act(alpha * dot_row(row, x, isa));
            }
        }
        (true, Some(b)) => {
            for (i, out) in yc.iter_mut().enumerate() {
                let row = &a[(row0 + i) * n..(row0 + i + 1) * n];
                *out = act(alpha * dot_row(row, x, isa) + b[row0 + i]);
            }
        }
        (false, None) => {
            for (i, out) in yc.iter_mut().enumerate() {
                let row = &a[(row0 + i) * n..(row0 + i + 1) * n];
                *out = act(alpha * dot_row(row, x, isa) + beta * *out);
            }
        }
        (false, Some(b)) => {
            for (i, out) in yc.iter_mut().enumerate() {
                let row = &a[(row0 + i) * n..(row0 + i + 1) * n];
                *out = act(alpha * dot_row(row, x, isa) + beta * *out + b[row0 + i]);
            }
        }
    }
}

/// Transposed pass: output element i reduces column i of A against x, walking
/// the column at stride N in the same canonical order as the row reduction.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn pass_cols<A: Fn(f32) -> f32>(
    a: &[f32],
    x: &[f32],
    yc: &mut [f32],
    bias: Option<&[f32]>,
    m: usize,
    n: usize,
    col0: usize,
    alpha: f32,
    beta: f32,
    act: &A,
) {
    debug_assert_eq!(x.len(), m);
    match (beta == 0.0, bias) {
        (true, None) => {
            for (i, out) in yc.iter_mut().enumerate() {
                *out = act(alpha * dot_col(a, x, col0 + i, m, n));
            }
        }
        (true, Some(b)) => {
            for (i, out) in yc.iter_mut().enumerate() {
                *out = act(alpha * dot_col(a, x, col0 + i, m, n) + b[col0 + i]);
            }
        }
        (false, None) => {
            for (i, out) in yc.iter_mut().enumerate() {
                *out = act(alpha * dot_col(a, x, col0 + i, m, n) + beta * *out);
            }
        }
        (false, Some(b)) => {
            for (i, out) in yc.iter_mut().enumerate() {
                *out = act(alpha * dot_col(a, x, col0 + i, m, n) + beta * *out + b[col0 + i]);
            }
        }
    }
}

/// Fixed fold of the interleaved partial sums. Must match the AVX2
/// horizontal-sum shape exactly.
#[inline(always)]
fn fold_lanes(acc: [f32; DOT_LANES]) -> f32 {
    ((acc[0] + acc[4]) + (acc[2] + acc[6])) + ((acc[1] + acc[5]) + (acc[3] + acc[7]))
}

/// Canonical row reduction: 8 interleaved partials, fixed fold, scalar tail.
#[inline(always)]
fn dot_row_scalar(row: &[f32], x: &[f32]) -> f32 {
    debug_assert_eq!(row.len(), x.len());
    let k = row.len();
    let chunks = k / DOT_LANES;
    let mut acc = [0.0f32; DOT_LANES];
    for c in 0..chunks {
        let base = c * DOT_LANES;
        for l in 0..DOT_LANES {
            acc[l] += row[base + l] * x[base + l];
        }
    }
    let mut sum = fold_lanes(acc);
    for j in chunks * DOT_LANES..k {
        sum += row[j] * x[j];
    }
    sum
}

/// Column reduction at stride `n`, same interleave and fold as the row path.
#[inline(always)]
fn dot_col(a: &[f32], x: &[f32], col: usize, m: usize, n: usize) -> f32 {
    let chunks = m / DOT_LANES;
    let mut acc = [0.0f32; DOT_LANES];
    for c in 0..chunks {
        let base = c * DOT_LANES;
        for l in 0..DOT_LANES {
            acc[l] += a[(base + l) * n + col] * x[base + l];
        }
    }
    let mut sum = fold_lanes(acc);
    for j in chunks * DOT_LANES..m {
        sum += a[j * n + col] * x[j];
    }
    sum
}

/// Row reduction with ISA dispatch. The context's capability gates the SIMD
/// path; the hardware check guards against over-claiming contexts.
#[inline(always)]
fn dot_row(row: &[f32], x: &[f32], isa: IsaLevel) -> f32 {
    match isa {
        #[cfg(target_arch = "x86_64")]
        IsaLevel::Avx2 if is_x86_feature_detected!("avx2") => unsafe { dot_row_avx2(row, x) },
        _ => dot_row_scalar(row, x),
    }
}

/// AVX2 row reduction, bit-identical to [`dot_row_scalar`]: each register
/// lane is one interleaved partial sum, the horizontal sum reproduces
/// [`fold_lanes`], and the tail is scalar. Multiply and add stay separate
/// (no FMA) so every intermediate rounds like the scalar path.
///
/// # Safety
///
/// Caller must ensure AVX2 is available.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn dot_row_avx2(row: &[f32], x: &[f32]) -> f32 {
    use std::arch::x86_64::*;

    debug_assert_eq!(row.len(), x.len());
    let k = row.len();
    let chunks = k / DOT_LANES;
    let mut acc = _mm256_setzero_ps();
    for c in 0..chunks {
        let base = c * DOT_LANES;
        let va = _mm256_loadu_ps(row.as_ptr().add(base));
        let vx = _mm256_loadu_ps(x.as_ptr().add(base));
        acc = _mm256_add_ps(acc, _mm256_mul_ps(va, vx));
    }
    // [s0+s4, s1+s5, s2+s6, s3+s7] -> pairwise -> single lane
    let lo = _mm256_castps256_ps128(acc);
    let hi = _mm256_extractf128_ps(acc, 1);
    let s4 = _mm_add_ps(lo, hi);
    let s2 = _mm_add_ps(s4, _mm_movehl_ps(s4, s4));
    let s1 = _mm_add_ss(s2, _mm_shuffle_ps(s2, s2, 0x55));
    let mut sum = _mm_cvtss_f32(s1);
    for j in chunks * DOT_LANES..k {
        sum += row[j] * x[j];
    }
    sum
}
