//! Activation functions and the activation descriptor.
//!
//! The [`Activation`] enum names every variant the operator layer can request.
//! The fused SGEMV kernel implements a subset of them in its epilogue
//! ([`Activation::fusable`]); the rest are available here as standalone
//! in-place slice appliers for callers that run the stage separately.
//!
//! Formulas, with `alpha` the kernel's single tunable scale/slope scalar and
//! `six` the clamp bound (default 6.0):
//!
//! - **Relu**: `f(v) = max(v, 0)`
//! - **Relu6**: `f(v) = min(max(v, 0), six)`
//! - **LeakyRelu**: `f(v) = v` if `v > 0`, else `alpha * v`
//! - **Sigmoid**: `f(v) = 1 / (1 + exp(-v))`
//! - **Tanh**: `f(v) = tanh(v)`
//! - **HardSwish**: `f(v) = v * min(max(v + 3, 0), 6) / 6`

/// Activation variants the operator layer can name.
///
/// Extensible: new variants must document their formula in the module doc and
/// either join the fused set or gain a slice applier here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum Activation {
    Relu,
    Relu6,
    LeakyRelu,
    Sigmoid,
    Tanh,
    HardSwish,
}

impl Activation {
    /// Whether the fused SGEMV epilogue implements this variant.
    #[inline]
    pub fn fusable(self) -> bool {
        matches!(self, Self::Relu | Self::Relu6 | Self::LeakyRelu)
    }

    /// Apply this activation to one value. `alpha` is the leaky slope,
    /// `six` the clamp bound; both are ignored by variants that don't use
    /// them.
    #[inline(always)]
    pub fn apply(self, v: f32, alpha: f32, six: f32) -> f32 {
        match self {
            Self::Relu => v.max(0.0),
            Self::Relu6 => v.max(0.0).min(six),
            Self::LeakyRelu => {
                if v > 0.0 {
                    v
                } else {
                    alpha * v
                }
            }
            Self::Sigmoid => sigmoid_scalar(v),
            Self::Tanh => v.tanh(),
            Self::HardSwish => v * (v + 3.0).max(0.0).min(6.0) / 6.0,
        }
    }
}

/// ReLU in-place: `x = max(0, x)`.
#[inline(always)]
pub fn relu_inplace(data: &mut [f32]) {
    for x in data.iter_mut() {
        *x = x.max(0.0);
    }
}

/// Bounded ReLU in-place: `x = min(max(x, 0), six)`.
#[inline(always)]
pub fn relu6_inplace(data: &mut [f32], six: f32) {
    for x in data.iter_mut() {
        *x = x.max(0.0).min(six);
    }
}

/// Leaky ReLU in-place: `x = x` if positive, else `alpha * x`.
#[inline(always)]
pub fn leaky_relu_inplace(data: &mut [f32], alpha: f32) {
    for x in data.iter_mut() {
        *x = if *x > 0.0 { *x } else { alpha * *x };
    }
}

/// Sigmoid in-place: `x = 1 / (1 + exp(-x))`.
#[inline(always)]
pub fn sigmoid_inplace(data: &mut [f32]) {
    for x in data.iter_mut() {
        *x = sigmoid_scalar(*x);
    }
}

/// Sigmoid for a single value (numerically stable on both signs).
#[inline(always)]
pub fn sigmoid_scalar(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let ex = x.exp();
        ex / (1.0 + ex)
    }
}

/// Tanh in-place.
#[inline(always)]
pub fn tanh_inplace(data: &mut [f32]) {
    for x in data.iter_mut() {
        *x = x.tanh();
    }
}

/// Hard-swish in-place: `x = x * min(max(x + 3, 0), 6) / 6`.
#[inline(always)]
pub fn hard_swish_inplace(data: &mut [f32]) {
    for x in data.iter_mut() {
        *x = *x * (*x + 3.0).max(0.0).min(6.0) / 6.0;
    }
}
