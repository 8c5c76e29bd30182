//! Execution-environment capability description.
//!
//! Kernels running inside an isolated environment cannot probe the host
//! freely; the caller injects an [`ExecutionContext`] describing what the
//! environment allows (core count, vector capability). The context is a
//! plain read-only struct passed by reference — never a process-wide
//! singleton — so kernels stay testable with synthetic contexts ("one lane",
//! "no vector unit") that need no real hardware.
//!
//! [`ExecutionContext::detect`] exists for hosts that may probe; isolated
//! deployments typically deserialize a pinned context from host configuration
//! instead, which is why the types derive serde.

use std::sync::OnceLock;

/// Vector instruction capability tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IsaLevel {
    /// No vector unit assumed. Always available.
    Scalar,
    /// x86-64 AVX2 (256-bit, 8 x f32 per register).
    Avx2,
    /// aarch64 NEON. No dedicated kernel path; selects the canonical scalar
    /// loop, which the compiler vectorizes.
    Neon,
}

impl IsaLevel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Avx2 => "AVX2",
            Self::Neon => "NEON",
        }
    }

    /// f32 lanes per vector register at this level.
    pub fn simd_width(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Avx2 => 8,
            Self::Neon => 4,
        }
    }
}

static ISA_LEVEL: OnceLock<IsaLevel> = OnceLock::new();

/// Detect the best ISA level available on this host, cached after first call.
pub fn detect_isa_level() -> IsaLevel {
    *ISA_LEVEL.get_or_init(|| {
        let level = probe_isa();
        log::debug!("detected ISA level: {}", level.name());
        level
    })
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn probe_isa() -> IsaLevel {
    if is_x86_feature_detected!("avx2") {
        IsaLevel::Avx2
    } else {
        IsaLevel::Scalar
    }
}

#[cfg(target_arch = "aarch64")]
fn probe_isa() -> IsaLevel {
    IsaLevel::Neon
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn probe_isa() -> IsaLevel {
    IsaLevel::Scalar
}

/// Read-only descriptor of the hosting environment's compute capabilities.
///
/// Kernels treat this as an upper bound, not a scheduling command: lane count
/// and ISA level never change numeric results, only how the fixed per-element
/// work is spread out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionContext {
    /// Execution lanes the environment permits for one kernel call.
    /// 1 disables internal parallelism entirely.
    pub max_lanes: usize,
    /// Vector capability kernels may use.
    pub isa: IsaLevel,
}

impl ExecutionContext {
    /// Probe the host for cores and vector features.
    pub fn detect() -> Self {
        let max_lanes = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let ctx = Self {
            max_lanes,
            isa: detect_isa_level(),
        };
        log::debug!("detected execution context: {:?}", ctx);
        ctx
    }

    /// Single lane, detected vector unit. For environments that forbid
    /// threading but allow SIMD.
    pub fn single_lane() -> Self {
        Self {
            max_lanes: 1,
            isa: detect_isa_level(),
        }
    }

    /// Single lane, no vector unit. The most constrained configuration and
    /// the canonical reference for numeric results.
    pub fn scalar() -> Self {
        Self {
            max_lanes: 1,
            isa: IsaLevel::Scalar,
        }
    }

    /// Context with an explicit lane budget and detected vector unit.
    pub fn with_lanes(max_lanes: usize) -> Self {
        Self {
            max_lanes: max_lanes.max(1),
            isa: detect_isa_level(),
        }
    }
}

impl Default for ExecutionContext {
    /// Defaults to the most constrained configuration; hosts that can afford
    /// more call [`ExecutionContext::detect`].
    fn default() -> Self {
        Self::scalar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_has_at_least_one_lane() {
        let ctx = ExecutionContext::detect();
        assert!(ctx.max_lanes >= 1);
    }

    #[test]
    fn test_synthetic_contexts() {
        assert_eq!(ExecutionContext::scalar().max_lanes, 1);
        assert_eq!(ExecutionContext::scalar().isa, IsaLevel::Scalar);
        assert_eq!(ExecutionContext::single_lane().max_lanes, 1);
        assert_eq!(ExecutionContext::with_lanes(0).max_lanes, 1);
        assert_eq!(ExecutionContext::default(), ExecutionContext::scalar());
    }

    #[test]
    fn test_simd_width() {
        assert_eq!(IsaLevel::Scalar.simd_width(), 1);
        assert_eq!(IsaLevel::Avx2.simd_width(), 8);
        assert_eq!(IsaLevel::Neon.simd_width(), 4);
    }

    #[test]
    fn test_context_is_injectable() {
        // Hosts inject pinned contexts via serde; the derives must hold.
        fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
        assert_serde::<ExecutionContext>();
        assert_serde::<IsaLevel>();
    }
}
