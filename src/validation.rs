//! Shape validation utilities for kernel parameters.
//!
//! All validation functions return `Result<(), String>` so each entry point
//! can map failures into its own error enum while sharing the checks.
//! Overflow checks use `checked_mul`.

/// Validate GEMV dimensions.
#[inline]
pub fn validate_gemv_dims(m: usize, n: usize) -> Result<(), String> {
    if m == 0 || n == 0 {
        return Err("dimensions must be > 0".into());
    }
    Ok(())
}

/// Validate a buffer length matches the expected length exactly.
#[inline]
pub fn validate_input_len(actual: usize, expected: usize, name: &str) -> Result<(), String> {
    if actual != expected {
        return Err(format!("{} len {} != expected {}", name, actual, expected));
    }
    Ok(())
}

/// Compute the matrix element count with overflow check.
#[inline]
pub fn compute_matrix_len(m: usize, n: usize) -> Result<usize, String> {
    m.checked_mul(n)
        .ok_or_else(|| "matrix len overflow".to_string())
}
