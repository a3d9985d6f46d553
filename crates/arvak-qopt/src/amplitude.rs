//! Complex vector arithmetic over amplitude slices.
//!
//! Scalars are [`num_complex::Complex64`]; this module adds the handful of
//! slice-level operations the statevector and operators need.

use num_complex::Complex64;

/// Shorthand for the complex zero.
pub const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Element-wise sum `a + b`. Slices must have equal length.
pub fn add(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Scale every amplitude by a complex factor.
pub fn scale(v: &mut [Complex64], factor: Complex64) {
    for amp in v {
        *amp *= factor;
    }
}

/// Inner product ⟨a|b⟩ = Σ conj(a_i) · b_i.
pub fn inner(a: &[Complex64], b: &[Complex64]) -> Complex64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x.conj() * y).sum()
}

/// Σ |a_i|².
pub fn norm_sqr(v: &[Complex64]) -> f64 {
    v.iter().map(Complex64::norm_sqr).sum()
}

/// L2 norm.
pub fn norm(v: &[Complex64]) -> f64 {
    norm_sqr(v).sqrt()
}

/// True when every component is finite (no NaN / ±∞).
pub fn is_finite(v: &[Complex64]) -> bool {
    v.iter().all(|a| a.re.is_finite() && a.im.is_finite())
}

/// Divide by the L2 norm in place.
///
/// Returns the norm that was divided out. A zero or non-finite norm leaves
/// the slice untouched and is returned as-is so the caller can recover.
pub fn normalize(v: &mut [Complex64]) -> f64 {
    let n = norm(v);
    if n > 0.0 && n.is_finite() {
        for amp in v.iter_mut() {
            *amp /= n;
        }
    }
    n
}
