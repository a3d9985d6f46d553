//! Statevector owned by a single optimisation run.

use num_complex::Complex64;
use tracing::warn;
use uuid::Uuid;

use crate::amplitude;
use crate::error::{QoptError, QoptResult};

/// Largest statevector a run may allocate.
pub const MAX_DIMENSIONS: usize = 1 << 20;

/// Register size used when no dimension is configured: `2^n` amplitudes
/// for `n` variables, capped at `2^10`.
pub fn resolve_dimensions(explicit: Option<usize>, num_variables: usize) -> usize {
    explicit.unwrap_or_else(|| 1usize << num_variables.min(10))
}

/// Outcome of a renormalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Normalization {
    /// The amplitudes were divided by their (positive, finite) norm.
    Normalized,
    /// The norm was zero or non-finite; the state was reset to a uniform
    /// superposition and the run continues.
    Recovered,
}

impl Normalization {
    /// True if the degenerate-state recovery path was taken.
    pub fn recovered(self) -> bool {
        self == Normalization::Recovered
    }
}

/// A finite-dimensional complex amplitude vector.
///
/// The measurement probabilities are recomputed on every
/// [`normalize`](Self::normalize) and are never written independently, so
/// `probabilities()[i] == |amplitudes()[i]|²` whenever the state is read.
#[derive(Debug, Clone)]
pub struct QuantumState {
    id: String,
    amplitudes: Vec<Complex64>,
    probabilities: Vec<f64>,
}

impl QuantumState {
    /// Create a uniform superposition: every amplitude is `(1/√d, 0)`.
    pub fn uniform(dimensions: usize) -> QoptResult<Self> {
        if dimensions == 0 || dimensions > MAX_DIMENSIONS {
            return Err(QoptError::InvalidDimension(dimensions));
        }
        let amp = 1.0 / (dimensions as f64).sqrt();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            amplitudes: vec![Complex64::new(amp, 0.0); dimensions],
            probabilities: vec![amp * amp; dimensions],
        })
    }

    /// Build a state from raw amplitudes and normalize it.
    ///
    /// A zero or non-finite vector is recovered to the uniform superposition.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> QoptResult<(Self, Normalization)> {
        if amplitudes.is_empty() {
            return Err(QoptError::InvalidDimension(0));
        }
        let d = amplitudes.len();
        let mut state = Self {
            id: Uuid::new_v4().to_string(),
            amplitudes,
            probabilities: vec![0.0; d],
        };
        let outcome = state.normalize();
        Ok((state, outcome))
    }

    /// Opaque identifier, unique per state instance.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of basis states.
    pub fn dimensions(&self) -> usize {
        self.amplitudes.len()
    }

    /// The amplitude vector.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Mutable access for operators. Callers must renormalize before the
    /// state is read again.
    pub(crate) fn amplitudes_mut(&mut self) -> &mut [Complex64] {
        &mut self.amplitudes
    }

    /// Replace the amplitude vector wholesale (same dimension).
    pub(crate) fn replace_amplitudes(&mut self, amplitudes: Vec<Complex64>) {
        debug_assert_eq!(amplitudes.len(), self.amplitudes.len());
        self.amplitudes = amplitudes;
    }

    /// Measurement probabilities `|a_i|²`.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Probability of a single slot (0 for out-of-range slots).
    pub fn probability(&self, slot: usize) -> f64 {
        self.probabilities.get(slot).copied().unwrap_or(0.0)
    }

    /// Σ |a_i|² as currently stored.
    pub fn total_probability(&self) -> f64 {
        amplitude::norm_sqr(&self.amplitudes)
    }

    /// Divide the amplitudes by their L2 norm and refresh probabilities.
    ///
    /// A zero or non-finite norm (including NaN amplitudes) resets the
    /// state to a uniform superposition.
    pub fn normalize(&mut self) -> Normalization {
        let outcome = if amplitude::is_finite(&self.amplitudes) {
            let n = amplitude::normalize(&mut self.amplitudes);
            if n > 0.0 && n.is_finite() {
                Normalization::Normalized
            } else {
                Normalization::Recovered
            }
        } else {
            Normalization::Recovered
        };

        if outcome.recovered() {
            warn!(
                state = %self.id,
                dimensions = self.dimensions(),
                "degenerate statevector, resetting to uniform superposition"
            );
            self.reset_uniform();
        }

        self.refresh_probabilities();
        outcome
    }

    fn reset_uniform(&mut self) {
        let amp = 1.0 / (self.dimensions() as f64).sqrt();
        for a in &mut self.amplitudes {
            *a = Complex64::new(amp, 0.0);
        }
    }

    fn refresh_probabilities(&mut self) {
        self.probabilities.clear();
        self.probabilities
            .extend(self.amplitudes.iter().map(Complex64::norm_sqr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_state() {
        let s = QuantumState::uniform(4).unwrap();
        assert_eq!(s.dimensions(), 4);
        for (a, p) in s.amplitudes().iter().zip(s.probabilities()) {
            assert!((a.re - 0.5).abs() < 1e-12);
            assert_eq!(a.im, 0.0);
            assert!((p - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            QuantumState::uniform(0),
            Err(QoptError::InvalidDimension(0))
        ));
    }

    #[test]
    fn test_oversized_dimension_rejected() {
        let d = usize::MAX / 8;
        assert!(matches!(
            QuantumState::uniform(d),
            Err(QoptError::InvalidDimension(got)) if got == d
        ));
    }

    #[test]
    fn test_resolve_dimensions() {
        assert_eq!(resolve_dimensions(None, 3), 8);
        assert_eq!(resolve_dimensions(None, 40), 1024);
        assert_eq!(resolve_dimensions(Some(5), 40), 5);
    }

    #[test]
    fn test_normalize_rescales() {
        let (s, outcome) = QuantumState::from_amplitudes(vec![
            Complex64::new(3.0, 0.0),
            Complex64::new(0.0, 4.0),
        ])
        .unwrap();
        assert_eq!(outcome, Normalization::Normalized);
        assert!((s.probabilities()[0] - 0.36).abs() < 1e-12);
        assert!((s.probabilities()[1] - 0.64).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_recovers() {
        let (s, outcome) = QuantumState::from_amplitudes(vec![Complex64::new(0.0, 0.0); 2]).unwrap();
        assert!(outcome.recovered());
        assert!((s.probability(0) - 0.5).abs() < 1e-12);
        assert!((s.probability(1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nan_vector_recovers() {
        let (s, outcome) = QuantumState::from_amplitudes(vec![
            Complex64::new(f64::NAN, 0.0),
            Complex64::new(1.0, 0.0),
        ])
        .unwrap();
        assert!(outcome.recovered());
        assert!((s.total_probability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_probability_out_of_range_is_zero() {
        let s = QuantumState::uniform(2).unwrap();
        assert_eq!(s.probability(5), 0.0);
    }
}
