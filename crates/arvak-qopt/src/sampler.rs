//! Measurement: turning a statevector into a concrete assignment.
//!
//! Variable `i` is read from probability slot `i mod d`. For discrete and
//! binary variables the `k`-th allowed value is tied to slot
//! `(i + k) mod d`, so the statevector biases *which* value is drawn.
//! Integer ranges wider than `d` are split into `d` contiguous buckets;
//! the state picks the bucket and the value is drawn uniformly inside it.
//! Continuous variables draw from a Gaussian centred on the domain midpoint
//! whose spread scales with `√(d·p)`: a uniform state spreads across the
//! whole domain, reinforced slots spread wider, suppressed slots
//! concentrate on the midpoint.
//!
//! All randomness comes from the caller's `Rng`; equal seeds give equal
//! assignments.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::problem::{Assignment, Domain, OptimizationProblem, Variable, VariableKind};
use crate::state::QuantumState;

const BINARY_VALUES: [f64; 2] = [0.0, 1.0];

/// Sample an index from non-negative weights (CDF method).
///
/// Weights need not sum to one. Returns `None` if they sum to zero.
pub fn sample_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return None;
    }
    let u: f64 = rng.r#gen::<f64>() * total;
    let mut cumsum = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumsum += w;
        if u < cumsum {
            return Some(i);
        }
    }
    // Floating-point rounding: return last index.
    Some(weights.len() - 1)
}

/// Measure a statevector: draw one value per variable, weighted by the
/// probability slots associated with it.
///
/// Variables with `quantum_superposition == false`, or whose slot has zero
/// probability, fall back to a uniform draw.
pub fn measure<R: Rng + ?Sized>(
    state: &QuantumState,
    problem: &OptimizationProblem,
    rng: &mut R,
) -> Assignment {
    let d = state.dimensions();
    problem
        .variables
        .iter()
        .enumerate()
        .map(|(i, var)| {
            let p = state.probability(i % d);
            let value = if var.quantum_superposition && p > 0.0 {
                sample_weighted(var, i, state, rng)
            } else {
                sample_uniform(var, rng)
            };
            (var.id.clone(), value)
        })
        .collect()
}

/// Draw every variable uniformly over its domain, ignoring any state.
pub fn sample_classical<R: Rng + ?Sized>(problem: &OptimizationProblem, rng: &mut R) -> Assignment {
    problem
        .variables
        .iter()
        .map(|var| (var.id.clone(), sample_uniform(var, rng)))
        .collect()
}

/// The probability slots an assignment is associated with, one per
/// variable. Used to reinforce the state toward an accepted assignment.
pub fn slots_for(problem: &OptimizationProblem, assignment: &Assignment, dimensions: usize) -> Vec<usize> {
    if dimensions == 0 {
        return Vec::new();
    }
    problem
        .variables
        .iter()
        .enumerate()
        .filter_map(|(i, var)| {
            let value = *assignment.get(&var.id)?;
            let offset = match value_set(var) {
                Values::Listed(values) => values
                    .iter()
                    .position(|v| (v - value).abs() < 1e-9)
                    .unwrap_or(0),
                Values::Integers(range) => range.bucket_of(value, dimensions),
                Values::Continuous => 0,
            };
            Some((i + offset) % dimensions)
        })
        .collect()
}

/// What a single draw of a variable can produce.
enum Values<'a> {
    Listed(&'a [f64]),
    Integers(IntegerRange),
    Continuous,
}

/// The integers of a closed range, never materialised.
#[derive(Debug, Clone, Copy)]
struct IntegerRange {
    lo: i64,
    hi: i64,
}

impl IntegerRange {
    fn len(self) -> u128 {
        (i128::from(self.hi) - i128::from(self.lo) + 1) as u128
    }

    fn buckets(self, dimensions: usize) -> usize {
        self.len().min(dimensions as u128) as usize
    }

    /// Inclusive bounds of bucket `k` out of `buckets`.
    fn bucket(self, k: usize, buckets: usize) -> (i64, i64) {
        let n = self.len();
        let start = k as u128 * n / buckets as u128;
        let end = (k as u128 + 1) * n / buckets as u128 - 1;
        (self.lo + start as i64, self.lo + end as i64)
    }

    fn bucket_of(self, value: f64, dimensions: usize) -> usize {
        let buckets = self.buckets(dimensions);
        if buckets == 0 {
            return 0;
        }
        let v = (value.round() as i64).clamp(self.lo, self.hi);
        let offset = (i128::from(v) - i128::from(self.lo)) as u128;
        (((offset + 1) * buckets as u128 - 1) / self.len()) as usize
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        rng.gen_range(self.lo..=self.hi) as f64
    }
}

fn value_set(var: &Variable) -> Values<'_> {
    match (var.kind, &var.domain) {
        (VariableKind::Binary, _) => Values::Listed(&BINARY_VALUES),
        (_, Domain::Values { allowed_values }) => Values::Listed(allowed_values),
        (VariableKind::Continuous, Domain::Range { .. }) => Values::Continuous,
        (VariableKind::Discrete, domain) => match domain.integer_bounds() {
            Some((lo, hi)) => Values::Integers(IntegerRange { lo, hi }),
            None => Values::Continuous,
        },
    }
}

fn sample_weighted<R: Rng + ?Sized>(
    var: &Variable,
    index: usize,
    state: &QuantumState,
    rng: &mut R,
) -> f64 {
    let d = state.dimensions();
    match value_set(var) {
        Values::Listed(values) => {
            let weights: Vec<f64> = (0..values.len())
                .map(|k| state.probability((index + k) % d))
                .collect();
            match sample_index(&weights, rng) {
                Some(k) => values[k],
                None => pick_uniform(values, rng),
            }
        }
        Values::Integers(range) => {
            let buckets = range.buckets(d);
            let weights: Vec<f64> = (0..buckets)
                .map(|k| state.probability((index + k) % d))
                .collect();
            match sample_index(&weights, rng) {
                Some(k) => {
                    let (lo, hi) = range.bucket(k, buckets);
                    rng.gen_range(lo..=hi) as f64
                }
                None => range.sample(rng),
            }
        }
        Values::Continuous => {
            let (mid, half) = var.domain.span();
            let p = state.probability(index % d);
            let sigma = half * (d as f64 * p).sqrt();
            let draw = match Normal::new(mid, sigma) {
                Ok(normal) => normal.sample(rng),
                Err(_) => mid,
            };
            draw.clamp(mid - half, mid + half)
        }
    }
}

fn sample_uniform<R: Rng + ?Sized>(var: &Variable, rng: &mut R) -> f64 {
    match value_set(var) {
        Values::Listed(values) => pick_uniform(values, rng),
        Values::Integers(range) => range.sample(rng),
        Values::Continuous => {
            let (mid, half) = var.domain.span();
            rng.gen_range((mid - half)..=(mid + half))
        }
    }
}

fn pick_uniform<R: Rng + ?Sized>(values: &[f64], rng: &mut R) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values[rng.gen_range(0..values.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn problem() -> OptimizationProblem {
        OptimizationProblem::new("p")
            .with_variable(Variable::continuous("x", 0.0, 10.0))
            .with_variable(Variable::discrete("y", vec![2.0, 4.0, 8.0]))
            .with_variable(Variable::binary("z"))
    }

    fn point_state(d: usize, slot: usize) -> QuantumState {
        let mut amps = vec![Complex64::new(0.0, 0.0); d];
        amps[slot] = Complex64::new(1.0, 0.0);
        QuantumState::from_amplitudes(amps).unwrap().0
    }

    #[test]
    fn test_measure_respects_domains() {
        let p = problem();
        let s = QuantumState::uniform(8).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let a = measure(&s, &p, &mut rng);
            assert!((0.0..=10.0).contains(&a["x"]));
            assert!([2.0, 4.0, 8.0].contains(&a["y"]));
            assert!(a["z"] == 0.0 || a["z"] == 1.0);
        }
    }

    #[test]
    fn test_measure_is_deterministic_given_seed() {
        let p = problem();
        let s = QuantumState::uniform(8).unwrap();
        let a = measure(&s, &p, &mut StdRng::seed_from_u64(5));
        let b = measure(&s, &p, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_discrete_draw_follows_state() {
        // Variable y is index 1; value k lives in slot 1 + k. With slot 2
        // empty the middle value is never drawn.
        let p = problem();
        let mut amps = vec![Complex64::new(0.0, 0.0); 8];
        amps[1] = Complex64::new(1.0, 0.0);
        amps[3] = Complex64::new(0.0, 1.0);
        let (s, _) = QuantumState::from_amplitudes(amps).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let draws: Vec<f64> = (0..100).map(|_| measure(&s, &p, &mut rng)["y"]).collect();
        assert!(draws.iter().all(|y| *y == 2.0 || *y == 8.0));
        assert!(draws.contains(&2.0));
        assert!(draws.contains(&8.0));
    }

    #[test]
    fn test_zero_probability_slot_falls_back_to_uniform() {
        // Slot 0 empty: x is drawn uniformly, not pinned to the midpoint.
        let p = problem();
        let s = point_state(8, 1);
        let mut rng = StdRng::seed_from_u64(9);
        let spread = (0..100)
            .map(|_| measure(&s, &p, &mut rng)["x"])
            .any(|x| (x - 5.0).abs() > 1.0);
        assert!(spread);
    }

    #[test]
    fn test_classical_sample_covers_all_variables() {
        let p = problem();
        let a = sample_classical(&p, &mut StdRng::seed_from_u64(2));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_slots_for_assignment() {
        let p = problem();
        let a: Assignment = [("x", 3.3), ("y", 4.0), ("z", 1.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        // x → 0, y (k=1) → 1+1, z (k=1) → 2+1
        assert_eq!(slots_for(&p, &a, 8), vec![0, 2, 3]);
        assert_eq!(slots_for(&p, &a, 2), vec![0, 0, 1]);
    }

    #[test]
    fn test_sample_index_zero_weights() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(sample_index(&[0.0, 0.0], &mut rng), None);
        assert_eq!(sample_index(&[0.0, 1.0], &mut rng), Some(1));
    }

    fn wide_integer_problem() -> OptimizationProblem {
        let mut v = Variable::continuous("n", 0.0, 1e10);
        v.kind = VariableKind::Discrete;
        OptimizationProblem::new("wide").with_variable(v)
    }

    #[test]
    fn test_wide_integer_range_draws_without_enumerating() {
        let p = wide_integer_problem();
        let s = QuantumState::uniform(8).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..500 {
            let q = measure(&s, &p, &mut rng)["n"];
            let c = sample_classical(&p, &mut rng)["n"];
            for v in [q, c] {
                assert!((0.0..=1e10).contains(&v));
                assert_eq!(v.fract(), 0.0);
            }
        }
    }

    fn two_slot_state(d: usize, a: usize, b: usize) -> QuantumState {
        let mut amps = vec![Complex64::new(0.0, 0.0); d];
        amps[a] = Complex64::new(1.0, 0.0);
        amps[b] = Complex64::new(0.0, 1.0);
        QuantumState::from_amplitudes(amps).unwrap().0
    }

    #[test]
    fn test_wide_integer_range_follows_bucket_weights() {
        // Slots 0 and 3 populated: draws land in the first or fourth of
        // eight equal buckets of [0, 1e10].
        let p = wide_integer_problem();
        let s = two_slot_state(8, 0, 3);
        let range = IntegerRange {
            lo: 0,
            hi: 10_000_000_000,
        };
        let (b0_lo, b0_hi) = range.bucket(0, 8);
        let (b3_lo, b3_hi) = range.bucket(3, 8);
        let mut rng = StdRng::seed_from_u64(8);
        let draws: Vec<i64> = (0..200)
            .map(|_| measure(&s, &p, &mut rng)["n"] as i64)
            .collect();
        let in_first = |v: &i64| (b0_lo..=b0_hi).contains(v);
        let in_fourth = |v: &i64| (b3_lo..=b3_hi).contains(v);
        assert!(draws.iter().all(|v| in_first(v) || in_fourth(v)));
        assert!(draws.iter().any(in_first));
        assert!(draws.iter().any(in_fourth));
    }

    #[test]
    fn test_small_integer_range_ties_values_to_slots() {
        let mut v = Variable::continuous("k", 0.0, 3.0);
        v.kind = VariableKind::Discrete;
        let p = OptimizationProblem::new("small").with_variable(v);
        let s = two_slot_state(8, 0, 2);
        let mut rng = StdRng::seed_from_u64(1);
        let draws: Vec<f64> = (0..100).map(|_| measure(&s, &p, &mut rng)["k"]).collect();
        assert!(draws.iter().all(|k| *k == 0.0 || *k == 2.0));
        assert!(draws.contains(&2.0));
        let a: Assignment = [("k".to_string(), 2.0)].into_iter().collect();
        assert_eq!(slots_for(&p, &a, 8), vec![2]);
    }

    #[test]
    fn test_bucket_of_inverts_bucket() {
        let range = IntegerRange { lo: -5, hi: 4 };
        let buckets = range.buckets(3);
        assert_eq!(buckets, 3);
        for k in 0..buckets {
            let (lo, hi) = range.bucket(k, buckets);
            assert_eq!(range.bucket_of(lo as f64, 3), k);
            assert_eq!(range.bucket_of(hi as f64, 3), k);
        }
    }
}
