//! Operators acting on a [`QuantumState`].
//!
//! Every operator mutates the state in place and renormalizes before
//! returning, so the normalization and probability invariants hold whenever
//! the caller reads the state. The returned [`Normalization`] reports
//! whether the degenerate-state recovery path was taken.
//!
//! | Operator | Used by | Action |
//! |---|---|---|
//! | [`fluctuation`] | annealing | Gaussian kicks, σ = √(T/100) |
//! | [`reinforce`] | annealing | boost slots of an accepted assignment |
//! | [`problem_phase`] | QAOA | phase `w·γ·sin(iπ/d)` per objective |
//! | [`mixer`] | QAOA | global phase `β·π/4` |
//! | [`coin`] | walk | `(a_i + a_{i+1})/√2` |
//! | [`shift`] | walk | cyclic `i → i+1` |
//! | [`interference`] | walk | neighbour phase-difference damping |
//! | [`noise`] | all (opt-in) | gate errors + imaginary decay |

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use num_complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::amplitude;
use crate::config::NoiseConfig;
use crate::problem::Objective;
use crate::state::{Normalization, QuantumState};

/// Relative boost/damping applied by [`interference`].
pub const INTERFERENCE_STRENGTH: f64 = 0.1;

/// Relative boost applied by [`reinforce`].
pub const REINFORCEMENT_STRENGTH: f64 = 0.1;

/// Perturb every amplitude with independent Gaussian noise of standard
/// deviation `√(temperature/100)` on both components.
pub fn fluctuation<R: Rng + ?Sized>(
    state: &mut QuantumState,
    temperature: f64,
    rng: &mut R,
) -> Normalization {
    let sigma = (temperature.max(0.0) / 100.0).sqrt();
    for amp in state.amplitudes_mut() {
        let re: f64 = StandardNormal.sample(rng);
        let im: f64 = StandardNormal.sample(rng);
        *amp += Complex64::new(sigma * re, sigma * im);
    }
    state.normalize()
}

/// Problem-encoding phase: for each objective, rotate amplitude `i` by
/// `weight · γ · sin(i·π/d)`.
pub fn problem_phase(
    state: &mut QuantumState,
    objectives: &[Objective],
    gamma: f64,
) -> Normalization {
    let d = state.dimensions() as f64;
    for objective in objectives {
        for (i, amp) in state.amplitudes_mut().iter_mut().enumerate() {
            let theta = objective.weight * gamma * (i as f64 * PI / d).sin();
            *amp *= Complex64::from_polar(1.0, theta);
        }
    }
    state.normalize()
}

/// Mixer: rotate every amplitude by the shared angle `β·π/4`.
pub fn mixer(state: &mut QuantumState, beta: f64) -> Normalization {
    amplitude::scale(
        state.amplitudes_mut(),
        Complex64::from_polar(1.0, beta * PI / 4.0),
    );
    state.normalize()
}

/// Hadamard-like coin: `1/√2` on the diagonal and super-diagonal.
pub fn coin(state: &mut QuantumState) -> Normalization {
    let amps = state.amplitudes();
    let d = amps.len();
    let next: Vec<Complex64> = (0..d)
        .map(|i| {
            let upper = if i + 1 < d { amps[i + 1] } else { amplitude::ZERO };
            (amps[i] + upper) * FRAC_1_SQRT_2
        })
        .collect();
    state.replace_amplitudes(next);
    state.normalize()
}

/// Cyclic shift with periodic boundary: amplitude `i` moves to `i+1 mod d`.
pub fn shift(state: &mut QuantumState) -> Normalization {
    state.amplitudes_mut().rotate_right(1);
    state.normalize()
}

/// Neighbour interference.
///
/// Each amplitude is scaled by `1 + 0.1·cos(Δφ)` where `Δφ` is its phase
/// difference to the cyclic next slot: in-phase neighbours reinforce,
/// opposite-phase neighbours damp. Factors are computed from the
/// pre-update vector.
pub fn interference(state: &mut QuantumState) -> Normalization {
    let amps = state.amplitudes();
    let d = amps.len();
    let next: Vec<Complex64> = (0..d)
        .map(|i| {
            let j = (i + 1) % d;
            let delta = amps[j].arg() - amps[i].arg();
            amps[i] * (1.0 + INTERFERENCE_STRENGTH * delta.cos())
        })
        .collect();
    state.replace_amplitudes(next);
    state.normalize()
}

/// Hardware-style noise.
///
/// With probability `gate_error_rate` per amplitude, both components get a
/// uniform kick in `[-rate, rate]`. Every imaginary component then decays
/// by `exp(-1/decoherence_time)`.
pub fn noise<R: Rng + ?Sized>(
    state: &mut QuantumState,
    config: &NoiseConfig,
    rng: &mut R,
) -> Normalization {
    let rate = config.gate_error_rate;
    let decay = (-1.0 / config.decoherence_time).exp();
    for amp in state.amplitudes_mut() {
        if rate > 0.0 && rng.gen_bool(rate.min(1.0)) {
            amp.re += rng.gen_range(-rate..=rate);
            amp.im += rng.gen_range(-rate..=rate);
        }
        amp.im *= decay;
    }
    state.normalize()
}

/// Boost the given slots by `1 + 0.1`, pulling probability mass toward an
/// accepted assignment. Out-of-range slots are ignored.
pub fn reinforce(state: &mut QuantumState, slots: &[usize]) -> Normalization {
    let amps = state.amplitudes_mut();
    for &slot in slots {
        if let Some(amp) = amps.get_mut(slot) {
            *amp *= 1.0 + REINFORCEMENT_STRENGTH;
        }
    }
    state.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ObjectiveKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_normalized(s: &QuantumState) {
        assert!((s.total_probability() - 1.0).abs() < 1e-9);
        for (a, p) in s.amplitudes().iter().zip(s.probabilities()) {
            assert!((a.norm_sqr() - p).abs() < 1e-12);
        }
    }

    fn point_state(d: usize, slot: usize) -> QuantumState {
        let mut amps = vec![Complex64::new(0.0, 0.0); d];
        amps[slot] = Complex64::new(1.0, 0.0);
        QuantumState::from_amplitudes(amps).unwrap().0
    }

    #[test]
    fn test_shift_moves_mass_cyclically() {
        let mut s = point_state(4, 3);
        assert_eq!(shift(&mut s), Normalization::Normalized);
        assert!((s.probability(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_coin_splits_mass_backwards() {
        // |2⟩ → (|1⟩ + |2⟩)/√2 after coin.
        let mut s = point_state(4, 2);
        let _ = coin(&mut s);
        assert!((s.probability(1) - 0.5).abs() < 1e-12);
        assert!((s.probability(2) - 0.5).abs() < 1e-12);
        assert_normalized(&s);
    }

    #[test]
    fn test_zero_angle_phase_and_mixer_are_identity() {
        let mut s = QuantumState::uniform(4).unwrap();
        let objectives = vec![Objective::minimize("o", ObjectiveKind::GenericSum, 3.0)];
        let _ = problem_phase(&mut s, &objectives, 0.0);
        let _ = mixer(&mut s, 0.0);
        for a in s.amplitudes() {
            assert!((a - Complex64::new(0.5, 0.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn test_phase_operators_preserve_probabilities() {
        let mut s = point_state(3, 1);
        let objectives = vec![Objective::minimize("o", ObjectiveKind::GenericSum, 1.0)];
        let _ = problem_phase(&mut s, &objectives, 0.7);
        let _ = mixer(&mut s, 1.3);
        assert!((s.probability(1) - 1.0).abs() < 1e-12);
        // Phase of slot 1 is γ·sin(π/3) + β·π/4.
        let expected = 0.7 * (PI / 3.0).sin() + 1.3 * PI / 4.0;
        assert!((s.amplitudes()[1].arg() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_interference_keeps_uniform_state_uniform() {
        let mut s = QuantumState::uniform(5).unwrap();
        let _ = interference(&mut s);
        for p in s.probabilities() {
            assert!((p - 0.2).abs() < 1e-12);
        }
    }

    #[test]
    fn test_interference_damps_out_of_phase_slot() {
        let (mut s, _) = QuantumState::from_amplitudes(vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(-1.0, 0.0),
            Complex64::new(-1.0, 0.0),
        ])
        .unwrap();
        let _ = interference(&mut s);
        // Slot 1 is in phase with slot 2 and is boosted; slot 0 and slot 2
        // face an opposite-phase neighbour and are damped.
        assert!(s.probability(1) > s.probability(0));
        assert!((s.probability(0) - s.probability(2)).abs() < 1e-12);
        assert_normalized(&s);
    }

    #[test]
    fn test_fluctuation_normalizes() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = QuantumState::uniform(8).unwrap();
        for _ in 0..20 {
            let _ = fluctuation(&mut s, 50.0, &mut rng);
            assert_normalized(&s);
        }
    }

    #[test]
    fn test_zero_temperature_fluctuation_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = QuantumState::uniform(4).unwrap();
        let _ = fluctuation(&mut s, 0.0, &mut rng);
        for p in s.probabilities() {
            assert!((p - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_noise_decays_imaginary_part() {
        let mut rng = StdRng::seed_from_u64(3);
        let (mut s, _) = QuantumState::from_amplitudes(vec![
            Complex64::new(0.0, 1.0),
            Complex64::new(1.0, 0.0),
        ])
        .unwrap();
        let cfg = NoiseConfig {
            gate_error_rate: 0.0,
            decoherence_time: 1.0,
        };
        let _ = noise(&mut s, &cfg, &mut rng);
        // |im|² shrinks by e^-2 relative to the real slot.
        let ratio = s.probability(0) / s.probability(1);
        assert!((ratio - (-2.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_reinforce_boosts_slot() {
        let mut s = QuantumState::uniform(4).unwrap();
        let _ = reinforce(&mut s, &[2, 99]);
        assert!(s.probability(2) > s.probability(0));
        assert_normalized(&s);
    }
}
