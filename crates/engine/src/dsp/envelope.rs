//! Envelope smoother - one-pole attack/release follower on the gain signal

use dynacomp_core::MIN_TIME_MS;

/// Lowest envelope value; keeps the gain strictly positive (-180 dB)
pub const ENV_FLOOR: f64 = 1e-9;

/// One-pole coefficient for a time constant: `exp(-1 / (fs * t_ms * 0.001))`.
///
/// Non-positive times are clamped to `MIN_TIME_MS`; an unusable sample rate
/// yields 0 (instant tracking).
pub fn smoothing_coeff(sample_rate: f64, time_ms: f32) -> f64 {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return 0.0;
    }
    let time_ms = if time_ms > MIN_TIME_MS {
        time_ms as f64
    } else {
        MIN_TIME_MS as f64
    };
    (-1.0 / (sample_rate * time_ms * 0.001)).exp()
}

/// Attack/release coefficients for one block
///
/// Double precision: an `f32` release step stalls a few ulps below 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Smoother {
    attack_coeff: f64,
    release_coeff: f64,
}

impl Smoother {
    pub fn new(sample_rate: f64, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            attack_coeff: smoothing_coeff(sample_rate, attack_ms),
            release_coeff: smoothing_coeff(sample_rate, release_ms),
        }
    }

    pub fn attack_coeff(&self) -> f64 {
        self.attack_coeff
    }

    pub fn release_coeff(&self) -> f64 {
        self.release_coeff
    }

    /// Coefficient selected for a step from `env` toward `target`
    #[inline]
    pub fn coeff_for(&self, target: f64, env: f64) -> f64 {
        if target < env {
            self.attack_coeff
        } else {
            self.release_coeff
        }
    }

    /// Move `env` one sample toward `target`.
    ///
    /// A target strictly below the envelope asks for more reduction and uses
    /// the attack coefficient; equality and recovery use release.
    #[inline]
    pub fn next(&self, target: f64, env: f64) -> f64 {
        let coeff = self.coeff_for(target, env);
        let next = coeff * env + (1.0 - coeff) * target;

        if next.is_finite() {
            next.clamp(ENV_FLOOR, 1.0)
        } else {
            1.0
        }
    }
}
