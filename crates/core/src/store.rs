//! Lock-free parameter store shared between the control and audio threads
//!
//! Each parameter is an independent `AtomicU32` holding `f32` bits. Writers
//! (UI, automation, CLI) clamp into the documented range; the audio thread
//! takes one snapshot per block. There is no cross-parameter consistency:
//! a snapshot may combine a threshold and a ratio written at different
//! instants.
use crate::models::{ControlParams, ParamId};
use crate::traits::ParameterSource;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug)]
pub struct ParameterStore {
    values: [AtomicU32; 5],
}

impl ParameterStore {
    /// Create a store holding the default value of every parameter
    pub fn new() -> Self {
        Self::from_params(&ControlParams::default())
    }

    /// Create a store seeded from a snapshot (values are clamped)
    pub fn from_params(params: &ControlParams) -> Self {
        let store = Self {
            values: std::array::from_fn(|_| AtomicU32::new(0)),
        };
        store.set_all(params);
        store
    }

    /// Set a parameter, clamping it into its documented range.
    ///
    /// Returns the value actually stored.
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let spec = id.spec();
        let clamped = spec.clamp(value);
        if clamped != value {
            tracing::warn!(
                "{} = {} is outside [{}, {}], clamped to {}",
                id,
                value,
                spec.min,
                spec.max,
                clamped
            );
        }
        self.values[id as usize].store(clamped.to_bits(), Ordering::Relaxed);
        clamped
    }

    /// Store a raw value without range enforcement.
    ///
    /// Only meant for hosts that validate elsewhere; the engine still guards
    /// against degenerate values.
    pub fn set_unchecked(&self, id: ParamId, value: f32) {
        self.values[id as usize].store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id as usize].load(Ordering::Relaxed))
    }

    /// Set every parameter from a snapshot
    pub fn set_all(&self, params: &ControlParams) {
        for id in ParamId::ALL {
            self.set(id, params.get(id));
        }
    }

    /// Reset every parameter to its default
    pub fn reset(&self) {
        self.set_all(&ControlParams::default());
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSource for ParameterStore {
    fn snapshot(&self) -> ControlParams {
        ControlParams {
            threshold_db: self.get(ParamId::Threshold),
            ratio: self.get(ParamId::Ratio),
            attack_ms: self.get(ParamId::Attack),
            release_ms: self.get(ParamId::Release),
            makeup_db: self.get(ParamId::MakeupGain),
        }
    }
}
