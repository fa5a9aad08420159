use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one of the five compressor control parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    #[serde(rename = "threshold")]
    Threshold,
    #[serde(rename = "ratio")]
    Ratio,
    #[serde(rename = "attack")]
    Attack,
    #[serde(rename = "release")]
    Release,
    #[serde(rename = "makeupGain")]
    MakeupGain,
}

impl ParamId {
    pub const ALL: [ParamId; 5] = [
        ParamId::Threshold,
        ParamId::Ratio,
        ParamId::Attack,
        ParamId::Release,
        ParamId::MakeupGain,
    ];

    /// Stable identifier used by hosts and config files
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamId::Threshold => "threshold",
            ParamId::Ratio => "ratio",
            ParamId::Attack => "attack",
            ParamId::Release => "release",
            ParamId::MakeupGain => "makeupGain",
        }
    }

    /// Range, default and display metadata for this parameter
    pub fn spec(&self) -> &'static ParamSpec {
        &PARAMETER_LAYOUT[*self as usize]
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "threshold" => Ok(ParamId::Threshold),
            "ratio" => Ok(ParamId::Ratio),
            "attack" => Ok(ParamId::Attack),
            "release" => Ok(ParamId::Release),
            "makeupgain" | "makeup_gain" | "makeup" => Ok(ParamId::MakeupGain),
            _ => Err(ConfigError::UnknownParameter(s.to_string())),
        }
    }
}

/// Static description of a ranged float parameter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    pub id: ParamId,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub unit: &'static str,
}

impl ParamSpec {
    /// Clamp a value into the documented range. NaN maps to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Strict validation for command-line parameter overrides
    pub fn validate(&self, value: f32) -> Result<f32, ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::NotFinite { id: self.id });
        }
        if !self.contains(value) {
            return Err(ConfigError::OutOfRange {
                id: self.id,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }
}

/// Parameter layout exposed to hosts, indexed by `ParamId as usize`
pub const PARAMETER_LAYOUT: [ParamSpec; 5] = [
    ParamSpec {
        id: ParamId::Threshold,
        name: "Threshold",
        min: -60.0,
        max: 0.0,
        default: -24.0,
        unit: "dB",
    },
    ParamSpec {
        id: ParamId::Ratio,
        name: "Ratio",
        min: 1.0,
        max: 20.0,
        default: 2.0,
        unit: ":1",
    },
    ParamSpec {
        id: ParamId::Attack,
        name: "Attack",
        min: 0.1,
        max: 100.0,
        default: 10.0,
        unit: "ms",
    },
    ParamSpec {
        id: ParamId::Release,
        name: "Release",
        min: 10.0,
        max: 500.0,
        default: 100.0,
        unit: "ms",
    },
    ParamSpec {
        id: ParamId::MakeupGain,
        name: "Makeup Gain",
        min: 0.0,
        max: 24.0,
        default: 0.0,
        unit: "dB",
    },
];

pub fn parameter_layout() -> &'static [ParamSpec; 5] {
    &PARAMETER_LAYOUT
}

/// Lower bound applied to degenerate attack/release times (milliseconds)
pub const MIN_TIME_MS: f32 = 1e-3;

/// A by-value snapshot of the five control parameters, read once per block
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlParams {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub makeup_db: f32,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            threshold_db: ParamId::Threshold.spec().default,
            ratio: ParamId::Ratio.spec().default,
            attack_ms: ParamId::Attack.spec().default,
            release_ms: ParamId::Release.spec().default,
            makeup_db: ParamId::MakeupGain.spec().default,
        }
    }
}

impl ControlParams {
    pub fn new(
        threshold_db: f32,
        ratio: f32,
        attack_ms: f32,
        release_ms: f32,
        makeup_db: f32,
    ) -> Self {
        Self {
            threshold_db,
            ratio,
            attack_ms,
            release_ms,
            makeup_db,
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::Threshold => self.threshold_db,
            ParamId::Ratio => self.ratio,
            ParamId::Attack => self.attack_ms,
            ParamId::Release => self.release_ms,
            ParamId::MakeupGain => self.makeup_db,
        }
    }

    pub fn set(&mut self, id: ParamId, value: f32) {
        match id {
            ParamId::Threshold => self.threshold_db = value,
            ParamId::Ratio => self.ratio = value,
            ParamId::Attack => self.attack_ms = value,
            ParamId::Release => self.release_ms = value,
            ParamId::MakeupGain => self.makeup_db = value,
        }
    }

    /// Clamp every field into its documented range
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for id in ParamId::ALL {
            out.set(id, id.spec().clamp(self.get(id)));
        }
        out
    }

    /// Whether every field lies within its documented range
    pub fn is_in_range(&self) -> bool {
        ParamId::ALL.iter().all(|id| id.spec().contains(self.get(*id)))
    }

    /// Guard against degenerate values without enforcing the host ranges.
    ///
    /// Ratios below 1 (or NaN) become 1, non-positive or non-finite times
    /// become `MIN_TIME_MS`, and a non-finite threshold or makeup falls back
    /// to its default. In-range values pass through bit-for-bit.
    pub fn sanitized(&self) -> Self {
        let threshold_db = if self.threshold_db.is_finite() {
            self.threshold_db
        } else {
            ParamId::Threshold.spec().default
        };
        let ratio = if self.ratio >= 1.0 { self.ratio } else { 1.0 };
        let makeup_db = if self.makeup_db.is_finite() {
            self.makeup_db
        } else {
            ParamId::MakeupGain.spec().default
        };

        Self {
            threshold_db,
            ratio,
            attack_ms: sanitize_time(self.attack_ms),
            release_ms: sanitize_time(self.release_ms),
            makeup_db,
        }
    }

    /// Makeup gain as a linear multiplier
    pub fn makeup_gain_linear(&self) -> f32 {
        10.0_f32.powf(self.makeup_db / 20.0)
    }
}

fn sanitize_time(ms: f32) -> f32 {
    if ms.is_finite() && ms > MIN_TIME_MS {
        ms
    } else if ms == f32::INFINITY {
        f32::MAX
    } else {
        MIN_TIME_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_layout() {
        let params = ControlParams::default();
        assert_eq!(params.threshold_db, -24.0);
        assert_eq!(params.ratio, 2.0);
        assert_eq!(params.attack_ms, 10.0);
        assert_eq!(params.release_ms, 100.0);
        assert_eq!(params.makeup_db, 0.0);
        assert!(params.is_in_range());
    }

    #[test]
    fn test_layout_is_indexed_by_id() {
        for id in ParamId::ALL {
            assert_eq!(id.spec().id, id);
        }
    }

    #[test]
    fn test_param_id_parsing() {
        assert_eq!("threshold".parse::<ParamId>().unwrap(), ParamId::Threshold);
        assert_eq!("Ratio".parse::<ParamId>().unwrap(), ParamId::Ratio);
        assert_eq!("makeupGain".parse::<ParamId>().unwrap(), ParamId::MakeupGain);
        assert_eq!("makeup_gain".parse::<ParamId>().unwrap(), ParamId::MakeupGain);
        assert!(matches!(
            "knee".parse::<ParamId>(),
            Err(ConfigError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_param_id_round_trips_through_as_str() {
        for id in ParamId::ALL {
            assert_eq!(id.as_str().parse::<ParamId>().unwrap(), id);
        }
    }

    #[test]
    fn test_spec_clamp_and_validate() {
        let spec = ParamId::Ratio.spec();
        assert_eq!(spec.clamp(0.5), 1.0);
        assert_eq!(spec.clamp(40.0), 20.0);
        assert_eq!(spec.clamp(f32::NAN), 2.0);

        assert!(spec.validate(4.0).is_ok());
        assert!(matches!(
            spec.validate(0.5),
            Err(ConfigError::OutOfRange { id: ParamId::Ratio, .. })
        ));
        assert!(matches!(
            spec.validate(f32::INFINITY),
            Err(ConfigError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_clamped() {
        let params = ControlParams::new(-90.0, 50.0, 0.0, 1000.0, 30.0).clamped();
        assert_eq!(params, ControlParams::new(-60.0, 20.0, 0.1, 500.0, 24.0));
    }

    #[test]
    fn test_sanitized_keeps_in_range_values() {
        let params = ControlParams::new(-18.5, 3.3, 0.1, 10.0, 6.0);
        assert_eq!(params.sanitized(), params);
    }

    #[test]
    fn test_sanitized_guards_degenerate_values() {
        let params = ControlParams::new(f32::NAN, 0.0, 0.0, -5.0, f32::INFINITY).sanitized();
        assert_eq!(params.threshold_db, -24.0);
        assert_eq!(params.ratio, 1.0);
        assert_eq!(params.attack_ms, MIN_TIME_MS);
        assert_eq!(params.release_ms, MIN_TIME_MS);
        assert_eq!(params.makeup_db, 0.0);

        let nan_ratio = ControlParams::new(-24.0, f32::NAN, f32::NAN, 100.0, 0.0).sanitized();
        assert_eq!(nan_ratio.ratio, 1.0);
        assert_eq!(nan_ratio.attack_ms, MIN_TIME_MS);
    }

    #[test]
    fn test_makeup_gain_linear() {
        let mut params = ControlParams::default();
        assert_eq!(params.makeup_gain_linear(), 1.0);

        params.makeup_db = 6.0;
        assert!((params.makeup_gain_linear() - 1.9953).abs() < 1e-3);
    }
}
