//! Gain computer - static hard-knee compression curve
//!
//! Maps one input sample to the linear gain that would bring its level onto
//! the compression curve. Feed-forward and instantaneous: the target depends
//! only on the current sample, never on the envelope.

/// Added to `|x|` before taking the logarithm so silence stays finite
pub const DETECTOR_EPSILON: f32 = 1e-6;

/// Convert linear gain to dB
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.log10()
}

/// Convert dB to linear gain
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Level of a sample in dB, biased by `DETECTOR_EPSILON`
#[inline]
pub fn detector_level_db(sample: f32) -> f32 {
    gain_to_db(sample.abs() + DETECTOR_EPSILON)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainComputer {
    threshold_db: f32,
    ratio: f32,
}

impl GainComputer {
    pub fn new(threshold_db: f32, ratio: f32) -> Self {
        Self { threshold_db, ratio }
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Gain change in dB for an input level (always <= 0)
    #[inline]
    pub fn gain_db(&self, level_db: f32) -> f32 {
        let over = level_db - self.threshold_db;
        if over > 0.0 {
            let compressed_db = self.threshold_db + over / self.ratio;
            compressed_db - level_db
        } else {
            0.0
        }
    }

    /// Target linear gain for one sample.
    ///
    /// Returns exactly 1.0 at or below the threshold and for non-finite input.
    #[inline]
    pub fn target_gain(&self, sample: f32) -> f32 {
        let db = detector_level_db(sample);
        let over = db - self.threshold_db;
        if over > 0.0 && db.is_finite() {
            let compressed_db = self.threshold_db + over / self.ratio;
            db_to_gain(compressed_db - db)
        } else {
            1.0
        }
    }
}
