/// DSP (Digital Signal Processing) modules
///
/// Contains the real-time dynamics components:
/// - Gain: static hard-knee gain computer and dB helpers
/// - Envelope: one-pole attack/release smoother
/// - Compressor: per-channel driver tying the two together
pub mod compressor;
pub mod envelope;
pub mod gain;

// Re-export commonly used types for convenience
pub use compressor::Compressor;
pub use envelope::{smoothing_coeff, Smoother, ENV_FLOOR};
pub use gain::{db_to_gain, detector_level_db, gain_to_db, GainComputer, DETECTOR_EPSILON};
