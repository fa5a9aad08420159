use crate::types::AudioBuffer;
use dynacomp_core::ControlParams;

/// Trait for in-place block processors driven by a host callback
///
/// Lifecycle: `prepare` before the first block and after every sample-rate
/// or channel-count change, `process_block` once per callback on the audio
/// thread, `release` when playback stops. The host serializes `prepare` and
/// `release` with respect to processing.
pub trait AudioProcessor: Send {
    /// Get the name of this processor implementation
    fn name(&self) -> &'static str;

    /// Whether an input/output channel pairing can be processed
    fn supports_layout(&self, input_channels: usize, output_channels: usize) -> bool;

    /// Allocate and reset per-channel state for a stream format
    fn prepare(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize);

    /// Process one block in place with a parameter snapshot taken for this block.
    ///
    /// Must not block, allocate or log.
    fn process_block(&mut self, buffer: &mut AudioBuffer, params: &ControlParams);

    /// Drop transient resources once playback stops
    fn release(&mut self);

    /// Seconds of output produced after the input falls silent
    fn tail_length_seconds(&self) -> f64 {
        0.0
    }
}
