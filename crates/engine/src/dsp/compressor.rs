//! Compressor - feed-forward dynamic range compression with per-channel envelopes
//!
//! Each channel has its own gain envelope, seeded to unity by `prepare` and
//! carried across blocks for the whole session. Per block the five control
//! parameters are read once; per sample the gain computer produces a target
//! gain, the smoother moves the channel envelope toward it, and the sample is
//! scaled by the envelope and the makeup gain. Non-finite input samples are
//! muted and leave the envelope where it was.
use super::envelope::Smoother;
use super::gain::{gain_to_db, GainComputer};
use crate::processor::AudioProcessor;
use crate::types::{AudioBuffer, ChannelLayout};
use dynacomp_core::ControlParams;

#[derive(Debug, Clone)]
pub struct Compressor {
    sample_rate: f64,
    max_block_size: usize,
    /// Smoothed linear gain per channel, in (0, 1]
    envelopes: Vec<f64>,
    prepared: bool,
}

impl Compressor {
    /// Create an unprepared compressor; it passes audio through untouched
    /// until `prepare` sets the channel count.
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            max_block_size: 0,
            envelopes: Vec::new(),
            prepared: false,
        }
    }

    /// Size the envelope array to `num_channels` and seed every entry to 1.0
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize) {
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.envelopes.clear();
        self.envelopes.resize(num_channels, 1.0);
        self.prepared = true;

        tracing::info!(
            "Compressor prepared: {} Hz, {} channel(s), max block {}",
            sample_rate,
            num_channels,
            max_block_size
        );
    }

    /// Drop the envelope state; processing is a passthrough until the next `prepare`
    pub fn release(&mut self) {
        self.envelopes = Vec::new();
        self.prepared = false;
        tracing::debug!("Compressor released");
    }

    /// Reseed every envelope to unity without changing the channel count
    pub fn reset(&mut self) {
        self.envelopes.fill(1.0);
    }

    /// Only mono or stereo, with matching input and output
    pub fn supports_layout(input_channels: usize, output_channels: usize) -> bool {
        input_channels == output_channels
            && ChannelLayout::from_channel_count(output_channels).is_some()
    }

    /// Process a block in place.
    ///
    /// Channels beyond the prepared count are left untouched.
    pub fn process_block(&mut self, buffer: &mut AudioBuffer, params: &ControlParams) {
        let block = BlockParams::new(self.sample_rate, params);
        let channels = buffer.num_channels().min(self.envelopes.len());

        for ch in 0..channels {
            block.run(buffer.channel_mut(ch), &mut self.envelopes[ch]);
        }
    }

    /// Process a single channel lane in place, for hosts that hold one slice
    /// per channel. Out-of-range channels are left untouched.
    pub fn process_channel(&mut self, ch: usize, samples: &mut [f32], params: &ControlParams) {
        if let Some(env) = self.envelopes.get_mut(ch) {
            BlockParams::new(self.sample_rate, params).run(samples, env);
        }
    }

    /// Current envelope (linear gain) of a channel, as applied to samples
    pub fn envelope(&self, ch: usize) -> Option<f32> {
        self.envelopes.get(ch).map(|&env| env as f32)
    }

    pub fn envelopes(&self) -> &[f64] {
        &self.envelopes
    }

    /// Current gain reduction of a channel in dB (0 means none)
    pub fn gain_reduction_db(&self, ch: usize) -> Option<f32> {
        self.envelope(ch).map(|env| -gain_to_db(env))
    }

    /// Largest gain reduction across channels in dB
    pub fn max_gain_reduction_db(&self) -> f32 {
        self.envelopes
            .iter()
            .map(|&env| -gain_to_db(env as f32))
            .fold(0.0, f32::max)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn num_channels(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioProcessor for Compressor {
    fn name(&self) -> &'static str {
        "compressor"
    }

    fn supports_layout(&self, input_channels: usize, output_channels: usize) -> bool {
        Compressor::supports_layout(input_channels, output_channels)
    }

    fn prepare(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize) {
        Compressor::prepare(self, sample_rate, max_block_size, num_channels);
    }

    fn process_block(&mut self, buffer: &mut AudioBuffer, params: &ControlParams) {
        Compressor::process_block(self, buffer, params);
    }

    fn release(&mut self) {
        Compressor::release(self);
    }
}

/// Everything derived from one parameter snapshot
struct BlockParams {
    computer: GainComputer,
    smoother: Smoother,
    makeup: f32,
}

impl BlockParams {
    fn new(sample_rate: f64, params: &ControlParams) -> Self {
        let params = params.sanitized();
        let makeup = params.makeup_gain_linear();

        Self {
            computer: GainComputer::new(params.threshold_db, params.ratio),
            smoother: Smoother::new(sample_rate, params.attack_ms, params.release_ms),
            makeup: if makeup.is_finite() { makeup } else { 1.0 },
        }
    }

    #[inline]
    fn run(&self, samples: &mut [f32], env: &mut f64) {
        let mut current = *env;
        for sample in samples.iter_mut() {
            let input = *sample;
            if !input.is_finite() {
                *sample = 0.0;
                continue;
            }
            let target = self.computer.target_gain(input) as f64;
            current = self.smoother.next(target, current);
            *sample = input * current as f32 * self.makeup;
        }
        *env = current;
    }
}
