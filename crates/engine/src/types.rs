use crate::error::EngineError;
use dynacomp_core::EngineSettings;

/// Planar block of 32-bit float audio, one contiguous lane per channel
///
/// Storage is allocated once for `capacity` samples per channel; hosts with
/// variable block sizes shrink the active length with `set_num_samples`
/// instead of reallocating.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    data: Vec<f32>,
    num_channels: usize,
    num_samples: usize,
    capacity: usize,
}

impl AudioBuffer {
    /// Create a zeroed buffer
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            data: vec![0.0; num_channels * num_samples],
            num_channels,
            num_samples,
            capacity: num_samples,
        }
    }

    /// Build a buffer from per-channel sample vectors
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Result<Self, EngineError> {
        let num_samples = channels.first().map_or(0, Vec::len);
        let mut buffer = Self::new(channels.len(), num_samples);

        for (ch, samples) in channels.iter().enumerate() {
            if samples.len() != num_samples {
                return Err(EngineError::RaggedBuffer {
                    channel: ch,
                    expected: num_samples,
                    found: samples.len(),
                });
            }
            buffer.channel_mut(ch).copy_from_slice(samples);
        }

        Ok(buffer)
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of active samples per channel
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Maximum number of samples per channel without reallocation
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the active length of every channel within the allocated capacity
    pub fn set_num_samples(&mut self, num_samples: usize) -> Result<(), EngineError> {
        if num_samples > self.capacity {
            return Err(EngineError::BlockTooLarge {
                max: self.capacity,
                found: num_samples,
            });
        }
        self.num_samples = num_samples;
        Ok(())
    }

    pub fn channel(&self, ch: usize) -> &[f32] {
        let start = ch * self.capacity;
        &self.data[start..start + self.num_samples]
    }

    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        let start = ch * self.capacity;
        &mut self.data[start..start + self.num_samples]
    }

    /// Zero every active sample
    pub fn clear(&mut self) {
        for ch in 0..self.num_channels {
            self.channel_mut(ch).fill(0.0);
        }
    }

    /// Copy the active samples out as one vector per channel
    pub fn to_channels(&self) -> Vec<Vec<f32>> {
        (0..self.num_channels)
            .map(|ch| self.channel(ch).to_vec())
            .collect()
    }
}

/// Channel sets accepted on the main bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn from_channel_count(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }

    pub fn channel_count(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// Stream format a processor is prepared with
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessConfig {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Largest block the host will deliver
    pub max_block_size: usize,
    /// Number of channels on both input and output
    pub channels: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            max_block_size: 512,
            channels: 2,
        }
    }
}

impl ProcessConfig {
    pub fn new(sample_rate: f64, max_block_size: usize, channels: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            channels,
        }
    }

    /// Check the format before it reaches the audio thread
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(EngineError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 {
            return Err(EngineError::InvalidBlockSize(self.max_block_size));
        }
        Ok(())
    }
}

impl From<&EngineSettings> for ProcessConfig {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            sample_rate: settings.sample_rate as f64,
            max_block_size: settings.max_block_size,
            channels: settings.channels as usize,
        }
    }
}
