use anyhow::{bail, Context, Result};
use std::path::Path;

/// Decoded WAV file: interleaved samples normalized to [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct WavData {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl WavData {
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.num_frames() as f64 / self.sample_rate as f64
        }
    }
}

/// Read a WAV file of any integer depth or 32-bit float
pub fn read_wav(path: &Path) -> Result<WavData> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                bail!("Unsupported bit depth: {}", spec.bits_per_sample);
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    tracing::debug!(
        "Read {}: {} Hz, {} channel(s), {}-bit {:?}, {} samples",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format,
        samples.len()
    );

    Ok(WavData {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Write interleaved samples as a 32-bit float WAV file
pub fn write_wav(path: &Path, data: &WavData) -> Result<()> {
    let spec = hound::WavSpec {
        channels: data.channels,
        sample_rate: data.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in &data.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::debug!("Wrote {} samples to {}", data.samples.len(), path.display());
    Ok(())
}
