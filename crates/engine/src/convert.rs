use crate::error::EngineError;
use crate::types::AudioBuffer;

/// Split interleaved frames (LRLR...) into a planar buffer.
///
/// The buffer's active length is set to the number of complete frames; a
/// trailing partial frame is ignored. Fails if the frames do not fit in the
/// buffer's capacity or the channel counts differ.
pub fn deinterleave(
    frames: &[f32],
    channels: usize,
    output: &mut AudioBuffer,
) -> Result<(), EngineError> {
    if channels != output.num_channels() {
        return Err(EngineError::ChannelMismatch {
            expected: output.num_channels(),
            found: channels,
        });
    }
    if channels == 0 {
        return output.set_num_samples(0);
    }

    let num_frames = frames.len() / channels;
    output.set_num_samples(num_frames)?;

    for ch in 0..channels {
        let lane = output.channel_mut(ch);
        for (i, sample) in lane.iter_mut().enumerate() {
            *sample = frames[i * channels + ch];
        }
    }

    Ok(())
}

/// Merge a planar buffer back into interleaved frames
pub fn interleave(buffer: &AudioBuffer, output: &mut Vec<f32>) {
    let channels = buffer.num_channels();
    let num_samples = buffer.num_samples();

    output.clear();
    output.reserve(channels * num_samples);

    for i in 0..num_samples {
        for ch in 0..channels {
            output.push(buffer.channel(ch)[i]);
        }
    }
}

/// Calculate peak level of a buffer (in dBFS)
pub fn peak_dbfs(buffer: &AudioBuffer) -> f32 {
    let peak = (0..buffer.num_channels())
        .flat_map(|ch| buffer.channel(ch).iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max);

    if peak > 0.0 {
        20.0 * peak.log10()
    } else {
        f32::NEG_INFINITY
    }
}

/// Calculate RMS level of a buffer across all channels (in dBFS)
pub fn rms_dbfs(buffer: &AudioBuffer) -> f32 {
    let count = buffer.num_channels() * buffer.num_samples();
    if count == 0 {
        return f32::NEG_INFINITY;
    }

    let sum_squares: f64 = (0..buffer.num_channels())
        .flat_map(|ch| buffer.channel(ch).iter())
        .map(|&s| (s as f64) * (s as f64))
        .sum();
    let rms = (sum_squares / count as f64).sqrt();

    if rms > 0.0 {
        (20.0 * rms.log10()) as f32
    } else {
        f32::NEG_INFINITY
    }
}
