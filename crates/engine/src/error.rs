/// Errors reported by the processing session on the control path.
///
/// The per-sample path never returns errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    #[error("Invalid maximum block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Unsupported channel layout: {input} in / {output} out")]
    UnsupportedLayout { input: usize, output: usize },

    #[error("Processor has not been prepared")]
    NotPrepared,

    #[error("Buffer has {found} channels, processor was prepared for {expected}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("Block of {found} samples exceeds the prepared maximum of {max}")]
    BlockTooLarge { max: usize, found: usize },

    #[error("Channel {channel} has {found} samples, expected {expected}")]
    RaggedBuffer {
        channel: usize,
        expected: usize,
        found: usize,
    },
}
