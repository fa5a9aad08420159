use crate::error::EngineError;
use crate::processor::AudioProcessor;
use crate::types::{AudioBuffer, ProcessConfig};
use dynacomp_core::{ControlParams, ParameterSource};
use std::sync::Arc;

/// Statistics for monitoring a processing session
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionStats {
    /// Blocks handed to the processor
    pub blocks_processed: u64,
    /// Frames (samples per channel) handed to the processor
    pub frames_processed: u64,
    /// Blocks refused because of a format mismatch
    pub blocks_rejected: u64,
    /// Parameter snapshot used for the most recent block
    pub last_params: Option<ControlParams>,
}

/// Host-side driver: binds a processor to a parameter source and a stream format
///
/// Validates the format on `prepare`, then takes exactly one parameter
/// snapshot per `process` call and hands it to the processor with the block.
pub struct ProcessingSession<P: AudioProcessor> {
    processor: P,
    source: Arc<dyn ParameterSource>,
    config: Option<ProcessConfig>,
    stats: SessionStats,
}

impl<P: AudioProcessor> ProcessingSession<P> {
    /// Create an unprepared session
    pub fn new(processor: P, source: Arc<dyn ParameterSource>) -> Self {
        Self {
            processor,
            source,
            config: None,
            stats: SessionStats::default(),
        }
    }

    /// Validate a stream format and (re)prepare the processor for it.
    ///
    /// Resets the per-channel state and the statistics.
    pub fn prepare(&mut self, config: ProcessConfig) -> Result<(), EngineError> {
        config.validate()?;

        if !self.processor.supports_layout(config.channels, config.channels) {
            return Err(EngineError::UnsupportedLayout {
                input: config.channels,
                output: config.channels,
            });
        }

        if let Some(previous) = self.config {
            tracing::debug!(
                "Reconfiguring {}: {} Hz / {} ch -> {} Hz / {} ch",
                self.processor.name(),
                previous.sample_rate,
                previous.channels,
                config.sample_rate,
                config.channels
            );
        }

        self.processor
            .prepare(config.sample_rate, config.max_block_size, config.channels);
        self.config = Some(config);
        self.stats = SessionStats::default();

        tracing::info!(
            "Session ready: {} at {} Hz, {} channel(s), max block {}",
            self.processor.name(),
            config.sample_rate,
            config.channels,
            config.max_block_size
        );

        Ok(())
    }

    /// Process one block in place with a fresh parameter snapshot
    pub fn process(&mut self, buffer: &mut AudioBuffer) -> Result<(), EngineError> {
        let config = self.config.ok_or(EngineError::NotPrepared)?;

        if buffer.num_channels() != config.channels {
            self.stats.blocks_rejected += 1;
            tracing::warn!(
                "Rejected block with {} channel(s), prepared for {}",
                buffer.num_channels(),
                config.channels
            );
            return Err(EngineError::ChannelMismatch {
                expected: config.channels,
                found: buffer.num_channels(),
            });
        }
        if buffer.num_samples() > config.max_block_size {
            self.stats.blocks_rejected += 1;
            tracing::warn!(
                "Rejected block of {} frames, max block is {}",
                buffer.num_samples(),
                config.max_block_size
            );
            return Err(EngineError::BlockTooLarge {
                max: config.max_block_size,
                found: buffer.num_samples(),
            });
        }

        let params = self.source.snapshot();
        self.processor.process_block(buffer, &params);

        self.stats.blocks_processed += 1;
        self.stats.frames_processed += buffer.num_samples() as u64;
        self.stats.last_params = Some(params);

        Ok(())
    }

    /// Stop processing and let the processor drop transient resources
    pub fn release(&mut self) {
        if self.config.take().is_some() {
            self.processor.release();
            tracing::info!(
                "Session released after {} block(s), {} frame(s)",
                self.stats.blocks_processed,
                self.stats.frames_processed
            );
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.config.is_some()
    }

    pub fn config(&self) -> Option<&ProcessConfig> {
        self.config.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    pub fn source(&self) -> &Arc<dyn ParameterSource> {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::Compressor;
    use dynacomp_core::{ParamId, ParameterStore};

    fn session_with_store() -> (ProcessingSession<Compressor>, Arc<ParameterStore>) {
        let store = Arc::new(ParameterStore::new());
        let session = ProcessingSession::new(Compressor::new(), store.clone());
        (session, store)
    }

    #[test]
    fn test_process_before_prepare_fails() {
        let (mut session, _) = session_with_store();
        let mut buffer = AudioBuffer::new(2, 64);
        assert_eq!(session.process(&mut buffer), Err(EngineError::NotPrepared));
        assert!(!session.is_prepared());
    }

    #[test]
    fn test_prepare_validates_format() {
        let (mut session, _) = session_with_store();

        assert_eq!(
            session.prepare(ProcessConfig::new(0.0, 512, 2)),
            Err(EngineError::InvalidSampleRate(0.0))
        );
        assert_eq!(
            session.prepare(ProcessConfig::new(48000.0, 512, 6)),
            Err(EngineError::UnsupportedLayout {
                input: 6,
                output: 6
            })
        );
        assert!(!session.is_prepared());

        session.prepare(ProcessConfig::new(48000.0, 512, 1)).unwrap();
        assert!(session.is_prepared());
        assert_eq!(session.processor().num_channels(), 1);
    }

    #[test]
    fn test_process_reads_one_snapshot_per_block() {
        let (mut session, store) = session_with_store();
        session.prepare(ProcessConfig::new(48000.0, 64, 2)).unwrap();

        store.set(ParamId::Ratio, 8.0);
        let mut buffer = AudioBuffer::new(2, 64);
        session.process(&mut buffer).unwrap();

        let stats = session.stats();
        assert_eq!(stats.blocks_processed, 1);
        assert_eq!(stats.frames_processed, 64);
        assert_eq!(stats.last_params.unwrap().ratio, 8.0);

        store.set(ParamId::Ratio, 2.0);
        session.process(&mut buffer).unwrap();
        assert_eq!(session.stats().last_params.unwrap().ratio, 2.0);
    }

    #[test]
    fn test_mismatched_blocks_are_rejected() {
        let (mut session, _) = session_with_store();
        session.prepare(ProcessConfig::new(48000.0, 64, 2)).unwrap();

        let mut mono = AudioBuffer::new(1, 64);
        assert_eq!(
            session.process(&mut mono),
            Err(EngineError::ChannelMismatch {
                expected: 2,
                found: 1
            })
        );

        let mut oversized = AudioBuffer::new(2, 65);
        assert_eq!(
            session.process(&mut oversized),
            Err(EngineError::BlockTooLarge { max: 64, found: 65 })
        );

        assert_eq!(session.stats().blocks_rejected, 2);
        assert_eq!(session.stats().blocks_processed, 0);
    }

    #[test]
    fn test_variable_block_sizes_are_accepted() {
        let (mut session, _) = session_with_store();
        session.prepare(ProcessConfig::new(48000.0, 64, 2)).unwrap();

        let mut buffer = AudioBuffer::new(2, 64);
        for len in [64, 17, 1, 0, 33] {
            buffer.set_num_samples(len).unwrap();
            session.process(&mut buffer).unwrap();
        }
        assert_eq!(session.stats().frames_processed, 64 + 17 + 1 + 33);
    }

    #[test]
    fn test_reprepare_resets_state_and_stats() {
        let (mut session, store) = session_with_store();
        store.set(ParamId::Attack, 0.1);
        session.prepare(ProcessConfig::new(48000.0, 256, 2)).unwrap();

        let mut buffer = AudioBuffer::from_channels(vec![vec![1.0; 256]; 2]).unwrap();
        session.process(&mut buffer).unwrap();
        assert!(session.processor().envelope(0).unwrap() < 1.0);

        session.prepare(ProcessConfig::new(96000.0, 256, 1)).unwrap();
        assert_eq!(session.processor().envelopes(), &[1.0]);
        assert_eq!(session.stats(), &SessionStats::default());
        assert_eq!(session.config().unwrap().sample_rate, 96000.0);
    }

    #[test]
    fn test_release() {
        let (mut session, _) = session_with_store();
        session.prepare(ProcessConfig::default()).unwrap();
        session.release();

        assert!(!session.is_prepared());
        assert!(!session.processor().is_prepared());

        let mut buffer = AudioBuffer::new(2, 16);
        assert_eq!(session.process(&mut buffer), Err(EngineError::NotPrepared));

        // Releasing twice is harmless
        session.release();
    }

    #[test]
    fn test_fixed_params_as_source() {
        let params = ControlParams::new(-12.0, 4.0, 5.0, 50.0, 0.0);
        let mut session = ProcessingSession::new(Compressor::new(), Arc::new(params));
        session.prepare(ProcessConfig::new(44100.0, 32, 1)).unwrap();

        let mut buffer = AudioBuffer::new(1, 32);
        session.process(&mut buffer).unwrap();
        assert_eq!(session.stats().last_params, Some(params));
        assert_eq!(session.source().snapshot(), params);
    }
}
