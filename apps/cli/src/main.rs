mod wav;

use anyhow::{Context, Result};
use clap::Parser;
use dynacomp_core::{EngineSettings, ParamId, ParameterSource, ParameterStore};
use dynacomp_engine::{
    deinterleave, interleave, peak_dbfs, rms_dbfs, AudioBuffer, Compressor, ProcessConfig,
    ProcessingSession,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wav::WavData;

/// Feed-forward dynamic range compressor for WAV files
#[derive(Parser, Debug)]
#[command(name = "dynacomp", version, about)]
struct Args {
    /// Input WAV file
    #[arg(required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// Output WAV file (written as 32-bit float)
    #[arg(required_unless_present = "print_config")]
    output: Option<PathBuf>,

    /// Settings file; defaults to the platform config location when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Threshold in dB (-60 to 0)
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f32>,

    /// Compression ratio (1 to 20)
    #[arg(long)]
    ratio: Option<f32>,

    /// Attack time in ms (0.1 to 100)
    #[arg(long)]
    attack: Option<f32>,

    /// Release time in ms (10 to 500)
    #[arg(long)]
    release: Option<f32>,

    /// Makeup gain in dB (0 to 24)
    #[arg(long, allow_negative_numbers = true)]
    makeup: Option<f32>,

    /// Frames per processing block
    #[arg(long)]
    block_size: Option<usize>,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    /// Parameter overrides paired with the flag that sets them
    fn overrides(&self) -> [(ParamId, &'static str, Option<f32>); 5] {
        [
            (ParamId::Threshold, "--threshold", self.threshold),
            (ParamId::Ratio, "--ratio", self.ratio),
            (ParamId::Attack, "--attack", self.attack),
            (ParamId::Release, "--release", self.release),
            (ParamId::MakeupGain, "--makeup", self.makeup),
        ]
    }
}

/// Whole-file level accumulator
#[derive(Debug, Default, Clone, Copy)]
struct LevelMeter {
    peak_db: Option<f32>,
    sum_power: f64,
    count: usize,
}

impl LevelMeter {
    fn add(&mut self, buffer: &AudioBuffer) {
        let count = buffer.num_channels() * buffer.num_samples();
        if count == 0 {
            return;
        }

        let peak = peak_dbfs(buffer);
        self.peak_db = Some(self.peak_db.map_or(peak, |p| p.max(peak)));

        let rms = rms_dbfs(buffer);
        if rms.is_finite() {
            self.sum_power += 10f64.powf(rms as f64 / 10.0) * count as f64;
        }
        self.count += count;
    }

    fn peak_dbfs(&self) -> f32 {
        self.peak_db.unwrap_or(f32::NEG_INFINITY)
    }

    fn rms_dbfs(&self) -> f32 {
        if self.count == 0 || self.sum_power <= 0.0 {
            return f32::NEG_INFINITY;
        }
        (10.0 * (self.sum_power / self.count as f64).log10()) as f32
    }
}

/// Outcome of running a whole file through a session
#[derive(Debug)]
struct RenderReport {
    samples: Vec<f32>,
    input: LevelMeter,
    output: LevelMeter,
    max_gain_reduction_db: f32,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dynacomp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    let store = Arc::new(ParameterStore::from_params(&settings.params));
    apply_overrides(&args, &mut settings, &store)?;

    if args.print_config {
        print!("{}", settings.to_toml_string()?);
        return Ok(());
    }

    let (Some(input_path), Some(output_path)) = (args.input.as_deref(), args.output.as_deref())
    else {
        anyhow::bail!("Both an input and an output file are required");
    };

    tracing::info!("Starting dynacomp: {}", input_path.display());

    let input = wav::read_wav(input_path)?;
    if input.sample_rate != settings.sample_rate || input.channels != settings.channels {
        tracing::debug!(
            "Using file format {} Hz / {} ch instead of configured {} Hz / {} ch",
            input.sample_rate,
            input.channels,
            settings.sample_rate,
            settings.channels
        );
    }
    settings.sample_rate = input.sample_rate;
    settings.channels = input.channels;

    let mut session = ProcessingSession::new(Compressor::new(), store.clone());
    session
        .prepare(ProcessConfig::from(&settings))
        .with_context(|| format!("Cannot process {}", input_path.display()))?;

    let report = render(&mut session, &input.samples)?;
    session.release();

    wav::write_wav(
        output_path,
        &WavData {
            samples: report.samples,
            channels: input.channels,
            sample_rate: input.sample_rate,
        },
    )?;

    tracing::info!(
        "Processed {:.2} s of audio into {}",
        input.duration_secs(),
        output_path.display()
    );
    tracing::info!(
        "Input:  peak {:.2} dBFS, RMS {:.2} dBFS",
        report.input.peak_dbfs(),
        report.input.rms_dbfs()
    );
    tracing::info!(
        "Output: peak {:.2} dBFS, RMS {:.2} dBFS",
        report.output.peak_dbfs(),
        report.output.rms_dbfs()
    );
    tracing::info!("Max gain reduction: {:.2} dB", report.max_gain_reduction_db);

    Ok(())
}

/// Load settings from an explicit path, else from the default location if it exists
fn load_settings(path: Option<&Path>) -> Result<EngineSettings> {
    if let Some(path) = path {
        return EngineSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()));
    }

    match EngineSettings::default_path() {
        Ok(path) if path.exists() => {
            tracing::info!("Settings path: {}", path.display());
            EngineSettings::load(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))
        }
        _ => Ok(EngineSettings::default()),
    }
}

/// Apply command-line parameter overrides; values outside the documented
/// range are rejected rather than clamped
fn apply_overrides(
    args: &Args,
    settings: &mut EngineSettings,
    store: &ParameterStore,
) -> Result<()> {
    for (id, flag, value) in args.overrides() {
        if let Some(value) = value {
            let value = id
                .spec()
                .validate(value)
                .with_context(|| format!("Invalid {flag} value"))?;
            store.set(id, value);
        }
    }
    settings.params = store.snapshot();

    if let Some(block_size) = args.block_size {
        settings.max_block_size = block_size;
    }
    settings.normalize()?;
    Ok(())
}

/// Run interleaved frames through a prepared session one block at a time
fn render(session: &mut ProcessingSession<Compressor>, frames: &[f32]) -> Result<RenderReport> {
    let config = *session
        .config()
        .context("Session must be prepared before rendering")?;

    let mut block = AudioBuffer::new(config.channels, config.max_block_size);
    let mut interleaved = Vec::with_capacity(config.channels * config.max_block_size);
    let mut report = RenderReport {
        samples: Vec::with_capacity(frames.len()),
        input: LevelMeter::default(),
        output: LevelMeter::default(),
        max_gain_reduction_db: 0.0,
    };

    for chunk in frames.chunks(config.channels * config.max_block_size) {
        deinterleave(chunk, config.channels, &mut block)?;
        report.input.add(&block);

        session.process(&mut block)?;

        report.output.add(&block);
        report.max_gain_reduction_db = report
            .max_gain_reduction_db
            .max(session.processor().max_gain_reduction_db());

        interleave(&block, &mut interleaved);
        report.samples.extend_from_slice(&interleaved);
    }

    tracing::debug!(
        "Rendered {} block(s), {} frame(s)",
        session.stats().blocks_processed,
        session.stats().frames_processed
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynacomp_core::{ConfigError, ControlParams};

    fn prepared_session(
        params: ControlParams,
        channels: usize,
        block: usize,
    ) -> ProcessingSession<Compressor> {
        let mut session = ProcessingSession::new(Compressor::new(), Arc::new(params));
        session
            .prepare(ProcessConfig::new(48000.0, block, channels))
            .unwrap();
        session
    }

    #[test]
    fn test_parse_negative_threshold() {
        let args = Args::try_parse_from([
            "dynacomp",
            "in.wav",
            "out.wav",
            "--threshold",
            "-30",
            "--ratio",
            "6",
            "--block-size",
            "256",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("in.wav")));
        assert_eq!(args.threshold, Some(-30.0));
        assert_eq!(args.ratio, Some(6.0));
        assert_eq!(args.block_size, Some(256));
        assert!(!args.print_config);
    }

    #[test]
    fn test_files_required_unless_printing_config() {
        assert!(Args::try_parse_from(["dynacomp", "in.wav"]).is_err());
        assert!(Args::try_parse_from(["dynacomp", "--print-config"]).is_ok());
    }

    #[test]
    fn test_overrides_are_applied() {
        let args = Args::try_parse_from([
            "dynacomp",
            "--print-config",
            "--ratio",
            "8",
            "--attack",
            "2",
            "--makeup",
            "6",
        ])
        .unwrap();
        let mut settings = EngineSettings::default();
        let store = ParameterStore::from_params(&settings.params);

        apply_overrides(&args, &mut settings, &store).unwrap();

        assert_eq!(settings.params.ratio, 8.0);
        assert_eq!(settings.params.attack_ms, 2.0);
        assert_eq!(settings.params.makeup_db, 6.0);
        assert_eq!(store.get(ParamId::Ratio), 8.0);
    }

    #[test]
    fn test_out_of_range_override_is_rejected() {
        let args =
            Args::try_parse_from(["dynacomp", "--print-config", "--ratio", "50"]).unwrap();
        let mut settings = EngineSettings::default();
        let store = ParameterStore::from_params(&settings.params);

        let err = apply_overrides(&args, &mut settings, &store).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::OutOfRange { id: ParamId::Ratio, .. })
        ));
        assert!(err.to_string().contains("--ratio"));

        // Nothing was written
        assert_eq!(store.get(ParamId::Ratio), 2.0);
        assert_eq!(settings.params, ControlParams::default());
    }

    #[test]
    fn test_rejection_names_the_flag() {
        let args =
            Args::try_parse_from(["dynacomp", "--print-config", "--makeup", "30"]).unwrap();
        let mut settings = EngineSettings::default();
        let store = ParameterStore::new();

        let err = apply_overrides(&args, &mut settings, &store).unwrap_err();
        assert!(err.to_string().contains("--makeup"), "{err}");
    }

    #[test]
    fn test_non_finite_override_is_rejected() {
        let args =
            Args::try_parse_from(["dynacomp", "--print-config", "--threshold", "NaN"]).unwrap();
        let mut settings = EngineSettings::default();
        let store = ParameterStore::new();

        let err = apply_overrides(&args, &mut settings, &store).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotFinite { id: ParamId::Threshold })
        ));
    }

    #[test]
    fn test_zero_block_size_is_rejected() {
        let args =
            Args::try_parse_from(["dynacomp", "--print-config", "--block-size", "0"]).unwrap();
        let mut settings = EngineSettings::default();
        let store = ParameterStore::new();

        assert!(apply_overrides(&args, &mut settings, &store).is_err());
    }

    #[test]
    fn test_render_preserves_length_and_reduces_peak() {
        let params = ControlParams::new(-20.0, 4.0, 1.0, 50.0, 0.0);
        let mut session = prepared_session(params, 2, 100);

        // 1001 stereo frames so the last block is short
        let frames: Vec<f32> = (0..1001)
            .flat_map(|i| {
                let s = (i as f32 * 0.07).sin() * 0.9;
                [s, -s]
            })
            .collect();

        let report = render(&mut session, &frames).unwrap();

        assert_eq!(report.samples.len(), frames.len());
        assert_eq!(session.stats().blocks_processed, 11);
        assert!(report.output.peak_dbfs() < report.input.peak_dbfs());
        assert!(report.output.rms_dbfs() < report.input.rms_dbfs());
        assert!(report.max_gain_reduction_db > 5.0);
    }

    #[test]
    fn test_render_below_threshold_is_transparent() {
        let params = ControlParams::new(-6.0, 4.0, 10.0, 100.0, 0.0);
        let mut session = prepared_session(params, 1, 64);

        let frames: Vec<f32> = (0..500).map(|i| (i as f32 * 0.1).sin() * 0.1).collect();
        let report = render(&mut session, &frames).unwrap();

        assert_eq!(report.samples, frames);
        assert_eq!(report.max_gain_reduction_db, 0.0);
        assert!((report.input.rms_dbfs() - report.output.rms_dbfs()).abs() < 1e-4);
    }

    #[test]
    fn test_render_requires_prepared_session() {
        let mut session =
            ProcessingSession::new(Compressor::new(), Arc::new(ControlParams::default()));
        assert!(render(&mut session, &[0.0; 4]).is_err());
    }

    #[test]
    fn test_level_meter_of_silence() {
        let mut meter = LevelMeter::default();
        meter.add(&AudioBuffer::new(2, 32));

        assert_eq!(meter.peak_dbfs(), f32::NEG_INFINITY);
        assert_eq!(meter.rms_dbfs(), f32::NEG_INFINITY);
    }
}
