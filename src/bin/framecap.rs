use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use framecap::{
    CodecDescriptor, CodecList, DefaultEncoderFactory, FfmpegDecodeService, OutputArtifact,
    PipelineConfig, PipelineOrchestrator, SourceInput, SyntheticDecodeService,
};

#[derive(Parser, Debug)]
#[command(name = "framecap", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resample one video to a target width and frame rate.
    Compress(CompressArgs),
    /// Write periodic PNG snapshots of one video.
    Extract(ExtractArgs),
    /// Concatenate several videos into one.
    Merge(MergeArgs),
    /// Print source metadata as JSON.
    Probe(ProbeArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON config with optional `capture` and `pipeline` sections.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How input bytes are decoded.
    #[arg(long, value_enum, default_value_t = DecoderChoice::Ffmpeg)]
    decoder: DecoderChoice,

    /// Output width (clamped to the source width).
    #[arg(long)]
    width: Option<u32>,

    /// Codec to try, in order (`vp9`, `vp8`, `h264`, `y4m`, or `name/container`). Repeatable.
    #[arg(long = "codec")]
    codecs: Vec<CodecDescriptor>,

    /// Per-seek timeout in milliseconds.
    #[arg(long)]
    seek_timeout_ms: Option<u64>,
}

#[derive(Parser, Debug)]
struct CompressArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file (default: suggested name in the current directory).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output frame rate.
    #[arg(long)]
    fps: Option<f64>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the PNGs are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Seconds between snapshots.
    #[arg(long)]
    interval: Option<f64>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct MergeArgs {
    /// Input videos, in playback order.
    #[arg(long = "in", required = true, num_args = 1..)]
    in_paths: Vec<PathBuf>,

    /// Output file (default: suggested name in the current directory).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output frame rate.
    #[arg(long)]
    fps: Option<f64>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// How input bytes are decoded.
    #[arg(long, value_enum, default_value_t = DecoderChoice::Ffmpeg)]
    decoder: DecoderChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecoderChoice {
    /// `ffprobe`/`ffmpeg` (build with feature `media-ffmpeg`).
    Ffmpeg,
    /// JSON test-pattern descriptions.
    Synthetic,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Compress(args) => cmd_compress(args),
        Command::Extract(args) => cmd_extract(args),
        Command::Merge(args) => cmd_merge(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(common: &CommonArgs) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match &common.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(width) = common.width {
        cfg.capture.target_width = width;
    }
    if !common.codecs.is_empty() {
        cfg.capture.codecs = CodecList::new(common.codecs.clone())?;
    }
    if let Some(ms) = common.seek_timeout_ms {
        cfg.pipeline.seek_timeout = Duration::from_millis(ms);
    }
    Ok(cfg)
}

fn make_orchestrator(
    decoder: DecoderChoice,
    cfg: &PipelineConfig,
) -> anyhow::Result<PipelineOrchestrator> {
    let encoders = DefaultEncoderFactory::default();
    let orch = match decoder {
        DecoderChoice::Ffmpeg => {
            PipelineOrchestrator::new(FfmpegDecodeService::default(), encoders, cfg.pipeline)?
        }
        DecoderChoice::Synthetic => {
            PipelineOrchestrator::new(SyntheticDecodeService, encoders, cfg.pipeline)?
        }
    };
    Ok(orch)
}

fn read_input(path: &Path) -> anyhow::Result<SourceInput> {
    Ok(SourceInput::from_path(path)?)
}

fn write_artifact(artifact: &OutputArtifact, out: Option<PathBuf>) -> anyhow::Result<()> {
    let out = out.unwrap_or_else(|| PathBuf::from(&artifact.suggested_name));
    framecap::ensure_parent_dir(&out)?;
    std::fs::write(&out, &artifact.bytes)
        .with_context(|| format!("write output '{}'", out.display()))?;
    eprintln!(
        "wrote {} ({}, {}x{}, {} frames, {:.3}s, {} bytes)",
        out.display(),
        artifact.codec,
        artifact.width,
        artifact.height,
        artifact.frame_count,
        artifact.duration_secs,
        artifact.bytes.len()
    );
    Ok(())
}

fn cmd_compress(args: CompressArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.common)?;
    if let Some(fps) = args.fps {
        cfg.capture.frame_rate = fps;
    }
    let input = read_input(&args.in_path)?;
    let mut orch = make_orchestrator(args.common.decoder, &cfg)?;
    let artifact = orch.compress(&input, &cfg.capture)?;
    write_artifact(&artifact, args.out)
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.common)?;
    if let Some(interval) = args.interval {
        cfg.capture.sampling_interval_secs = interval;
    }
    let input = read_input(&args.in_path)?;
    let mut orch = make_orchestrator(args.common.decoder, &cfg)?;
    let samples = orch.extract_frames(&input, &cfg.capture)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    for (i, sample) in samples.iter().enumerate() {
        let path = args.out_dir.join(sample.file_name(input.stem(), i));
        std::fs::write(&path, &sample.image_bytes)
            .with_context(|| format!("write png '{}'", path.display()))?;
    }
    eprintln!(
        "wrote {} frames to {}",
        samples.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.common)?;
    if let Some(fps) = args.fps {
        cfg.capture.frame_rate = fps;
    }
    let inputs = args
        .in_paths
        .iter()
        .map(|p| read_input(p))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let mut orch = make_orchestrator(args.common.decoder, &cfg)?;
    let artifact = orch.merge(&inputs, &cfg.capture)?;
    write_artifact(&artifact, args.out)
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let cfg = PipelineConfig::default();
    let input = read_input(&args.in_path)?;
    let orch = make_orchestrator(args.decoder, &cfg)?;
    let descriptor = orch.probe(&input)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&descriptor).context("serialize metadata")?
    );
    Ok(())
}
