use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use reel::visual::frame::sample_frame_with;

#[derive(Parser, Debug)]
#[command(name = "reel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture the whole scene list into one video file.
    Render(RenderArgs),
    /// Render a single frame of one scene as a PNG.
    Frame(FrameArgs),
    /// Play the scene list headlessly in real time, logging transitions.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Scene manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Engine configuration JSON (defaults apply when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output path. Defaults to the suggested filename in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Caption font (TTF/OTF). Captions are not drawn without one.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Encoder backend.
    #[arg(long, value_enum, default_value_t = EncoderChoice::Mp4)]
    encoder: EncoderChoice,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Scene manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Engine configuration JSON (defaults apply when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene index (0-based).
    #[arg(long)]
    scene: usize,

    /// Seconds into the scene.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Caption font (TTF/OTF).
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Scene manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Engine configuration JSON (defaults apply when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Playback speed multiplier.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncoderChoice {
    /// MP4 through the system `ffmpeg`.
    Mp4,
    /// Deterministic `.reel` container (no external tools).
    Reel,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<reel::ReelConfig> {
    let Some(path) = path else {
        return Ok(reel::ReelConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    Ok(reel::ReelConfig::from_json(&text)?)
}

fn read_scenes(manifest: &Path) -> anyhow::Result<reel::SceneList> {
    let m = reel::SceneManifest::read(manifest)?;
    let root = manifest.parent().unwrap_or_else(|| Path::new("."));
    Ok(m.load(root)?)
}

fn read_font(path: Option<&Path>) -> anyhow::Result<Option<Vec<u8>>> {
    path.map(|p| std::fs::read(p).with_context(|| format!("read font '{}'", p.display())))
        .transpose()
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref())?;
    let scenes = read_scenes(&args.manifest)?;
    let mut player = reel::Player::headless(cfg, scenes)?;

    let mut pipeline = reel::CapturePipeline::new();
    if let Some(font) = read_font(args.font.as_deref())? {
        pipeline = pipeline.with_font(font);
    }
    let encoder: Box<dyn reel::CaptureEncoder> = match args.encoder {
        EncoderChoice::Mp4 => Box::new(reel::FfmpegEncoder::new()),
        EncoderChoice::Reel => Box::new(reel::InMemoryEncoder::new()),
    };

    let mut last_scene = usize::MAX;
    let artifact = pipeline.run(&mut player, encoder, |scene, total, _| {
        if scene != last_scene {
            last_scene = scene;
            eprintln!("capturing scene {}/{}", scene + 1, total);
        }
    })?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(&artifact.filename));
    reel::encode::ffmpeg::ensure_parent_dir(&out)?;
    std::fs::write(&out, &artifact.bytes)
        .with_context(|| format!("write artifact '{}'", out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {:.2}s)",
        out.display(),
        artifact.frames,
        artifact.duration_secs
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref())?;
    cfg.validate()?;
    let scenes = read_scenes(&args.manifest)?;
    let scene = scenes.get(args.scene).with_context(|| {
        format!(
            "scene index {} out of range ({} scenes)",
            args.scene,
            scenes.len()
        )
    })?;

    let duration = scene
        .narration
        .as_ref()
        .map(|n| n.nominal_duration_secs())
        .filter(|d| *d > 0.0)
        .unwrap_or(cfg.fallback_duration_secs);

    let mut renderer = reel::FrameRenderer::new(cfg.canvas(), cfg.capture.background_rgba)?;
    if let Some(font) = read_font(args.font.as_deref())? {
        renderer = renderer.with_font(font)?;
    }
    let visual = sample_frame_with(
        &scene,
        args.time,
        duration,
        cfg.canvas(),
        cfg.caption_mode,
        renderer.text_measure(),
    );
    let frame = renderer.render(&visual)?;

    reel::encode::ffmpeg::ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    if !args.speed.is_finite() || args.speed <= 0.0 {
        anyhow::bail!("--speed must be finite and > 0");
    }
    let cfg = read_config(args.config.as_deref())?;
    let scenes = read_scenes(&args.manifest)?;
    let mut player = reel::Player::headless(cfg, scenes)?;

    let block = (player.sample_rate() / 50) as usize;
    let tick = Duration::from_secs_f64(block as f64 / f64::from(player.sample_rate()) / args.speed);

    let started = Instant::now();
    if !player.start() {
        anyhow::bail!("nothing to play: the manifest has no scenes");
    }
    loop {
        for ev in player.drain_events() {
            match ev {
                reel::PlayerEvent::SceneChanged { index } => {
                    tracing::info!(index, elapsed = ?started.elapsed(), "scene");
                }
                reel::PlayerEvent::StatusChanged(status) => {
                    tracing::info!(?status, elapsed = ?started.elapsed(), "status");
                }
            }
        }
        if player.status() != reel::PlaybackStatus::Playing {
            break;
        }
        player.pump(block)?;
        std::thread::sleep(tick);
    }
    player.shutdown();
    Ok(())
}
