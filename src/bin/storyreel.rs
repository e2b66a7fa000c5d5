use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use storyreel::batch::pipeline::{NarrationOptions, subtitle_path};
use storyreel::encode::{ConcatStage, EncoderConfig, MuxStage, read_clip_info};
use storyreel::narration::{Engine, NarrationConfig, NarrationRequest, NarrationStage, backend_for};
use storyreel::stage::RendererConfig;
use storyreel::subtitle::{compile_script, write_subtitles};
use storyreel::{
    BatchOptions, Canvas, Fps, PipelineOptions, RenderManifest, Script, StageOptions,
    StageResult, SubtitleFormat, SubtitleOptions, TimelineOptions, Unit, compile_scene,
    discover_units, run_all, run_stage, run_unit,
};

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and normalize a script, printing a short report.
    Validate(ValidateArgs),
    /// Dump the per-frame animation state of one scene as JSON lines.
    Timeline(TimelineArgs),
    /// Write the render manifest for a script.
    Manifest(ManifestArgs),
    /// Write a subtitle track for a script.
    Subtitles(SubtitlesArgs),
    /// Synthesize narration audio.
    Tts(TtsArgs),
    /// Lay an audio track over a video (requires `ffmpeg` on PATH).
    Mux(MuxArgs),
    /// Join videos end to end (requires `ffmpeg` on PATH).
    Concat(ConcatArgs),
    /// Produce one video from one script.
    Generate(GenerateArgs),
    /// Produce one video per script in a directory.
    Batch(BatchArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Print the normalized script instead of a summary.
    #[arg(long)]
    normalized: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    VideoScript,
    Whiteboard,
}

#[derive(Args, Debug)]
struct TimelineFlags {
    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Animation preset.
    #[arg(long, value_enum, default_value_t = Preset::VideoScript)]
    preset: Preset,

    /// Override the delay between consecutive elements, in frames.
    #[arg(long)]
    stagger: Option<u64>,
}

impl TimelineFlags {
    fn fps(&self) -> anyhow::Result<Fps> {
        Ok(Fps::whole(self.fps)?)
    }

    fn options(&self) -> TimelineOptions {
        let base = match self.preset {
            Preset::VideoScript => TimelineOptions::video_script(),
            Preset::Whiteboard => TimelineOptions::whiteboard(),
        };
        match self.stagger {
            Some(frames) => base.with_stagger(frames),
            None => base,
        }
    }
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Input script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Scene id or 1-based index.
    #[arg(long, default_value = "1")]
    scene: String,

    #[command(flatten)]
    timeline: TimelineFlags,

    /// Output file; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ManifestArgs {
    /// Input script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Output manifest JSON.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    timeline: TimelineFlags,

    /// Canvas size, e.g. 1920x1080.
    #[arg(long, default_value = "1920x1080")]
    resolution: Canvas,
}

#[derive(Parser, Debug)]
struct SubtitlesArgs {
    /// Input script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Output subtitle file.
    #[arg(long)]
    output: PathBuf,

    /// srt, vtt or ass. Unknown names fall back to srt.
    #[arg(long, default_value = "srt")]
    format: String,

    /// Emit narration cues only.
    #[arg(long)]
    no_titles: bool,
}

#[derive(Args, Debug)]
struct NarrationFlags {
    /// Voice name or id; aliases come from the narration config.
    #[arg(long, default_value = "default")]
    voice: String,

    /// Speech speed, 0.5 to 2.0.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// auto, elevenlabs, google, azure or sag.
    #[arg(long, default_value = "auto")]
    engine: Engine,

    /// Narration config JSON; defaults to the per-user config file.
    #[arg(long)]
    tts_config: Option<PathBuf>,
}

impl NarrationFlags {
    fn config(&self) -> anyhow::Result<NarrationConfig> {
        match &self.tts_config {
            Some(path) => {
                require_file(path)?;
                Ok(NarrationConfig::load(path)?)
            }
            None => match NarrationConfig::default_path() {
                Some(path) => Ok(NarrationConfig::load_or_default(&path)?),
                None => Ok(NarrationConfig::default()),
            },
        }
    }
}

#[derive(Parser, Debug)]
struct TtsArgs {
    /// Text to speak.
    #[arg(long)]
    text: String,

    /// Output audio path.
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    narration: NarrationFlags,

    /// Give up after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Parser, Debug)]
struct MuxArgs {
    #[arg(long)]
    video: PathBuf,

    #[arg(long)]
    audio: PathBuf,

    #[arg(long)]
    output: PathBuf,

    /// Narration volume, 0.0 to 2.0.
    #[arg(long, default_value_t = 1.0)]
    volume: f64,
}

#[derive(Parser, Debug)]
struct ConcatArgs {
    /// Comma-separated input videos, in order.
    #[arg(long, value_delimiter = ',', required = true)]
    videos: Vec<PathBuf>,

    #[arg(long)]
    output: PathBuf,

    /// Cross-fade length in seconds; 0 joins with a stream copy.
    #[arg(long, default_value_t = 0.0)]
    transition: f64,
}

#[derive(Args, Debug)]
struct PipelineFlags {
    #[command(flatten)]
    timeline: TimelineFlags,

    /// Canvas size, e.g. 1920x1080.
    #[arg(long, default_value = "1920x1080")]
    resolution: Canvas,

    /// Renderer command template; placeholders {entry} {composition} {manifest} {output}.
    #[arg(long)]
    renderer: Option<String>,

    /// Working directory for the renderer, e.g. the Remotion project.
    #[arg(long)]
    project: Option<PathBuf>,

    /// Renderer entry point substituted for {entry}.
    #[arg(long)]
    entry: Option<String>,

    /// Subtitle format for the side-car track.
    #[arg(long, default_value = "srt")]
    subtitle_format: String,

    /// Cross-fade between scenes, in seconds.
    #[arg(long, default_value_t = 0.0)]
    transition: f64,

    /// Synthesize the script's narration and mux it into the video.
    #[arg(long)]
    narrate: bool,

    #[command(flatten)]
    narration: NarrationFlags,

    /// Narration volume, 0.0 to 2.0.
    #[arg(long, default_value_t = 1.0)]
    volume: f64,

    /// Per-stage timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Keep intermediate files.
    #[arg(long)]
    keep_work: bool,
}

impl PipelineFlags {
    fn options(&self) -> anyhow::Result<PipelineOptions> {
        let mut renderer = match &self.renderer {
            Some(t) => RendererConfig::from_template(t)?,
            None => RendererConfig::default(),
        };
        if let Some(project) = &self.project {
            if !project.is_dir() {
                bail!("project directory not found: '{}'", project.display());
            }
            renderer = renderer.with_project_dir(Some(project.clone()));
        }
        if let Some(entry) = &self.entry {
            renderer = renderer.with_entry(entry.as_str());
        }

        let narration = if self.narrate {
            let config = self.narration.config()?;
            Some(NarrationOptions {
                backend: backend_for(self.narration.engine, &config),
                voice: self.narration.voice.clone(),
                speed: self.narration.speed,
                volume: self.volume,
            })
        } else {
            None
        };

        let mut opts = PipelineOptions::new(self.timeline.fps()?);
        opts.canvas = self.resolution;
        opts.timeline = self.timeline.options();
        opts.subtitle_format = SubtitleFormat::parse_lenient(&self.subtitle_format);
        opts.renderer = renderer;
        opts.stage = stage_options(self.timeout_secs);
        opts.transition_secs = self.transition;
        opts.narration = narration;
        opts.keep_work = self.keep_work;
        opts.validate()?;
        Ok(opts)
    }
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Output video path.
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    pipeline: PipelineFlags,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory of script JSON files.
    #[arg(long)]
    scripts: PathBuf,

    /// Output directory.
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Units processed at once.
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    #[command(flatten)]
    pipeline: PipelineFlags,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::Manifest(args) => cmd_manifest(args),
        Command::Subtitles(args) => cmd_subtitles(args),
        Command::Tts(args) => cmd_tts(args),
        Command::Mux(args) => cmd_mux(args),
        Command::Concat(args) => cmd_concat(args),
        Command::Generate(args) => cmd_generate(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn require_file(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        bail!("input file not found: '{}'", path.display());
    }
    Ok(())
}

fn load_script(path: &Path) -> anyhow::Result<Script> {
    require_file(path)?;
    Script::from_path(path).with_context(|| format!("load script '{}'", path.display()))
}

fn stage_options(timeout_secs: Option<u64>) -> StageOptions {
    StageOptions::default().with_timeout(timeout_secs.map(Duration::from_secs))
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<ExitCode> {
    let script = load_script(&args.script)?;
    if args.normalized {
        println!("{}", script.to_json_pretty()?);
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{}: {} scene(s), {:.2}s",
        script.id,
        script.scenes.len(),
        script.total_duration_seconds()
    );
    for scene in &script.scenes {
        println!(
            "  {} \"{}\" {:.2}s, {} element(s){}",
            scene.id,
            scene.title,
            scene.duration_seconds,
            scene.elements.len(),
            if scene.narration().is_some() {
                ", narrated"
            } else {
                ""
            }
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<ExitCode> {
    let script = load_script(&args.script)?;
    let scene = match args.scene.parse::<usize>() {
        Ok(n) if n >= 1 => script.scenes.get(n - 1),
        _ => script.scenes.iter().find(|s| s.id == args.scene),
    }
    .with_context(|| format!("no scene '{}' in '{}'", args.scene, args.script.display()))?;

    let schedule = compile_scene(scene, args.timeline.fps()?, &args.timeline.options())?;
    let mut out: Box<dyn std::io::Write> = match &args.out {
        Some(path) => {
            storyreel::foundation::fs::ensure_parent_dir(path)?;
            Box::new(std::io::BufWriter::new(
                std::fs::File::create(path)
                    .with_context(|| format!("create '{}'", path.display()))?,
            ))
        }
        None => Box::new(std::io::stdout().lock()),
    };
    for state in schedule.sample_range() {
        serde_json::to_writer(&mut out, &state).context("write frame state")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_manifest(args: ManifestArgs) -> anyhow::Result<ExitCode> {
    let script = load_script(&args.script)?;
    let manifest = RenderManifest::build(
        &script,
        args.timeline.fps()?,
        args.resolution,
        &args.timeline.options(),
    )?;
    manifest.write(&args.out)?;
    eprintln!(
        "wrote {} ({} composition(s), {} frames)",
        args.out.display(),
        manifest.compositions.len(),
        manifest.total_frames()
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_subtitles(args: SubtitlesArgs) -> anyhow::Result<ExitCode> {
    let script = load_script(&args.script)?;
    let format = SubtitleFormat::parse_lenient(&args.format);
    let opts = SubtitleOptions {
        include_titles: !args.no_titles,
        ..SubtitleOptions::default()
    };
    let cues = compile_script(&script, &opts);
    write_subtitles(&args.output, &cues, format)?;
    eprintln!("wrote {} ({} cue(s))", args.output.display(), cues.len());
    Ok(ExitCode::SUCCESS)
}

fn cmd_tts(args: TtsArgs) -> anyhow::Result<ExitCode> {
    let request = NarrationRequest::new(args.text)
        .with_voice(args.narration.voice.clone())
        .with_speed(args.narration.speed);
    request.validate()?;
    let config = args.narration.config()?;
    let backend = backend_for(args.narration.engine, &config);

    let stage = NarrationStage {
        backend: backend.as_ref(),
        request,
        output: args.output,
    };
    let res = run_stage("tts", &stage, &stage_options(args.timeout_secs));
    Ok(report(&[res]))
}

fn cmd_mux(args: MuxArgs) -> anyhow::Result<ExitCode> {
    require_file(&args.video)?;
    require_file(&args.audio)?;
    let encoder = EncoderConfig::default();
    let stage = MuxStage {
        encoder: &encoder,
        video: args.video,
        audio: args.audio,
        volume: args.volume,
        output: args.output,
    };
    stage.validate()?;
    Ok(report(&[run_stage("mux", &stage, &StageOptions::default())]))
}

fn cmd_concat(args: ConcatArgs) -> anyhow::Result<ExitCode> {
    for video in &args.videos {
        require_file(video)?;
    }
    let encoder = EncoderConfig::default();
    let mut stage = ConcatStage {
        encoder: &encoder,
        inputs: args.videos,
        transition_secs: args.transition,
        output: args.output,
        clips: Vec::new(),
    };
    if stage.uses_crossfade() {
        stage.clips =
            read_clip_info(&encoder, &stage.inputs, None).context("reading input clips")?;
    }
    stage.validate()?;
    Ok(report(&[run_stage("concat", &stage, &StageOptions::default())]))
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<ExitCode> {
    require_file(&args.script)?;
    let opts = args.pipeline.options()?;
    let out_dir = args
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut unit = Unit::new(&args.script, out_dir);
    unit.output_path = args.output.clone();

    let res = run_unit(&unit, &opts);
    if res.succeeded {
        eprintln!(
            "subtitles: {}",
            subtitle_path(&unit, opts.subtitle_format).display()
        );
    }
    Ok(report(&[res]))
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<ExitCode> {
    if !args.scripts.is_dir() {
        bail!("script directory not found: '{}'", args.scripts.display());
    }
    let units = discover_units(&args.scripts, &args.output)?;
    if units.is_empty() {
        bail!("no script JSON files found in '{}'", args.scripts.display());
    }
    let opts = args.pipeline.options()?;
    let batch = BatchOptions {
        concurrency: args.concurrency,
        ..BatchOptions::default()
    }
    .with_summary_in(&args.output);

    let batch_report = run_all(&units, &batch, |unit| run_unit(unit, &opts))?;
    Ok(report(&batch_report.results))
}

/// Print the run outcome; any failure makes the exit code non-zero.
fn report(results: &[StageResult]) -> ExitCode {
    let ok = results.iter().filter(|r| r.succeeded).count();
    let failed = results.len() - ok;
    let bytes: u64 = results
        .iter()
        .filter(|r| r.succeeded)
        .map(|r| r.size_bytes)
        .sum();

    println!("succeeded: {ok}, failed: {failed}, bytes: {bytes}");
    for r in results {
        if r.succeeded {
            println!("  ok    {} -> {}", r.unit_id, r.output_path.display());
        } else {
            println!(
                "  FAIL  {}: {}",
                r.unit_id,
                r.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
