use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};
use vector_core::{AnimatedVectorLoader, ManualClock, Renderable, VectorDrawable};
use vector_data::{DisplayMetrics, MarkupEvent, ResourceDirectory, ResourceRef, Resources};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Resource directory laid out as <type>/<name>.xml
    #[arg(value_name = "RESOURCES")]
    resources: PathBuf,

    /// Drawable to render, e.g. @drawable/icon
    #[arg(value_name = "REFERENCE")]
    reference: String,

    /// Directory the PNG files are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Output width in pixels (defaults to the intrinsic width)
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels (defaults to the intrinsic height)
    #[arg(long)]
    height: Option<u32>,

    /// Pixels per dp
    #[arg(long)]
    density: Option<f32>,

    /// JSON file with display metrics
    #[arg(long, value_name = "FILE")]
    metrics: Option<PathBuf>,

    /// Frames to render for an animated-vector
    #[arg(long, default_value_t = 30)]
    frames: u32,

    /// Frame rate used to space animated frames
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(cli.log_level).into())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match cli.log_format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }

    if let Err(e) = run(&cli) {
        error!("Render failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut metrics = match &cli.metrics {
        Some(path) => DisplayMetrics::from_json_file(path)
            .with_context(|| format!("reading metrics from {}", path.display()))?,
        None => DisplayMetrics::default(),
    };
    if let Some(density) = cli.density {
        metrics = DisplayMetrics::with_density(density);
    }
    let metrics = metrics.with_env_override();

    let resources: Arc<dyn Resources> = Arc::new(
        ResourceDirectory::new(&cli.resources, metrics)
            .with_context(|| format!("opening resources at {}", cli.resources.display()))?,
    );
    fs::create_dir_all(&cli.output).with_context(|| format!("creating {}", cli.output.display()))?;

    let stem: ResourceRef = cli.reference.parse().context("parsing drawable reference")?;
    info!("Resources: {:?}", cli.resources);
    info!("Drawable: {}", cli.reference);

    match root_tag(resources.as_ref(), &cli.reference)?.as_str() {
        "vector" => {
            let mut drawable = VectorDrawable::load(resources, &cli.reference)?;
            let (width, height) = output_size(cli, &drawable)?;
            let path = cli.output.join(format!("{}.png", stem.name));
            write_frame(&mut drawable, width, height, &path)?;
        }
        "animated-vector" => {
            let clock = ManualClock::new();
            let mut loader = AnimatedVectorLoader::new(resources);
            let mut animated = loader.load_with_clock(&cli.reference, clock.clone())?;
            let (width, height) = output_size(cli, animated.drawable())?;
            if cli.fps == 0 {
                bail!("--fps must be positive");
            }
            if animated.is_infinite() {
                warn!("Animation repeats forever, rendering {} frames", cli.frames);
            }

            animated.start();
            for frame in 0..cli.frames {
                clock.set(Duration::from_secs_f64(frame as f64 / cli.fps as f64));
                let path = cli.output.join(format!("{}_{:04}.png", stem.name, frame));
                write_frame(&mut animated, width, height, &path)?;
            }
        }
        other => bail!("{} is a <{}>, not a vector or animated-vector", cli.reference, other),
    }
    info!("Render complete.");
    Ok(())
}

/// Name of the first element in the referenced document.
fn root_tag(resources: &dyn Resources, reference: &str) -> Result<String> {
    let mut reader = resources.open(reference)?;
    loop {
        match reader.next_event()? {
            MarkupEvent::StartTag(tag) => return Ok(tag.name),
            MarkupEvent::EndTag { .. } => continue,
            MarkupEvent::EndDocument => bail!("{} is empty", reference),
        }
    }
}

fn output_size(cli: &Cli, drawable: &VectorDrawable) -> Result<(i32, i32)> {
    let width = cli.width.unwrap_or(drawable.intrinsic_width().round() as u32);
    let height = cli.height.unwrap_or(drawable.intrinsic_height().round() as u32);
    if width == 0 || height == 0 {
        bail!("output size {}x{} is empty; pass --width and --height", width, height);
    }
    Ok((i32::try_from(width)?, i32::try_from(height)?))
}

fn write_frame(drawable: &mut dyn Renderable, width: i32, height: i32, path: &Path) -> Result<()> {
    let png = vector_skia::render_png(drawable, width, height)?;
    fs::write(path, png).with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["vector-render", "res", "@drawable/icon"]).unwrap();
        assert_eq!(cli.frames, 30);
        assert_eq!(cli.fps, 30);
        assert_eq!(cli.output, PathBuf::from("."));
        assert_eq!(cli.log_level, LogLevel::Info);
        assert!(cli.width.is_none() && cli.density.is_none());
    }

    #[test]
    fn test_log_level_maps_to_filter() {
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::WARN);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
    }
}
