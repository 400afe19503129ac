//! Parlay - Entry Point
//!
//! Loads a plain-text document (one paragraph per line) and scrolls a
//! viewport through it from top to bottom, laying out each frame the way an
//! editor would, then reports how much work the lazy layout engine did.

use clap::Parser;
use parlay::config::{CliOverrides, ResolvedConfig};
use parlay::logging::LogTarget;
use parlay::view_state::{LazyLayoutEngine, MonospaceShaper, TextShaper};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Parlay - scroll a document through the lazy layout engine
#[derive(Parser, Debug)]
#[command(name = "parlay")]
#[command(version)]
#[command(about = "Sweep a viewport through a text document and report layout work")]
pub struct Args {
    /// Path to a UTF-8 text file, one paragraph per line
    pub file: PathBuf,

    /// Layout width in pixels
    #[arg(long, value_parser = positive_f64)]
    pub width: Option<f64>,

    /// Viewport height in pixels
    #[arg(long, default_value = "600", value_parser = positive_f64)]
    pub height: f64,

    /// Scroll distance per frame in pixels
    #[arg(long, default_value = "100", value_parser = positive_f64)]
    pub step: f64,

    /// Buffer this many paragraphs above and below the viewport
    #[arg(long, conflicts_with = "buffer_pixels")]
    pub buffer_paragraphs: Option<usize>,

    /// Buffer this many pixels above and below the viewport
    #[arg(long, value_parser = positive_f64)]
    pub buffer_pixels: Option<f64>,

    /// Maximum number of cached layouts
    #[arg(long)]
    pub cache_ceiling: Option<usize>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub log_stderr: bool,
}

fn positive_f64(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a positive number"))
    }
}

/// Totals collected over one sweep.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct SweepReport {
    /// Paragraphs in the document.
    pub paragraphs: usize,
    /// Frames laid out.
    pub frames: usize,
    /// Paragraphs shaped.
    pub shaped: usize,
    /// Dirty layouts re-trusted without shaping.
    pub revalidated: usize,
    /// Cache evictions.
    pub evicted: usize,
    /// Largest cache size seen after a frame.
    pub peak_cache_size: usize,
    /// Paragraphs that could not be shaped.
    pub failed_paragraphs: usize,
    /// Paragraphs measured by the end of the sweep.
    pub measured_paragraphs: usize,
    /// Document height at the end of the sweep.
    pub total_height: f64,
    /// Slowest frame in milliseconds.
    pub max_frame_ms: f64,
    /// Mean frame time in milliseconds.
    pub mean_frame_ms: f64,
}

/// Scroll from the top to the bottom, laying out every frame.
///
/// # Errors
///
/// Propagates layout errors, which indicate an internal index mismatch.
pub fn run_sweep<S: TextShaper>(
    engine: &mut LazyLayoutEngine<S>,
    viewport_height: f64,
    step: f64,
) -> Result<SweepReport, parlay::model::DocumentError> {
    let mut report = SweepReport {
        paragraphs: engine.store().paragraph_count(),
        ..SweepReport::default()
    };
    let mut slowest = Duration::ZERO;
    let mut elapsed = Duration::ZERO;

    engine.set_viewport(0.0, viewport_height);
    loop {
        let started = Instant::now();
        let pass = engine.layout_viewport()?;
        let frame = started.elapsed();

        report.frames += 1;
        report.shaped += pass.shaped;
        report.revalidated += pass.revalidated;
        report.evicted += pass.evicted;
        report.peak_cache_size = report.peak_cache_size.max(engine.layout_count());
        slowest = slowest.max(frame);
        elapsed += frame;

        if engine.viewport().scroll_y() >= engine.max_scroll() {
            break;
        }
        engine.scroll_by(step);
    }

    report.failed_paragraphs = engine.failed_paragraph_count();
    report.measured_paragraphs = engine.store().measured_count();
    report.total_height = engine.store().total_height();
    report.max_frame_ms = slowest.as_secs_f64() * 1000.0;
    report.mean_frame_ms = elapsed.as_secs_f64() * 1000.0 / report.frames as f64;
    Ok(report)
}

fn print_report(report: &SweepReport) {
    println!("paragraphs:          {}", report.paragraphs);
    println!("frames:              {}", report.frames);
    println!("shaped:              {}", report.shaped);
    println!("revalidated:         {}", report.revalidated);
    println!("evicted:             {}", report.evicted);
    println!("peak cache size:     {}", report.peak_cache_size);
    println!("measured paragraphs: {}", report.measured_paragraphs);
    if report.failed_paragraphs > 0 {
        println!("failed paragraphs:   {}", report.failed_paragraphs);
    }
    println!("total height:        {:.1}px", report.total_height);
    println!("slowest frame:       {:.3}ms", report.max_frame_ms);
    println!("mean frame:          {:.3}ms", report.mean_frame_ms);
}

fn resolve_config(args: &Args) -> Result<ResolvedConfig, Box<dyn std::error::Error>> {
    // Defaults → Config File → Env Vars → CLI Args
    let config_file = parlay::config::load_config_with_precedence(args.config.clone())?;
    let merged = parlay::config::merge_config(config_file);
    let with_env = parlay::config::apply_env_overrides(merged)?;
    let cli = CliOverrides {
        width: args.width,
        buffer_paragraphs: args.buffer_paragraphs,
        buffer_pixels: args.buffer_pixels,
        cache_ceiling: args.cache_ceiling,
    };
    let config = parlay::config::apply_cli_overrides(with_env, &cli);
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    let target = if args.log_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::File(config.log_file_path.clone())
    };
    parlay::logging::init(&target)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let contents = std::fs::read_to_string(&args.file)?;
    let mut engine = LazyLayoutEngine::new(MonospaceShaper::default(), config.engine_config());
    engine.load_texts(contents.lines());
    info!(
        paragraphs = engine.store().paragraph_count(),
        file = %args.file.display(),
        "Document loaded"
    );

    let report = run_sweep(&mut engine, args.height, args.step)?;
    info!(frames = report.frames, shaped = report.shaped, "Sweep finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
