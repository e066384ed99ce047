use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kinetic_config::KineticConfig;
use kinetic_core::{Diagnostic, Engine, EngineStats, LifecycleEvent};
use kinetic_dom::{Document, ReadyState, Viewport};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Drive the animation engine over a static page and report what it wired.
#[derive(Parser, Debug)]
#[command(name = "kinetic", author, version, about = "Headless animation orchestration")]
struct Cli {
    /// HTML page to load
    html: PathBuf,

    /// Configuration file (defaults to ./kinetic.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of 16ms frames to simulate
    #[arg(short, long, default_value_t = 120)]
    frames: usize,

    /// Wheel deltas, one applied per frame from the first frame on
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    wheel: Vec<f64>,

    #[arg(long)]
    width: Option<f64>,

    #[arg(long)]
    height: Option<f64>,

    /// Treat the page as still loading and deliver the window load signal
    /// after mount
    #[arg(long)]
    loading: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    stats: EngineStats,
    diagnostics: &'a [Diagnostic],
}

const FRAME_MS: f64 = 16.0;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => KineticConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => KineticConfig::load_or_default(),
    };
    config.merge_with_env();

    let html = std::fs::read_to_string(&cli.html)
        .with_context(|| format!("reading {}", cli.html.display()))?;
    let mut doc = Document::parse_html(&html)
        .with_context(|| format!("parsing {}", cli.html.display()))?;

    let current = doc.viewport();
    doc.set_viewport(Viewport::new(
        cli.width.unwrap_or(current.width),
        cli.height.unwrap_or(current.height),
    ));
    if cli.loading {
        doc.set_ready_state(ReadyState::Loading);
    } else {
        doc.set_ready_state(ReadyState::Complete);
    }

    let mut engine = Engine::new(config);
    engine.handle(&mut doc, LifecycleEvent::AppMounted);
    if cli.loading {
        doc.set_ready_state(ReadyState::Complete);
        engine.handle(&mut doc, LifecycleEvent::WindowLoaded);
    }

    let mut now = 0.0;
    let mut created = 0;
    for frame in 0..cli.frames {
        if let Some(delta) = cli.wheel.get(frame) {
            engine.wheel(*delta);
        }
        now += FRAME_MS;
        created += engine.frame(&mut doc, now);
    }
    info!(frames = cli.frames, created, "simulation finished");

    let report = Report {
        stats: engine.stats(),
        diagnostics: engine.diagnostics().entries(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    engine.teardown(&mut doc);
    Ok(())
}
