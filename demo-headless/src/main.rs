use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use hazard_graph_core::view::Layer;
use hazard_graph_core::{
    Engine, EngineConfig, FeatureStore, FixedClock, HeadlessCanvas, HeadlessHost, Mode,
    SimulationSpeed, TimePeriod,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Render the hazard graph headlessly and report what was drawn
#[derive(Parser, Debug)]
#[command(name = "hazard-graph-demo")]
#[command(about = "Headless hazard/community graph renderer", long_about = None)]
struct Args {
    /// Dataset JSON with `hazards` and `communities` arrays
    #[arg(short, long, default_value = "data/sample_features.json")]
    dataset: PathBuf,

    /// Engine config overrides (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// View mode (spatial, network)
    #[arg(short, long, default_value = "spatial")]
    mode: Mode,

    /// Time window (past, present, future, all)
    #[arg(short, long, default_value = "all")]
    period: TimePeriod,

    /// Time-filter anchor (RFC 3339); defaults to now
    #[arg(long)]
    anchor: Option<String>,

    /// Layers to hide (heat, flood, fire, air, communities, connections)
    #[arg(long, value_delimiter = ',')]
    hide: Vec<Layer>,

    /// Particle speed multiplier (0.5, 1, 2)
    #[arg(short, long, default_value = "1")]
    speed: SimulationSpeed,

    /// Number of frames to render
    #[arg(short, long, default_value_t = 60)]
    frames: u32,

    /// Frame interval in milliseconds
    #[arg(long, default_value_t = 16)]
    interval_ms: i64,

    /// Canvas width in CSS pixels
    #[arg(long, default_value_t = 800.0)]
    width: f32,

    /// Canvas height in CSS pixels
    #[arg(long, default_value_t = 600.0)]
    height: f32,

    /// Device pixel ratio
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Write the last frame's draw commands as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_json_str(&json).context("parsing engine config")?
        }
        None => EngineConfig::default(),
    };

    let (store, report) = FeatureStore::from_path(&args.dataset)
        .with_context(|| format!("loading dataset {}", args.dataset.display()))?;
    if store.is_empty() {
        bail!("dataset {} has no usable records", args.dataset.display());
    }

    let anchor = match &args.anchor {
        Some(s) => Some(
            DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("parsing anchor '{s}'"))?
                .with_timezone(&Utc),
        ),
        None => None,
    };

    println!("╔═══════════════════════════════════════════════════════════╗");
    println!("║           HAZARD GRAPH - HEADLESS RENDER                  ║");
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();
    println!("Dataset: {}", args.dataset.display());
    println!(
        "  {} hazards, {} communities accepted, {} rejected",
        report.hazards_accepted,
        report.communities_accepted,
        report.rejected_count()
    );
    for (id, reason) in &report.rejected {
        println!("    - '{}': {}", id, reason);
    }
    println!(
        "View: mode {}, period {}, speed {}x, canvas {}x{} @ {}x",
        args.mode,
        args.period,
        args.speed.factor(),
        args.width,
        args.height,
        args.dpr
    );
    println!();

    let clock = FixedClock::new(Utc::now());
    let mut engine = Engine::mount_with_clock(
        Some(HeadlessCanvas::new(args.width, args.height, args.dpr)),
        HeadlessHost::new(),
        store,
        config,
        Box::new(clock.clone()),
    );
    if !engine.is_ready() {
        bail!("canvas has no 2D context");
    }

    engine.set_mode(args.mode);
    engine.set_time_period(args.period);
    engine.set_time_anchor(anchor);
    engine.set_simulation_speed(args.speed);
    for layer in &args.hide {
        engine.set_layer(*layer, false);
    }
    // Keep spatial mode animating too so every requested frame renders
    engine.set_playing(true);

    let step = Duration::milliseconds(args.interval_ms);
    for frame in 0..args.frames {
        let Some(stats) = engine.tick() else {
            info!("No frame pending after {} frames", frame);
            break;
        };
        if frame % 10 == 0 || frame + 1 == args.frames {
            println!(
                "Frame {:>4}: {:>3} nodes, {:>3} links, {:.3}ms",
                stats.frame, stats.nodes, stats.links, stats.duration_ms
            );
        }
        clock.advance(step);
    }

    println!();
    println!("Nodes:");
    for node in engine.nodes() {
        println!(
            "  {:<9} {:<14} ({:>7.1}, {:>7.1}) r={:>5.1} {}",
            node.kind.to_string(), node.id, node.position.x, node.position.y, node.radius, node.name
        );
    }

    if !engine.links().is_empty() {
        println!();
        println!("Links:");
        let buffers = engine.node_buffers();
        for link in engine.links() {
            println!(
                "  {} -> {} [{}] weight {:.3}",
                buffers.id(link.source, engine.store()),
                buffers.id(link.target, engine.store()),
                link.hazard_type,
                link.weight
            );
        }
    }

    println!();
    println!(
        "Average frame time: {:.3}ms over {} frames",
        engine.timer().average_ms(),
        engine.timer().frames()
    );

    if let Some(path) = &args.dump {
        let commands = engine
            .canvas()
            .map(|c| c.surface().commands())
            .unwrap_or_default();
        let json = serde_json::to_string_pretty(commands).context("serialising draw commands")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {} draw commands to {}", commands.len(), path.display());
    }

    engine.unmount();
    Ok(())
}
