//! Interactive Hazard Graph Demo
//!
//! A terminal REPL driving the graph engine through the headless host. Frames
//! are advanced by hand and the last frame can be rasterised into the terminal.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package demo-interactive -- [dataset.json]
//! ```
//!
//! # Commands
//!
//! - `mode <spatial|network>` - Switch view mode
//! - `layer <heat|flood|fire|air|communities|connections> <on|off>` - Toggle a layer
//! - `period <past|present|future|all>` - Select the time window
//! - `anchor <rfc3339|now>` - Pin the time-filter anchor, or follow the clock
//! - `speed <0.5|1|2>` - Particle speed multiplier
//! - `play` / `pause` - Toggle playback
//! - `frame [n]` - Advance the clock 16ms and fire pending frames, n times (default 1)
//! - `click <x> <y>` - Click at client coordinates
//! - `down <x> <y>` / `move <x> <y>` / `up` - Drag a node
//! - `select <id>` - Select a node as the side-panel list would
//! - `clear` - Clear the selection
//! - `nodes` - List nodes of the last frame
//! - `links` - List links of the last frame
//! - `events` - Show events emitted since the last call
//! - `status` - Show view state and frame stats
//! - `draw [cols] [rows]` - Rasterise the last frame into the terminal
//! - `help` - Show available commands
//! - `quit` - Exit

use chrono::{DateTime, Duration, Utc};
use hazard_graph_core::render::{DrawCommand, Paint};
use hazard_graph_core::view::Layer;
use hazard_graph_core::{
    Color, Engine, EngineConfig, FeatureStore, FixedClock, HeadlessCanvas, HeadlessHost, Mode,
    NodeKind, SimulationSpeed, TimePeriod, Vec2,
};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color as TermColor;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders, Widget};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

type DemoEngine = Engine<HeadlessCanvas, HeadlessHost>;

/// Default canvas size in CSS pixels
const CANVAS_WIDTH: f32 = 800.0;
const CANVAS_HEIGHT: f32 = 600.0;

/// Clock step per `frame`
const FRAME_MS: i64 = 16;

const DEFAULT_DATASET: &str = "data/sample_features.json";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("╔═══════════════════════════════════════════════════════════╗");
    println!("║         Hazard Graph - Interactive Debugger               ║");
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();

    let dataset = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_DATASET.to_owned());
    let (store, report) = match FeatureStore::from_path(&dataset) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load {}: {}", dataset, e);
            return;
        }
    };
    println!(
        "Loaded {}: {} hazards, {} communities ({} rejected)",
        dataset,
        report.hazards_accepted,
        report.communities_accepted,
        report.rejected_count()
    );

    let clock = FixedClock::new(Utc::now());
    let mut engine = Engine::mount_with_clock(
        Some(HeadlessCanvas::new(CANVAS_WIDTH, CANVAS_HEIGHT, 1.0)),
        HeadlessHost::new(),
        store,
        EngineConfig::default(),
        Box::new(clock.clone()),
    );
    if !engine.is_ready() {
        eprintln!("Canvas has no 2D context; nothing to show");
        return;
    }
    advance(&mut engine, &clock, 1);

    // Setup readline
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create readline: {}", e);
            return;
        }
    };

    println!("\nType 'help' for available commands.\n");

    loop {
        let readline = rl.readline("graph> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                let parts: Vec<&str> = line.split_whitespace().collect();

                if parts.is_empty() {
                    continue;
                }

                match parts[0].to_lowercase().as_str() {
                    "mode" | "m" => match parts.get(1).map(|s| s.parse::<Mode>()) {
                        Some(Ok(mode)) => {
                            engine.set_mode(mode);
                            advance(&mut engine, &clock, 1);
                        }
                        Some(Err(e)) => println!("{}", e),
                        None => println!("Usage: mode <spatial|network>"),
                    },
                    "layer" | "l" => {
                        let layer = parts.get(1).map(|s| s.parse::<Layer>());
                        let on = parts.get(2).and_then(|s| parse_toggle(s));
                        match (layer, on) {
                            (Some(Ok(layer)), Some(on)) => {
                                engine.set_layer(layer, on);
                                advance(&mut engine, &clock, 1);
                            }
                            (Some(Err(e)), _) => println!("{}", e),
                            _ => println!("Usage: layer <name> <on|off>"),
                        }
                    }
                    "period" | "p" => match parts.get(1).map(|s| s.parse::<TimePeriod>()) {
                        Some(Ok(period)) => {
                            engine.set_time_period(period);
                            advance(&mut engine, &clock, 1);
                        }
                        Some(Err(e)) => println!("{}", e),
                        None => println!("Usage: period <past|present|future|all>"),
                    },
                    "anchor" | "a" => match parts.get(1) {
                        Some(&"now") => engine.set_time_anchor(None),
                        Some(s) => match DateTime::parse_from_rfc3339(s) {
                            Ok(at) => engine.set_time_anchor(Some(at.with_timezone(&Utc))),
                            Err(e) => println!("Invalid timestamp '{}': {}", s, e),
                        },
                        None => println!("Usage: anchor <rfc3339|now>"),
                    },
                    "speed" => match parts.get(1).map(|s| s.parse::<SimulationSpeed>()) {
                        Some(Ok(speed)) => engine.set_simulation_speed(speed),
                        Some(Err(e)) => println!("{}", e),
                        None => println!("Usage: speed <0.5|1|2>"),
                    },
                    "play" => engine.set_playing(true),
                    "pause" => engine.set_playing(false),
                    "frame" | "f" => {
                        let count = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);
                        advance(&mut engine, &clock, count);
                    }
                    "click" | "c" => match parse_point(&parts[1..]) {
                        Some(point) => {
                            match engine.pointer_click(point) {
                                Some(id) => println!("Selected '{}'", id),
                                None => println!("Nothing selected"),
                            }
                            advance(&mut engine, &clock, 1);
                        }
                        None => println!("Usage: click <x> <y>"),
                    },
                    "down" => match parse_point(&parts[1..]) {
                        Some(point) => {
                            if engine.pointer_down(point) {
                                println!("Dragging");
                            } else {
                                println!("No node under pointer");
                            }
                        }
                        None => println!("Usage: down <x> <y>"),
                    },
                    "move" => match parse_point(&parts[1..]) {
                        Some(point) => {
                            engine.pointer_move(point);
                            advance(&mut engine, &clock, 1);
                        }
                        None => println!("Usage: move <x> <y>"),
                    },
                    "up" => {
                        engine.pointer_up();
                        advance(&mut engine, &clock, 1);
                    }
                    "select" | "s" => match parts.get(1) {
                        Some(id) => select_by_id(&mut engine, id),
                        None => println!("Usage: select <id>"),
                    },
                    "clear" => engine.clear_selection(),
                    "nodes" | "n" => show_nodes(&engine),
                    "links" => show_links(&engine),
                    "events" | "e" => {
                        let events = engine.drain_events();
                        if events.is_empty() {
                            println!("No events");
                        }
                        for event in events {
                            match serde_json::to_string(&event) {
                                Ok(json) => println!("  {}", json),
                                Err(e) => println!("  {:?} ({})", event, e),
                            }
                        }
                    }
                    "status" | "st" => show_status(&engine),
                    "draw" | "d" => {
                        let cols = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(100);
                        let rows = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(36);
                        draw(&engine, cols, rows);
                    }
                    "help" | "?" => show_help(),
                    "quit" | "q" | "exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => println!("Unknown command: {}. Type 'help' for commands.", parts[0]),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    engine.unmount();
}

fn parse_toggle(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "on" | "true" | "1" | "show" => Some(true),
        "off" | "false" | "0" | "hide" => Some(false),
        _ => None,
    }
}

fn parse_point(parts: &[&str]) -> Option<Vec2> {
    let x = parts.first()?.parse().ok()?;
    let y = parts.get(1)?.parse().ok()?;
    Some(Vec2::new(x, y))
}

/// Step the clock and fire whatever frames are pending.
fn advance(engine: &mut DemoEngine, clock: &FixedClock, count: u32) {
    let mut rendered = 0;
    for _ in 0..count {
        clock.advance(Duration::milliseconds(FRAME_MS));
        if engine.tick().is_some() {
            rendered += 1;
        }
    }
    let stats = engine.stats();
    if count > 1 || rendered == 0 {
        println!(
            "Rendered {} of {} frame(s); last: {} nodes, {} links",
            rendered, count, stats.nodes, stats.links
        );
    }
}

fn select_by_id(engine: &mut DemoEngine, id: &str) {
    let kind = if engine.store().hazards().iter().any(|h| h.id == id) {
        NodeKind::Hazard
    } else if engine.store().communities().iter().any(|c| c.id == id) {
        NodeKind::Community
    } else {
        println!("No feature with id '{}'", id);
        return;
    };
    engine.select_node(id, kind);
    println!("Selected {} '{}'", kind, id);
}

fn show_nodes(engine: &DemoEngine) {
    let selected = engine.view().selected_node_id();
    println!("{} nodes:", engine.node_buffers().len());
    for node in engine.nodes() {
        let marker = if Some(node.id) == selected { "*" } else { " " };
        let pinned = if node.pinned.is_some() { " (pinned)" } else { "" };
        println!(
            " {} {:<10} {:<14} ({:>7.1}, {:>7.1}) r={:>5.1} {} {}{}",
            marker,
            node.kind.to_string(),
            node.id,
            node.position.x,
            node.position.y,
            node.radius,
            node.color,
            node.name,
            pinned
        );
    }
}

fn show_links(engine: &DemoEngine) {
    let links = engine.links();
    if links.is_empty() {
        println!("No links (links are derived in network mode only)");
        return;
    }
    let buffers = engine.node_buffers();
    println!("{} links:", links.len());
    for link in links {
        println!(
            "  {:<14} -> {:<14} [{:<5}] weight {:.3}",
            buffers.id(link.source, engine.store()),
            buffers.id(link.target, engine.store()),
            link.hazard_type.to_string(),
            link.weight
        );
    }
}

fn show_status(engine: &DemoEngine) {
    let view = engine.view();
    let layers = view.visible_layers;
    let stats = engine.stats();
    println!("Mode:        {}", view.mode);
    println!("Period:      {}", view.time_period);
    println!("Playing:     {}", view.is_playing);
    println!("Speed:       {}x", view.simulation_speed.factor());
    println!(
        "Layers:      heat={} flood={} fire={} air={} communities={} connections={}",
        layers.heat, layers.flood, layers.fire, layers.air, layers.communities, layers.connections
    );
    println!("Selected:    {}", view.selected_node_id().unwrap_or("-"));
    println!("Loop:        {:?}", engine.state());
    println!(
        "Last frame:  #{} {} nodes, {} links, {:.3}ms (avg {:.3}ms)",
        stats.frame,
        stats.nodes,
        stats.links,
        stats.duration_ms,
        engine.timer().average_ms()
    );
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb(color.r, color.g, color.b)
}

/// Rasterise the last recorded frame with a braille canvas and print it.
fn draw(engine: &DemoEngine, cols: u16, rows: u16) {
    let Some(canvas) = engine.canvas() else {
        return;
    };
    let commands = canvas.surface().commands();
    let viewport = engine.viewport();
    let (width, height) = (f64::from(viewport.width), f64::from(viewport.height));
    // Canvas y grows upwards
    let flip = |p: Vec2| (f64::from(p.x), height - f64::from(p.y));

    let area = Rect::new(0, 0, cols.max(10), rows.max(5));
    let mut buffer = Buffer::empty(area);
    Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", engine.view().mode)),
        )
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for command in commands {
                match command {
                    DrawCommand::Line { from, to, stroke } if stroke.color != Color::GRID => {
                        let (x1, y1) = flip(*from);
                        let (x2, y2) = flip(*to);
                        ctx.draw(&CanvasLine {
                            x1,
                            y1,
                            x2,
                            y2,
                            color: term_color(stroke.color),
                        });
                    }
                    DrawCommand::FillCircle {
                        center,
                        radius,
                        paint: Paint::Solid(color),
                    } => {
                        let (x, y) = flip(*center);
                        if *radius < 4.0 {
                            ctx.draw(&Points {
                                coords: &[(x, y)],
                                color: term_color(*color),
                            });
                        } else {
                            ctx.draw(&Circle {
                                x,
                                y,
                                radius: f64::from(*radius),
                                color: term_color(*color),
                            });
                        }
                    }
                    DrawCommand::StrokeCircle { center, radius, stroke } => {
                        let (x, y) = flip(*center);
                        ctx.draw(&Circle {
                            x,
                            y,
                            radius: f64::from(*radius),
                            color: term_color(stroke.color),
                        });
                    }
                    DrawCommand::Text { text, position, .. } => {
                        let (x, y) = flip(*position);
                        ctx.print(x, y, text.clone());
                    }
                    _ => {}
                }
            }
        })
        .render(area, &mut buffer);

    for row in buffer.content().chunks(usize::from(area.width)) {
        let line: String = row.iter().map(ratatui::buffer::Cell::symbol).collect();
        println!("{}", line.trim_end());
    }
}

fn show_help() {
    println!("Commands:");
    println!("  mode <spatial|network>          Switch view mode");
    println!("  layer <name> <on|off>           Toggle heat, flood, fire, air, communities, connections");
    println!("  period <past|present|future|all> Select the time window");
    println!("  anchor <rfc3339|now>            Pin the time-filter anchor");
    println!("  speed <0.5|1|2>                 Particle speed multiplier");
    println!("  play | pause                    Toggle playback");
    println!("  frame [n]                       Advance {}ms and fire pending frames", FRAME_MS);
    println!("  click <x> <y>                   Click at client coordinates");
    println!("  down <x> <y> | move <x> <y> | up  Drag a node");
    println!("  select <id>                     Select from the side-panel list");
    println!("  clear                           Clear the selection");
    println!("  nodes | links | events | status");
    println!("  draw [cols] [rows]              Rasterise the last frame");
    println!("  help | quit");
}
