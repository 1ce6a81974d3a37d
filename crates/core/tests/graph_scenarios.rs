//! End-to-end frame scenarios driven through the headless host.

use approx::assert_relative_eq;
use chrono::{DateTime, TimeZone, Utc};
use ctor::ctor;
use hazard_graph_core::render::{DrawCommand, Paint};
use hazard_graph_core::view::Layer;
use hazard_graph_core::{
    CommunityFeature, Engine, EngineConfig, EngineEvent, FeatureStore, FixedClock, HazardFeature,
    HazardType, HeadlessCanvas, HeadlessHost, Mode, NodeKind, RejectReason, TimePeriod, Vec2,
};

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

type TestEngine = Engine<HeadlessCanvas, HeadlessHost>;

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).unwrap()
}

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

fn hazard(id: &str, hazard_type: HazardType, severity: f32) -> HazardFeature {
    HazardFeature {
        id: id.into(),
        hazard_type,
        name: id.to_uppercase(),
        severity,
        observed_at: anchor(),
    }
}

fn community(id: &str, population: u32, vulnerability_index: f32) -> CommunityFeature {
    CommunityFeature {
        id: id.into(),
        name: id.to_uppercase(),
        population,
        vulnerability_index,
    }
}

/// Engine whose layout time is zero: the clock sits at the Unix epoch and the
/// time filter is anchored separately.
fn engine_at_epoch(
    store: FeatureStore,
    config: EngineConfig,
    canvas: HeadlessCanvas,
) -> TestEngine {
    let mut engine = Engine::mount_with_clock(
        Some(canvas),
        HeadlessHost::new(),
        store,
        config,
        Box::new(FixedClock::new(epoch())),
    );
    engine.set_time_anchor(Some(anchor()));
    engine
}

fn sample_store() -> FeatureStore {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/sample_features.json");
    let (store, report) = FeatureStore::from_path(path).expect("sample dataset loads");
    // hz-heat-02 has no observedAt
    assert_eq!(
        report.rejected,
        vec![("hz-heat-02".to_string(), RejectReason::MissingTimestamp)]
    );
    store
}

#[test]
fn test_single_pair_network_link_weight() {
    let store = FeatureStore::new(
        vec![hazard("h", HazardType::Flood, 1.0)],
        vec![community("c", 500_000, 0.8)],
    );
    let config = EngineConfig {
        outer_ring: 0.35,
        inner_ring: 0.15,
        ..EngineConfig::default()
    };
    let mut engine = engine_at_epoch(store, config, HeadlessCanvas::new(500.0, 500.0, 1.0));
    engine.set_time_period(TimePeriod::Present);
    engine.set_mode(Mode::Network);

    let stats = engine.tick().expect("frame rendered");
    assert_eq!(stats.nodes, 2);
    assert_eq!(stats.links, 1);

    // Both rings start at angle 0: hazard at 250 + 175, community at 250 + 75
    let nodes: Vec<_> = engine.nodes().collect();
    assert_relative_eq!(nodes[0].position.x, 425.0, epsilon = 1e-3);
    assert_relative_eq!(nodes[1].position.x, 325.0, epsilon = 1e-3);

    let link = engine.links()[0];
    assert_eq!((link.source, link.target), (0, 1));
    assert_eq!(link.hazard_type, HazardType::Flood);
    assert_relative_eq!(link.weight, 0.5, epsilon = 1e-4);
}

#[test]
fn test_links_respect_layer_toggles() {
    let store = FeatureStore::new(
        vec![
            hazard("fire", HazardType::Fire, 0.8),
            hazard("heat", HazardType::Heat, 0.2),
        ],
        vec![community("a", 1_000, 0.1), community("b", 1_000, 0.9)],
    );
    // Threshold larger than any ring distance: every pair links
    let config = EngineConfig {
        link_threshold: 2.0,
        ..EngineConfig::default()
    };
    let mut engine = engine_at_epoch(store, config, HeadlessCanvas::new(400.0, 400.0, 1.0));
    engine.set_mode(Mode::Network);
    assert_eq!(engine.tick().unwrap().links, 4);

    engine.set_layer(Layer::Hazard(HazardType::Heat), false);
    engine.tick().unwrap();
    assert_eq!(engine.nodes().filter(|n| n.kind == NodeKind::Hazard).count(), 1);
    assert_eq!(engine.links().len(), 2);
    assert!(engine.links().iter().all(|l| l.hazard_type == HazardType::Fire));

    engine.set_layer(Layer::Connections, false);
    let stats = engine.tick().unwrap();
    assert_eq!(stats.links, 0);
    assert_eq!(stats.nodes, 3);

    engine.set_layer(Layer::Communities, false);
    engine.set_layer(Layer::Connections, true);
    let stats = engine.tick().unwrap();
    assert_eq!(stats.nodes, 1);
    assert_eq!(stats.links, 0);
}

#[test]
fn test_hidden_layer_leaves_hit_candidates() {
    let store = FeatureStore::new(
        vec![
            hazard("heat", HazardType::Heat, 0.5),
            hazard("flood", HazardType::Flood, 0.5),
        ],
        vec![],
    );
    let mut engine = engine_at_epoch(
        store,
        EngineConfig::default(),
        HeadlessCanvas::new(300.0, 200.0, 1.0),
    );
    engine.tick().unwrap();
    // Row of two at x = 100, 200 (y = 60)
    let heat_at = Vec2::new(100.0, 60.0);
    assert_eq!(engine.pointer_click(heat_at), Some("heat".into()));

    engine.set_layer(Layer::Hazard(HazardType::Heat), false);
    engine.tick().unwrap();
    assert!(engine.nodes().all(|n| n.id != "heat"));
    // The flood node is now alone at the centre of the row
    assert_eq!(engine.nodes().next().unwrap().position, Vec2::new(150.0, 60.0));
    assert_eq!(engine.pointer_click(heat_at), None);
}

#[test]
fn test_time_periods_on_sample_data() {
    let store = sample_store();
    let mut engine = engine_at_epoch(
        store,
        EngineConfig::default(),
        HeadlessCanvas::new(800.0, 600.0, 1.0),
    );
    engine.set_layer(Layer::Communities, false);

    let mut counts = Vec::new();
    for period in TimePeriod::ALL_PERIODS {
        engine.set_time_period(period);
        counts.push((period, engine.tick().unwrap().nodes));
    }
    assert_eq!(
        counts,
        vec![
            (TimePeriod::Past, 2),
            (TimePeriod::Present, 5),
            (TimePeriod::Future, 3),
            (TimePeriod::All, 7),
        ]
    );
}

#[test]
fn test_undated_hazard_never_reaches_the_frame() {
    let json = r#"{
        "hazards": [
            { "id": "undated", "hazardType": "heat", "severity": 0.5 },
            { "id": "garbled", "hazardType": "flood", "severity": 0.5, "observedAt": "soon" }
        ],
        "communities": [
            { "id": "c", "population": 1000, "vulnerabilityIndex": 0.5 }
        ]
    }"#;
    let (store, report) = FeatureStore::from_json_str(json).unwrap();
    assert_eq!(report.hazards_accepted, 0);
    assert_eq!(report.communities_accepted, 1);
    assert!(report
        .rejected
        .iter()
        .all(|(_, reason)| *reason == RejectReason::MissingTimestamp));
    assert_eq!(report.rejected_count(), 2);

    let config = EngineConfig {
        link_threshold: 2.0,
        ..EngineConfig::default()
    };
    let mut engine = engine_at_epoch(store, config, HeadlessCanvas::new(300.0, 200.0, 1.0));
    engine.set_time_period(TimePeriod::All);
    let stats = engine.tick().unwrap();
    assert_eq!(stats.nodes, 1);
    assert_eq!(stats.links, 0);
    assert!(engine.nodes().all(|n| n.kind == NodeKind::Community));
    // Where a lone hazard would sit in the hazard row
    assert_eq!(engine.pointer_click(Vec2::new(150.0, 60.0)), None);

    engine.set_mode(Mode::Network);
    let stats = engine.tick().unwrap();
    assert_eq!((stats.nodes, stats.links), (1, 0));
}

#[test]
fn test_click_resolves_exactly_what_was_drawn() {
    let store = FeatureStore::new(
        vec![hazard("h", HazardType::Heat, 0.5)],
        vec![community("c", 0, 0.5)],
    );
    // 200x150 CSS at dpr 2, offset in the page
    let mut canvas = HeadlessCanvas::new(200.0, 150.0, 2.0);
    canvas.rect.left = 10.0;
    canvas.rect.top = 20.0;
    let mut engine = engine_at_epoch(store, EngineConfig::default(), canvas);
    engine.tick().unwrap();

    // Hazard drawn at buffer (200, 90) with radius 20; margin 5
    let drawn = engine.nodes().next().unwrap();
    assert_eq!(drawn.position, Vec2::new(200.0, 90.0));
    assert_relative_eq!(drawn.radius, 20.0);

    let to_client = |x: f32, y: f32| Vec2::new(10.0 + x / 2.0, 20.0 + y / 2.0);
    assert_eq!(engine.pointer_click(to_client(224.8, 90.0)), Some("h".into()));
    assert_eq!(engine.view().selected_node_id(), Some("h"));
    assert_eq!(engine.pointer_click(to_client(225.2, 90.0)), None);
    assert!(engine.view().selected.is_none());

    assert_eq!(
        engine.drain_events(),
        vec![
            EngineEvent::NodeSelected {
                id: "h".into(),
                kind: NodeKind::Hazard
            },
            EngineEvent::SelectionCleared,
        ]
    );
}

#[test]
fn test_network_canvas_click_clears_and_list_selects() {
    let mut engine = engine_at_epoch(
        sample_store(),
        EngineConfig::default(),
        HeadlessCanvas::new(600.0, 600.0, 1.0),
    );
    engine.set_mode(Mode::Network);
    engine.tick().unwrap();

    engine.select_node("cm-03", NodeKind::Community);
    engine.tick().unwrap();
    let ring = engine
        .canvas()
        .unwrap()
        .surface()
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::StrokeCircle { stroke, .. } if stroke.dash.is_some()))
        .count();
    assert_eq!(ring, 1);

    let centre = Vec2::new(300.0, 300.0);
    assert_eq!(engine.pointer_click(centre), None);
    assert!(engine.view().selected.is_none());
    assert_eq!(
        engine.drain_events(),
        vec![
            EngineEvent::NodeSelected {
                id: "cm-03".into(),
                kind: NodeKind::Community
            },
            EngineEvent::SelectionCleared,
        ]
    );
}

#[test]
fn test_selection_ring_scales_with_device_pixel_ratio() {
    let store = FeatureStore::new(vec![hazard("h", HazardType::Heat, 0.5)], vec![]);
    let config = EngineConfig::default();
    let ring = config.selection_ring_radius;
    let mut engine = engine_at_epoch(store, config, HeadlessCanvas::new(200.0, 150.0, 2.0));
    engine.select_node("h", NodeKind::Hazard);
    engine.tick().unwrap();

    let radii: Vec<f32> = engine
        .canvas()
        .unwrap()
        .surface()
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::StrokeCircle { radius, stroke, .. } if stroke.dash.is_some() => {
                Some(*radius)
            }
            _ => None,
        })
        .collect();
    assert_eq!(radii, vec![ring * 2.0]);
}

#[test]
fn test_drag_pins_node_until_release() {
    let store = FeatureStore::new(vec![hazard("h", HazardType::Fire, 0.5)], vec![]);
    let mut engine = engine_at_epoch(
        store,
        EngineConfig::default(),
        HeadlessCanvas::new(400.0, 300.0, 1.0),
    );
    engine.set_playing(true);
    engine.tick().unwrap();
    let home = engine.nodes().next().unwrap().position;
    assert_eq!(home, Vec2::new(200.0, 90.0));

    assert!(engine.pointer_down(home));
    engine.pointer_move(Vec2::new(50.0, 50.0));
    for _ in 0..2 {
        engine.tick().unwrap();
        let node = engine.nodes().next().unwrap();
        assert_eq!(node.position, Vec2::new(50.0, 50.0));
        assert!(node.pinned.is_some());
    }

    engine.pointer_up();
    engine.tick().unwrap();
    assert_eq!(engine.nodes().next().unwrap().position, home);
}

#[test]
fn test_identical_inputs_render_identical_frames() {
    let render = || {
        let mut engine = engine_at_epoch(
            sample_store(),
            EngineConfig::default(),
            HeadlessCanvas::new(640.0, 480.0, 1.0),
        );
        engine.set_mode(Mode::Network);
        engine.tick().unwrap();
        engine.canvas().unwrap().surface().commands().to_vec()
    };
    let first = render();
    assert!(!first.is_empty());
    assert_eq!(first, render());
}

#[test]
fn test_nodes_drawn_with_halo_and_disc() {
    let store = FeatureStore::new(vec![hazard("h", HazardType::Fire, 1.0)], vec![]);
    let mut engine = engine_at_epoch(
        store,
        EngineConfig::default(),
        HeadlessCanvas::new(300.0, 200.0, 1.0),
    );
    engine.tick().unwrap();
    let commands = engine.canvas().unwrap().surface().commands();
    let halos = commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::FillCircle { paint: Paint::Radial(_), .. }))
        .count();
    let labels: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(halos, 1);
    assert_eq!(labels, vec!["H"]);
}
