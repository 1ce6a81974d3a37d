//! Layout engine: node placement per render mode.
//!
//! Placement is a pure function of `(visible features, mode, canvas size, time)`.
//! Nothing here may draw on randomness: the click handler recomputes these
//! positions and must land on exactly what was drawn.
//!
//! # Modes
//!
//! - **Spatial**: hazards evenly spaced on a row at 30% height, communities on a
//!   row at 70% height.
//! - **Network**: hazards on an outer ring, communities on an inner ring, both
//!   centred on the canvas and rotating in opposite directions with time.

mod nodes;

pub use nodes::{node_id, Node, NodeBuffers, NodeKind};

use crate::config::EngineConfig;
use crate::core_types::{hazard_color, vulnerability_color, Vec2};
use crate::store::{filter_indices, FeatureStore};
use crate::view::{Mode, ViewState};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use std::f64::consts::TAU;

/// Canvas-buffer size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Hazard node radius: `severity * 20 + 10`.
#[must_use]
pub fn hazard_radius(severity: f32) -> f32 {
    severity * 20.0 + 10.0
}

/// Community node radius: `min(population / 10000, 15) + 5`.
#[must_use]
pub fn community_radius(population: u32) -> f32 {
    (population as f32 / 10_000.0).min(15.0) + 5.0
}

/// Position of item `index` of `count` on an evenly spaced row.
#[must_use]
pub fn row_position(index: usize, count: usize, width: f32, y: f32) -> Vec2 {
    let x = (index + 1) as f32 * width / (count + 1) as f32;
    Vec2::new(x, y)
}

/// Position of item `index` of `count` on a ring rotating at `angular_speed`.
///
/// The rotation term is reduced modulo 2π in f64 before narrowing, so epoch-scale
/// times keep sub-pixel precision.
#[must_use]
pub fn ring_position(
    index: usize,
    count: usize,
    center: Vec2,
    radius: f32,
    time: f64,
    angular_speed: f64,
) -> Vec2 {
    let base = TAU * index as f64 / count.max(1) as f64;
    let angle = (base + (time * angular_speed).rem_euclid(TAU)) as f32;
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Drag overrides keyed by node kind and id.
///
/// One map per kind so lookups borrow the feature id; layout queries every
/// visible node each frame while a drag is active.
#[derive(Debug, Clone, Default)]
pub struct PinSet {
    hazards: FxHashMap<String, Vec2>,
    communities: FxHashMap<String, Vec2>,
}

impl PinSet {
    fn map(&self, kind: NodeKind) -> &FxHashMap<String, Vec2> {
        match kind {
            NodeKind::Hazard => &self.hazards,
            NodeKind::Community => &self.communities,
        }
    }

    fn map_mut(&mut self, kind: NodeKind) -> &mut FxHashMap<String, Vec2> {
        match kind {
            NodeKind::Hazard => &mut self.hazards,
            NodeKind::Community => &mut self.communities,
        }
    }

    pub fn pin(&mut self, kind: NodeKind, id: &str, position: Vec2) {
        let map = self.map_mut(kind);
        if let Some(slot) = map.get_mut(id) {
            *slot = position;
        } else {
            map.insert(id.to_owned(), position);
        }
    }

    pub fn unpin(&mut self, kind: NodeKind, id: &str) -> Option<Vec2> {
        self.map_mut(kind).remove(id)
    }

    #[must_use]
    pub fn get(&self, kind: NodeKind, id: &str) -> Option<Vec2> {
        self.map(kind).get(id).copied()
    }

    pub fn clear(&mut self) {
        self.hazards.clear();
        self.communities.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hazards.len() + self.communities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty() && self.communities.is_empty()
    }
}

/// Indices of features that pass the time filter and layer toggles.
#[derive(Debug, Clone, Default)]
pub struct VisibleSet {
    pub hazards: Vec<usize>,
    pub communities: Vec<usize>,
}

impl VisibleSet {
    /// Recompute the visible feature indices, reusing capacity.
    pub fn rebuild(&mut self, store: &FeatureStore, view: &ViewState, anchor: DateTime<Utc>) {
        let layers = view.visible_layers;
        filter_indices(store.hazards(), view.time_period, anchor, &mut self.hazards);
        let hazards = store.hazards();
        self.hazards
            .retain(|&i| layers.hazard(hazards[i].hazard_type));

        self.communities.clear();
        if layers.communities {
            self.communities.extend(0..store.communities().len());
        }
    }
}

/// Everything a layout pass reads.
#[derive(Debug, Clone, Copy)]
pub struct LayoutInput<'a> {
    pub store: &'a FeatureStore,
    pub visible: &'a VisibleSet,
    pub mode: Mode,
    pub viewport: Viewport,
    /// Layout time in scaled seconds
    pub time: f64,
}

fn hazard_position(
    index: usize,
    count: usize,
    input: &LayoutInput<'_>,
    config: &EngineConfig,
) -> Vec2 {
    let vp = input.viewport;
    match input.mode {
        Mode::Spatial => row_position(index, count, vp.width, vp.height * config.hazard_row),
        Mode::Network => ring_position(
            index,
            count,
            vp.center(),
            vp.min_side() * config.outer_ring,
            input.time,
            config.outer_angular_speed,
        ),
    }
}

fn community_position(
    index: usize,
    count: usize,
    input: &LayoutInput<'_>,
    config: &EngineConfig,
) -> Vec2 {
    let vp = input.viewport;
    match input.mode {
        Mode::Spatial => row_position(index, count, vp.width, vp.height * config.community_row),
        Mode::Network => ring_position(
            index,
            count,
            vp.center(),
            vp.min_side() * config.inner_ring,
            input.time,
            config.inner_angular_speed,
        ),
    }
}

/// Compute every visible node into `out`: hazards first, in feature order, then
/// communities. Pinned nodes take their pin position verbatim.
pub fn compute_layout(
    input: &LayoutInput<'_>,
    config: &EngineConfig,
    pins: &PinSet,
    out: &mut NodeBuffers,
) {
    out.clear();
    let hazards = input.store.hazards();
    let communities = input.store.communities();

    let n = input.visible.hazards.len();
    for (i, &fi) in input.visible.hazards.iter().enumerate() {
        let feature = &hazards[fi];
        let pin = pins.get(NodeKind::Hazard, &feature.id);
        let position = pin.unwrap_or_else(|| hazard_position(i, n, input, config));
        out.push(
            NodeKind::Hazard,
            fi,
            position,
            hazard_radius(feature.severity),
            hazard_color(feature.hazard_type),
            pin.is_some(),
        );
    }

    let m = input.visible.communities.len();
    for (j, &fj) in input.visible.communities.iter().enumerate() {
        let feature = &communities[fj];
        let pin = pins.get(NodeKind::Community, &feature.id);
        let position = pin.unwrap_or_else(|| community_position(j, m, input, config));
        out.push(
            NodeKind::Community,
            fj,
            position,
            community_radius(feature.population),
            vulnerability_color(feature.vulnerability_index),
            pin.is_some(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{CommunityFeature, HazardFeature, HazardType};
    use approx::assert_relative_eq;

    fn store() -> FeatureStore {
        let hazards = (0..3)
            .map(|i| HazardFeature {
                id: format!("h{i}"),
                hazard_type: if i == 1 { HazardType::Flood } else { HazardType::Heat },
                name: format!("Hazard {i}"),
                severity: 0.25 * i as f32,
                observed_at: chrono::DateTime::UNIX_EPOCH,
            })
            .collect();
        let communities = (0..2)
            .map(|j| CommunityFeature {
                id: format!("c{j}"),
                name: format!("Community {j}"),
                population: 50_000 * (j + 1),
                vulnerability_index: 0.5,
            })
            .collect();
        FeatureStore::new(hazards, communities)
    }

    fn all_visible(store: &FeatureStore) -> VisibleSet {
        VisibleSet {
            hazards: (0..store.hazards().len()).collect(),
            communities: (0..store.communities().len()).collect(),
        }
    }

    #[test]
    fn test_radius_formulas() {
        assert_relative_eq!(hazard_radius(0.0), 10.0);
        assert_relative_eq!(hazard_radius(1.0), 30.0);
        assert_relative_eq!(community_radius(50_000), 10.0);
        assert_relative_eq!(community_radius(10_000_000), 20.0);
    }

    #[test]
    fn test_radius_monotonic() {
        let severities = [0.0, 0.1, 0.35, 0.8, 1.0];
        for pair in severities.windows(2) {
            assert!(hazard_radius(pair[1]) > hazard_radius(pair[0]));
        }
        let populations = [0, 1_000, 20_000, 140_000];
        for pair in populations.windows(2) {
            assert!(community_radius(pair[1]) > community_radius(pair[0]));
        }
        // Capped past 150k
        assert_relative_eq!(community_radius(150_000), community_radius(900_000));
    }

    #[test]
    fn test_spatial_rows() {
        let store = store();
        let visible = all_visible(&store);
        let input = LayoutInput {
            store: &store,
            visible: &visible,
            mode: Mode::Spatial,
            viewport: Viewport::new(800.0, 600.0),
            time: 123.0,
        };
        let mut out = NodeBuffers::default();
        compute_layout(&input, &EngineConfig::default(), &PinSet::default(), &mut out);

        assert_eq!(out.len(), 5);
        assert_eq!(out.hazard_range(), 0..3);
        assert_relative_eq!(out.position(0).x, 200.0);
        assert_relative_eq!(out.position(2).x, 600.0);
        assert_relative_eq!(out.position(0).y, 180.0);
        let c0 = out.community_range().start;
        assert_relative_eq!(out.position(c0).x, 800.0 / 3.0);
        assert_relative_eq!(out.position(c0).y, 420.0);
    }

    #[test]
    fn test_network_rings_and_counter_rotation() {
        let store = store();
        let visible = all_visible(&store);
        let config = EngineConfig::default();
        let viewport = Viewport::new(800.0, 600.0);
        let mut out = NodeBuffers::default();

        let at = |time: f64, out: &mut NodeBuffers| {
            let input = LayoutInput {
                store: &store,
                visible: &visible,
                mode: Mode::Network,
                viewport,
                time,
            };
            compute_layout(&input, &config, &PinSet::default(), out);
        };

        at(0.0, &mut out);
        let center = viewport.center();
        assert_relative_eq!((out.position(0) - center).norm(), 150.0, epsilon = 1e-3);
        assert_relative_eq!((out.position(3) - center).norm(), 90.0, epsilon = 1e-3);
        let h0 = out.position(0) - center;
        let c0 = out.position(3) - center;

        at(1.0, &mut out);
        let h1 = out.position(0) - center;
        let c1 = out.position(3) - center;
        let turn = |a: Vec2, b: Vec2| a.perp(&b).atan2(a.dot(&b));
        assert!(turn(h0, h1) > 0.0);
        assert!(turn(c0, c1) < 0.0);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let store = store();
        let visible = all_visible(&store);
        let input = LayoutInput {
            store: &store,
            visible: &visible,
            mode: Mode::Network,
            viewport: Viewport::new(640.0, 480.0),
            time: 1_700_000_000.25,
        };
        let mut a = NodeBuffers::default();
        let mut b = NodeBuffers::default();
        compute_layout(&input, &EngineConfig::default(), &PinSet::default(), &mut a);
        compute_layout(&input, &EngineConfig::default(), &PinSet::default(), &mut b);
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn test_pin_overrides_formula() {
        let store = store();
        let visible = all_visible(&store);
        let mut pins = PinSet::default();
        pins.pin(NodeKind::Hazard, "h1", Vec2::new(50.0, 50.0));
        let input = LayoutInput {
            store: &store,
            visible: &visible,
            mode: Mode::Network,
            viewport: Viewport::new(640.0, 480.0),
            time: 42.0,
        };
        let mut out = NodeBuffers::default();
        compute_layout(&input, &EngineConfig::default(), &pins, &mut out);
        assert_eq!(out.position(1), Vec2::new(50.0, 50.0));
        assert!(out.is_pinned(1));
        assert!(!out.is_pinned(0));
        assert_eq!(out.node(1, &store).pinned, Some(Vec2::new(50.0, 50.0)));
    }

    #[test]
    fn test_pins_are_per_kind() {
        let mut pins = PinSet::default();
        pins.pin(NodeKind::Hazard, "x", Vec2::new(1.0, 2.0));
        pins.pin(NodeKind::Hazard, "x", Vec2::new(3.0, 4.0));
        assert_eq!(pins.len(), 1);
        assert_eq!(pins.get(NodeKind::Hazard, "x"), Some(Vec2::new(3.0, 4.0)));
        assert_eq!(pins.get(NodeKind::Community, "x"), None);

        pins.pin(NodeKind::Community, "x", Vec2::new(5.0, 6.0));
        assert_eq!(pins.unpin(NodeKind::Hazard, "x"), Some(Vec2::new(3.0, 4.0)));
        assert_eq!(pins.get(NodeKind::Community, "x"), Some(Vec2::new(5.0, 6.0)));
        pins.clear();
        assert!(pins.is_empty());
    }

    #[test]
    fn test_visible_set_respects_layers() {
        let store = store();
        let mut view = ViewState::default();
        view.visible_layers.heat = false;
        view.visible_layers.communities = false;
        let mut visible = VisibleSet::default();
        visible.rebuild(&store, &view, Utc::now());
        assert_eq!(visible.hazards, vec![1]);
        assert!(visible.communities.is_empty());
    }
}
