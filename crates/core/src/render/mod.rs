//! Renderer: paints one frame onto a [`Surface`].
//!
//! Draw order per frame:
//! 1. background (grid in spatial mode, starfield on a dark fill in network mode)
//! 2. links, each with one particle travelling source → target
//! 3. nodes: pulsing radial halo, then a glowing solid disc
//! 4. labels under nodes
//! 5. dashed selection ring around the selected node

mod starfield;
mod surface;

pub use starfield::{Star, Starfield};
pub use surface::{
    DrawCommand, Paint, RadialGradient, RecordingSurface, Shadow, Stroke, Surface, TextStyle,
};

use crate::config::EngineConfig;
use crate::core_types::{hazard_color, lerp, Color, Vec2};
use crate::layout::{NodeBuffers, Viewport};
use crate::links::Link;
use crate::store::FeatureStore;
use crate::view::{Mode, ViewState};
use std::f64::consts::TAU;

/// Times driving one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Wall-clock seconds, drives pulses, twinkle and particle flow
    pub seconds: f64,
    /// Scaled seconds fed to the layout engine
    pub layout: f64,
}

impl FrameTime {
    #[must_use]
    pub fn from_seconds(seconds: f64, config: &EngineConfig) -> Self {
        Self {
            seconds,
            layout: seconds * config.orbit_time_scale,
        }
    }
}

/// Everything the renderer reads for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub store: &'a FeatureStore,
    pub nodes: &'a NodeBuffers,
    pub links: &'a [Link],
    pub view: &'a ViewState,
    pub viewport: Viewport,
    pub time: FrameTime,
    /// Device pixels per CSS pixel
    pub pixel_ratio: f32,
}

/// Fraction of the way along a link the particle sits: `(t * speed) mod 1`.
#[must_use]
pub fn flow_phase(seconds: f64, flow_speed: f64, simulation_speed: f64) -> f32 {
    (seconds * flow_speed * simulation_speed).rem_euclid(1.0) as f32
}

/// Halo radius for a node of `radius` at `seconds`.
#[must_use]
pub fn halo_radius(radius: f32, seconds: f64, config: &EngineConfig) -> f32 {
    let wave = (seconds * config.pulse_frequency).rem_euclid(TAU).sin() as f32;
    radius * (1.6 + config.pulse_amplitude * wave)
}

/// Stateful renderer; the only state is the cached starfield.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    starfield: Starfield,
}

impl Renderer {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            starfield: Starfield::new(config.star_seed, config.star_count),
        }
    }

    #[must_use]
    pub fn starfield(&self) -> &Starfield {
        &self.starfield
    }

    pub fn render(&mut self, surface: &mut dyn Surface, scene: &Scene<'_>, config: &EngineConfig) {
        let vp = scene.viewport;
        surface.clear(vp.width, vp.height);
        match scene.view.mode {
            Mode::Spatial => draw_grid(surface, vp, config),
            Mode::Network => {
                self.starfield.ensure(config.star_seed, config.star_count);
                draw_starfield(surface, &self.starfield, vp, scene.time.seconds);
            }
        }
        draw_links(surface, scene, config);
        draw_nodes(surface, scene, config);
        draw_labels(surface, scene, config);
        draw_selection(surface, scene, config);
    }
}

fn draw_grid(surface: &mut dyn Surface, vp: Viewport, config: &EngineConfig) {
    surface.fill_rect(Vec2::zeros(), Vec2::new(vp.width, vp.height), Color::BACKGROUND_LIGHT);
    if config.grid_spacing <= 0.0 {
        return;
    }
    let stroke = Stroke::solid(Color::GRID, 1.0);
    let mut x = 0.0;
    while x <= vp.width {
        surface.stroke_line(Vec2::new(x, 0.0), Vec2::new(x, vp.height), &stroke);
        x += config.grid_spacing;
    }
    let mut y = 0.0;
    while y <= vp.height {
        surface.stroke_line(Vec2::new(0.0, y), Vec2::new(vp.width, y), &stroke);
        y += config.grid_spacing;
    }
}

fn draw_starfield(surface: &mut dyn Surface, field: &Starfield, vp: Viewport, seconds: f64) {
    surface.fill_rect(Vec2::zeros(), Vec2::new(vp.width, vp.height), Color::BACKGROUND_DARK);
    for star in field.stars() {
        let center = Vec2::new(star.position.x * vp.width, star.position.y * vp.height);
        let color = Color::STAR.with_alpha(Starfield::twinkle(star, seconds));
        surface.fill_circle(center, star.radius, &Paint::Solid(color));
    }
}

fn draw_links(surface: &mut dyn Surface, scene: &Scene<'_>, config: &EngineConfig) {
    let phase = flow_phase(
        scene.time.seconds,
        config.flow_speed,
        scene.view.simulation_speed.factor(),
    );
    for link in scene.links {
        let color = hazard_color(link.hazard_type);
        let from = scene.nodes.position(link.source);
        let to = scene.nodes.position(link.target);
        let stroke = Stroke::solid(
            color.with_alpha(0.15 + 0.6 * link.weight),
            1.0 + 2.0 * link.weight,
        );
        surface.stroke_line(from, to, &stroke);

        let particle = lerp(from, to, phase);
        surface.fill_circle(
            particle,
            2.0 + 1.5 * link.weight,
            &Paint::Solid(color.with_alpha(0.5 + 0.5 * link.weight)),
        );
    }
}

fn draw_nodes(surface: &mut dyn Surface, scene: &Scene<'_>, config: &EngineConfig) {
    let nodes = scene.nodes;
    for i in 0..nodes.len() {
        let center = nodes.position(i);
        let radius = nodes.radius(i);
        let color = nodes.color(i);
        let halo = halo_radius(radius, scene.time.seconds, config);

        surface.set_shadow(None);
        surface.fill_circle(
            center,
            halo,
            &Paint::Radial(RadialGradient {
                center,
                inner_radius: radius * 0.5,
                outer_radius: halo,
                inner: color.with_alpha(0.45),
                outer: color.with_alpha(0.0),
            }),
        );

        surface.set_shadow(Some(Shadow {
            blur: config.glow_blur,
            color,
        }));
        surface.fill_circle(center, radius, &Paint::Solid(color));
    }
    surface.set_shadow(None);
}

fn draw_labels(surface: &mut dyn Surface, scene: &Scene<'_>, config: &EngineConfig) {
    let style = TextStyle {
        color: match scene.view.mode {
            Mode::Spatial => Color::LABEL_DARK,
            Mode::Network => Color::LABEL,
        },
        size: config.label_size,
    };
    for i in 0..scene.nodes.len() {
        let node = scene.nodes.node(i, scene.store);
        let anchor = node.position + Vec2::new(0.0, node.radius + config.label_size + 2.0);
        surface.fill_text(node.name, anchor, &style);
    }
}

fn draw_selection(surface: &mut dyn Surface, scene: &Scene<'_>, config: &EngineConfig) {
    let Some(selected) = &scene.view.selected else {
        return;
    };
    // A filtered-out selection keeps its state but draws nothing.
    let Some(i) = scene.nodes.find(selected.kind, &selected.id, scene.store) else {
        return;
    };
    let stroke = Stroke {
        color: Color::SELECTION,
        width: 2.0,
        dash: Some([5.0, 4.0]),
    };
    let radius = config.selection_ring_radius * scene.pixel_ratio;
    surface.stroke_circle(scene.nodes.position(i), radius, &stroke);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{CommunityFeature, HazardFeature, HazardType};
    use crate::layout::{compute_layout, LayoutInput, NodeKind, PinSet, VisibleSet};
    use crate::links::{derive_links, link_threshold};
    use crate::view::Selection;
    use approx::assert_relative_eq;

    fn store() -> FeatureStore {
        FeatureStore::new(
            vec![HazardFeature {
                id: "h".into(),
                hazard_type: HazardType::Flood,
                name: "River".into(),
                severity: 0.5,
                observed_at: chrono::DateTime::UNIX_EPOCH,
            }],
            vec![CommunityFeature {
                id: "c".into(),
                name: "Town".into(),
                population: 20_000,
                vulnerability_index: 0.4,
            }],
        )
    }

    fn render(view: &ViewState, config: &EngineConfig) -> RecordingSurface {
        render_at(view, config, 1.0)
    }

    fn render_at(view: &ViewState, config: &EngineConfig, pixel_ratio: f32) -> RecordingSurface {
        let store = store();
        let visible = VisibleSet {
            hazards: vec![0],
            communities: vec![0],
        };
        let viewport = Viewport::new(400.0, 400.0);
        let time = FrameTime::from_seconds(2.0, config);
        let mut nodes = NodeBuffers::default();
        let input = LayoutInput {
            store: &store,
            visible: &visible,
            mode: view.mode,
            viewport,
            time: time.layout,
        };
        compute_layout(&input, config, &PinSet::default(), &mut nodes);
        let mut links = Vec::new();
        derive_links(
            &nodes,
            &store,
            &view.visible_layers,
            link_threshold(view.mode, viewport, config),
            &mut links,
        );
        let scene = Scene {
            store: &store,
            nodes: &nodes,
            links: &links,
            view,
            viewport,
            time,
            pixel_ratio,
        };
        let mut surface = RecordingSurface::new();
        Renderer::new(config).render(&mut surface, &scene, config);
        surface
    }

    #[test]
    fn test_flow_phase_wraps() {
        assert_relative_eq!(flow_phase(3.0, 0.5, 1.0), 0.5);
        assert_relative_eq!(flow_phase(3.0, 0.5, 2.0), 0.0);
        assert!((0.0..1.0).contains(&flow_phase(1.7e9, 0.5, 0.5)));
    }

    #[test]
    fn test_halo_oscillates_around_base() {
        let config = EngineConfig::default();
        let samples: Vec<f32> = (0..20)
            .map(|i| halo_radius(10.0, f64::from(i) * 0.1, &config))
            .collect();
        let max = samples.iter().copied().fold(f32::MIN, f32::max);
        let min = samples.iter().copied().fold(f32::MAX, f32::min);
        assert!(max > 16.0 && min < 16.0);
        assert!(max <= 16.0 + 2.5 + 1e-4);
    }

    #[test]
    fn test_spatial_frame_order() {
        let config = EngineConfig::default();
        let surface = render(&ViewState::default(), &config);
        let cmds = surface.commands();
        assert!(matches!(cmds[0], DrawCommand::Clear { .. }));
        assert!(matches!(
            cmds[1],
            DrawCommand::FillRect { color, .. } if color == Color::BACKGROUND_LIGHT
        ));
        let first_text = cmds
            .iter()
            .position(|c| matches!(c, DrawCommand::Text { .. }))
            .unwrap();
        let last_circle = cmds
            .iter()
            .rposition(|c| matches!(c, DrawCommand::FillCircle { .. }))
            .unwrap();
        assert!(last_circle < first_text);
        // Every line is a grid line: no links in spatial mode
        let is_link = |c: &DrawCommand| {
            matches!(c, DrawCommand::Line { stroke, .. } if stroke.color != Color::GRID)
        };
        assert!(!cmds.iter().any(is_link));
    }

    #[test]
    fn test_network_frame_has_stars_links_and_ring() {
        let config = EngineConfig::default();
        let view = ViewState {
            mode: Mode::Network,
            selected: Some(Selection {
                id: "c".into(),
                kind: NodeKind::Community,
            }),
            ..ViewState::default()
        };
        let surface = render(&view, &config);
        let cmds = surface.commands();

        let solid_circles = cmds
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillCircle { paint: Paint::Solid(_), .. }))
            .count();
        // stars + one particle + two node discs
        assert_eq!(solid_circles, config.star_count + 1 + 2);
        assert_eq!(
            cmds.iter()
                .filter(|c| matches!(c, DrawCommand::Line { .. }))
                .count(),
            1
        );
        let ring = cmds.last().unwrap();
        assert!(matches!(
            ring,
            DrawCommand::StrokeCircle { radius, stroke, .. }
                if *radius == config.selection_ring_radius && stroke.dash.is_some()
        ));
    }

    #[test]
    fn test_selection_ring_keeps_screen_size() {
        let config = EngineConfig::default();
        let view = ViewState {
            selected: Some(Selection {
                id: "h".into(),
                kind: NodeKind::Hazard,
            }),
            ..ViewState::default()
        };
        let surface = render_at(&view, &config, 2.0);
        let Some(DrawCommand::StrokeCircle { radius, .. }) = surface.commands().last() else {
            panic!("selection ring drawn last");
        };
        assert_relative_eq!(*radius, config.selection_ring_radius * 2.0);
    }
}
