//! Link deriver: proximity relations between hazard and community nodes.

use crate::config::EngineConfig;
use crate::core_types::HazardType;
use crate::layout::{NodeBuffers, Viewport};
use crate::store::FeatureStore;
use crate::view::{Mode, VisibleLayers};
use serde::Serialize;

/// A weighted hazard → community relation for one frame.
///
/// `source` and `target` index into the frame's [`NodeBuffers`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    /// `1 - distance / threshold`, in `[0, 1]`
    pub weight: f32,
    pub hazard_type: HazardType,
}

/// Weight of a link between nodes `distance` apart.
#[must_use]
pub fn link_weight(distance: f32, threshold: f32) -> f32 {
    if threshold <= 0.0 || !distance.is_finite() {
        return 0.0;
    }
    (1.0 - distance / threshold).clamp(0.0, 1.0)
}

/// Distance below which a hazard and a community are linked, or `None` when the
/// mode does not derive links.
#[must_use]
pub fn link_threshold(mode: Mode, viewport: Viewport, config: &EngineConfig) -> Option<f32> {
    match mode {
        Mode::Network => Some(viewport.min_side() * config.link_threshold),
        Mode::Spatial => None,
    }
}

/// Derive the frame's links into `out`.
///
/// Every (hazard, community) pair is visited once, so an unordered pair can
/// produce at most one link. `nodes` only contains visible nodes, so hidden
/// layers never contribute.
pub fn derive_links(
    nodes: &NodeBuffers,
    store: &FeatureStore,
    layers: &VisibleLayers,
    threshold: Option<f32>,
    out: &mut Vec<Link>,
) {
    out.clear();
    let Some(threshold) = threshold else {
        return;
    };
    if !layers.connections {
        return;
    }

    for h in nodes.hazard_range() {
        let hazard_type = store.hazards()[nodes.feature_index(h)].hazard_type;
        let hp = nodes.position(h);
        for c in nodes.community_range() {
            let distance = (nodes.position(c) - hp).norm();
            if distance < threshold {
                out.push(Link {
                    source: h,
                    target: c,
                    weight: link_weight(distance, threshold),
                    hazard_type,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Color, CommunityFeature, HazardFeature, Vec2};
    use crate::layout::NodeKind;
    use approx::assert_relative_eq;

    fn fixture(positions: &[(NodeKind, Vec2)]) -> (FeatureStore, NodeBuffers) {
        let mut hazards = Vec::new();
        let mut communities = Vec::new();
        let mut nodes = NodeBuffers::default();
        for &(kind, pos) in positions {
            match kind {
                NodeKind::Hazard => {
                    nodes.push(kind, hazards.len(), pos, 10.0, Color::GRAY, false);
                    hazards.push(HazardFeature {
                        id: format!("h{}", hazards.len()),
                        hazard_type: HazardType::Fire,
                        name: String::new(),
                        severity: 0.0,
                        observed_at: chrono::DateTime::UNIX_EPOCH,
                    });
                }
                NodeKind::Community => {
                    nodes.push(kind, communities.len(), pos, 5.0, Color::GRAY, false);
                    communities.push(CommunityFeature {
                        id: format!("c{}", communities.len()),
                        name: String::new(),
                        population: 0,
                        vulnerability_index: 0.0,
                    });
                }
            }
        }
        (FeatureStore::new(hazards, communities), nodes)
    }

    #[test]
    fn test_weight_formula() {
        assert_relative_eq!(link_weight(100.0, 200.0), 0.5);
        assert_relative_eq!(link_weight(0.0, 200.0), 1.0);
        assert_relative_eq!(link_weight(250.0, 200.0), 0.0);
        assert_relative_eq!(link_weight(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_links_below_threshold_only() {
        let (store, nodes) = fixture(&[
            (NodeKind::Hazard, Vec2::new(0.0, 0.0)),
            (NodeKind::Community, Vec2::new(100.0, 0.0)),
            (NodeKind::Community, Vec2::new(0.0, 200.0)),
        ]);
        let mut links = Vec::new();
        derive_links(&nodes, &store, &VisibleLayers::default(), Some(200.0), &mut links);
        assert_eq!(links.len(), 1);
        assert_eq!((links[0].source, links[0].target), (0, 1));
        assert_relative_eq!(links[0].weight, 0.5);
        assert_eq!(links[0].hazard_type, HazardType::Fire);
    }

    #[test]
    fn test_no_links_without_connections_layer_or_threshold() {
        let (store, nodes) = fixture(&[
            (NodeKind::Hazard, Vec2::new(0.0, 0.0)),
            (NodeKind::Community, Vec2::new(1.0, 0.0)),
        ]);
        let mut links = vec![];
        let mut layers = VisibleLayers::default();
        derive_links(&nodes, &store, &layers, None, &mut links);
        assert!(links.is_empty());

        layers.connections = false;
        derive_links(&nodes, &store, &layers, Some(200.0), &mut links);
        assert!(links.is_empty());
    }

    #[test]
    fn test_each_pair_linked_once() {
        let (store, nodes) = fixture(&[
            (NodeKind::Hazard, Vec2::new(0.0, 0.0)),
            (NodeKind::Hazard, Vec2::new(5.0, 0.0)),
            (NodeKind::Community, Vec2::new(0.0, 5.0)),
            (NodeKind::Community, Vec2::new(5.0, 5.0)),
        ]);
        let mut links = Vec::new();
        derive_links(&nodes, &store, &VisibleLayers::default(), Some(100.0), &mut links);
        assert_eq!(links.len(), 4);
        let mut pairs: Vec<_> = links.iter().map(|l| (l.source, l.target)).collect();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_spatial_mode_has_no_threshold() {
        let vp = Viewport::new(500.0, 400.0);
        let config = EngineConfig::default();
        assert_eq!(link_threshold(Mode::Spatial, vp, &config), None);
        assert_relative_eq!(link_threshold(Mode::Network, vp, &config).unwrap(), 160.0);
    }
}
