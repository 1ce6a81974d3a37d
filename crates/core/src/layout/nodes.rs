//! Index-aligned node buffers.
//!
//! Nodes are not stored between frames. Each frame the layout engine writes
//! kind, feature index, position, radius and colour into these parallel vectors,
//! reusing their capacity.

use crate::core_types::{Color, Vec2};
use crate::store::FeatureStore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which collection a node was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Hazard,
    Community,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hazard => "hazard",
            Self::Community => "community",
        })
    }
}

/// Borrowed view of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub kind: NodeKind,
    pub position: Vec2,
    pub radius: f32,
    pub color: Color,
    /// Drag override in effect for this frame
    pub pinned: Option<Vec2>,
}

/// Struct-of-arrays node storage, hazards first then communities.
#[derive(Debug, Clone, Default)]
pub struct NodeBuffers {
    kinds: Vec<NodeKind>,
    features: Vec<usize>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    colors: Vec<Color>,
    pinned: Vec<bool>,
    hazard_count: usize,
}

impl NodeBuffers {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            kinds: Vec::with_capacity(capacity),
            features: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            radii: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
            pinned: Vec::with_capacity(capacity),
            hazard_count: 0,
        }
    }

    pub fn clear(&mut self) {
        self.kinds.clear();
        self.features.clear();
        self.positions.clear();
        self.radii.clear();
        self.colors.clear();
        self.pinned.clear();
        self.hazard_count = 0;
    }

    pub(crate) fn push(
        &mut self,
        kind: NodeKind,
        feature: usize,
        position: Vec2,
        radius: f32,
        color: Color,
        pinned: bool,
    ) {
        if kind == NodeKind::Hazard {
            debug_assert_eq!(self.hazard_count, self.kinds.len(), "hazards must come first");
            self.hazard_count += 1;
        }
        self.kinds.push(kind);
        self.features.push(feature);
        self.positions.push(position);
        self.radii.push(radius);
        self.colors.push(color);
        self.pinned.push(pinned);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Index range of hazard nodes.
    #[must_use]
    pub fn hazard_range(&self) -> std::ops::Range<usize> {
        0..self.hazard_count
    }

    /// Index range of community nodes.
    #[must_use]
    pub fn community_range(&self) -> std::ops::Range<usize> {
        self.hazard_count..self.len()
    }

    #[must_use]
    pub fn kind(&self, i: usize) -> NodeKind {
        self.kinds[i]
    }

    /// Index of the node's feature in its store collection.
    #[must_use]
    pub fn feature_index(&self, i: usize) -> usize {
        self.features[i]
    }

    #[must_use]
    pub fn position(&self, i: usize) -> Vec2 {
        self.positions[i]
    }

    #[must_use]
    pub fn radius(&self, i: usize) -> f32 {
        self.radii[i]
    }

    #[must_use]
    pub fn color(&self, i: usize) -> Color {
        self.colors[i]
    }

    #[must_use]
    pub fn is_pinned(&self, i: usize) -> bool {
        self.pinned[i]
    }

    #[must_use]
    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// Id of node `i`, looked up in the store it was built from.
    #[must_use]
    pub fn id<'s>(&self, i: usize, store: &'s FeatureStore) -> &'s str {
        node_id(store, self.kinds[i], self.features[i])
    }

    /// Full view of node `i`.
    #[must_use]
    pub fn node<'s>(&self, i: usize, store: &'s FeatureStore) -> Node<'s> {
        let (id, name) = match self.kinds[i] {
            NodeKind::Hazard => {
                let f = &store.hazards()[self.features[i]];
                (f.id.as_str(), f.name.as_str())
            }
            NodeKind::Community => {
                let f = &store.communities()[self.features[i]];
                (f.id.as_str(), f.name.as_str())
            }
        };
        Node {
            id,
            name,
            kind: self.kinds[i],
            position: self.positions[i],
            radius: self.radii[i],
            color: self.colors[i],
            pinned: self.pinned[i].then_some(self.positions[i]),
        }
    }

    /// First node with the given kind and id.
    #[must_use]
    pub fn find(&self, kind: NodeKind, id: &str, store: &FeatureStore) -> Option<usize> {
        let range = match kind {
            NodeKind::Hazard => self.hazard_range(),
            NodeKind::Community => self.community_range(),
        };
        range.into_iter().find(|&i| self.id(i, store) == id)
    }
}

/// Id of a feature by kind and collection index.
#[must_use]
pub fn node_id(store: &FeatureStore, kind: NodeKind, feature: usize) -> &str {
    match kind {
        NodeKind::Hazard => &store.hazards()[feature].id,
        NodeKind::Community => &store.communities()[feature].id,
    }
}
