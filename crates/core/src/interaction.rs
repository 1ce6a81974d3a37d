//! Interaction controller: pointer → node resolution, selection and drag.
//!
//! Positions are never cached between the frame the user sees and the click
//! handler. A click recomputes the layout for the current visible features with
//! the same formulas and the same frame time, then picks the first node within
//! `radius + margin`, hazards before communities.
//!
//! Canvas clicks only select in spatial mode. In network mode the host selects
//! through its side-panel list ([`InteractionController::select`]) and a canvas
//! click clears the selection.

use crate::config::EngineConfig;
use crate::core_types::Vec2;
use crate::layout::{
    compute_layout, LayoutInput, NodeBuffers, NodeKind, PinSet, Viewport, VisibleSet,
};
use crate::store::FeatureStore;
use crate::view::{Mode, Selection, ViewState};
use serde::Serialize;
use tracing::debug;

/// Event emitted to the surrounding dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    NodeSelected { id: String, kind: NodeKind },
    SelectionCleared,
}

/// Client → canvas-buffer coordinate mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTransform {
    /// Top-left corner of the canvas in client coordinates
    pub origin: Vec2,
    pub device_pixel_ratio: f32,
}

impl Default for PointerTransform {
    fn default() -> Self {
        Self {
            origin: Vec2::zeros(),
            device_pixel_ratio: 1.0,
        }
    }
}

impl PointerTransform {
    #[must_use]
    pub fn to_buffer(&self, client: Vec2) -> Vec2 {
        (client - self.origin) * self.device_pixel_ratio
    }
}

/// First node, in buffer order, whose centre is closer than `radius + margin`.
#[must_use]
pub fn hit_test(nodes: &NodeBuffers, point: Vec2, margin: f32) -> Option<usize> {
    (0..nodes.len()).find(|&i| (nodes.position(i) - point).norm() < nodes.radius(i) + margin)
}

/// What a hit test needs to rebuild the frame's node positions.
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub store: &'a FeatureStore,
    pub visible: &'a VisibleSet,
    pub viewport: Viewport,
    /// Layout time of the frame being interacted with
    pub layout_time: f64,
    pub config: &'a EngineConfig,
}

#[derive(Debug, Clone, PartialEq)]
struct Drag {
    kind: NodeKind,
    id: String,
}

/// Sole writer of selection and drag pins.
#[derive(Debug, Default)]
pub struct InteractionController {
    pins: PinSet,
    drag: Option<Drag>,
    scratch: NodeBuffers,
    events: Vec<EngineEvent>,
}

impl InteractionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Take the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn relayout(&mut self, mode: Mode, ctx: &HitContext<'_>) {
        let input = LayoutInput {
            store: ctx.store,
            visible: ctx.visible,
            mode,
            viewport: ctx.viewport,
            time: ctx.layout_time,
        };
        compute_layout(&input, ctx.config, &self.pins, &mut self.scratch);
    }

    /// Resolve a click at `point` (canvas-buffer coordinates) against the layout
    /// the user is looking at. Returns the selected node's id, if any.
    pub fn click(
        &mut self,
        view: &mut ViewState,
        point: Vec2,
        ctx: &HitContext<'_>,
    ) -> Option<String> {
        if view.mode == Mode::Network {
            debug!("Canvas click in network mode clears selection");
            self.clear_selection(view);
            return None;
        }

        self.relayout(view.mode, ctx);
        match hit_test(&self.scratch, point, ctx.config.hit_margin) {
            Some(i) => {
                let kind = self.scratch.kind(i);
                let id = self.scratch.id(i, ctx.store).to_owned();
                debug!("Hit {} '{}' at ({:.1}, {:.1})", kind, id, point.x, point.y);
                self.select(view, &id, kind);
                Some(id)
            }
            None => {
                debug!("Click at ({:.1}, {:.1}) missed every node", point.x, point.y);
                self.clear_selection(view);
                None
            }
        }
    }

    /// Select a node by id, e.g. from a side-panel list.
    pub fn select(&mut self, view: &mut ViewState, id: &str, kind: NodeKind) {
        view.selected = Some(Selection {
            id: id.to_owned(),
            kind,
        });
        self.events.push(EngineEvent::NodeSelected {
            id: id.to_owned(),
            kind,
        });
    }

    pub fn clear_selection(&mut self, view: &mut ViewState) {
        if view.selected.take().is_some() {
            self.events.push(EngineEvent::SelectionCleared);
        }
    }

    /// Start a drag if `point` falls within a node's radius. The node is pinned
    /// to the pointer until [`pointer_up`](Self::pointer_up).
    pub fn pointer_down(&mut self, view: &ViewState, point: Vec2, ctx: &HitContext<'_>) -> bool {
        self.relayout(view.mode, ctx);
        let Some(i) = hit_test(&self.scratch, point, 0.0) else {
            return false;
        };
        let kind = self.scratch.kind(i);
        let id = self.scratch.id(i, ctx.store).to_owned();
        debug!("Drag start on {} '{}'", kind, id);
        self.pins.pin(kind, &id, point);
        self.drag = Some(Drag { kind, id });
        true
    }

    /// Move the dragged node, if any, to `point`.
    pub fn pointer_move(&mut self, point: Vec2) {
        if let Some(drag) = &self.drag {
            self.pins.pin(drag.kind, &drag.id, point);
        }
    }

    /// Release the drag; the node returns to formula positioning next frame.
    pub fn pointer_up(&mut self) {
        if let Some(drag) = self.drag.take() {
            debug!("Drag end on {} '{}'", drag.kind, drag.id);
            self.pins.unpin(drag.kind, &drag.id);
        }
    }

    /// Drop all transient state.
    pub fn reset(&mut self) {
        self.pins.clear();
        self.drag = None;
        self.events.clear();
    }
}
