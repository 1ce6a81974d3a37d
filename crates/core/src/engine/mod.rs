//! Animation loop and lifecycle.
//!
//! The engine owns the view state, the frame buffers and the interaction
//! controller, and drives one pipeline per frame:
//!
//! 1. time filter + layer toggles → visible feature indices
//! 2. layout → node buffers
//! 3. link derivation
//! 4. render onto the canvas context
//!
//! # Scheduling
//!
//! The loop is `Idle → Running → Idle`. It runs continuously while the canvas is
//! visible and either the view is playing or the mode animates on its own
//! (network mode always does: its rings rotate with wall-clock time). Outside
//! that, single frames are requested on demand after a state change. Play state
//! never stops network-mode frames.
//!
//! # Teardown
//!
//! [`Engine::unmount`] (also run on drop) cancels the pending frame and removes
//! every listener and the resize observation, synchronously.

mod clock;
mod host;

pub use clock::{Clock, FixedClock, SystemClock};
pub use host::{
    CanvasElement, ClientRect, FrameHandle, HeadlessCanvas, HeadlessHost, Host, HostError,
    ListenerId, ListenerKind, ObserverId,
};

use crate::config::EngineConfig;
use crate::core_types::Vec2;
use crate::interaction::{EngineEvent, HitContext, InteractionController, PointerTransform};
use crate::layout::{
    compute_layout, LayoutInput, Node, NodeBuffers, NodeKind, Viewport, VisibleSet,
};
use crate::links::{derive_links, link_threshold, Link};
use crate::profiler::{FrameTimer, ProfilerScope};
use crate::render::{FrameTime, Renderer, Scene};
use crate::store::{FeatureStore, TimePeriod};
use crate::view::{Layer, Mode, SimulationSpeed, ViewState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Frame loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    /// No continuous loop; frames only on demand
    Idle,
    /// A frame is rescheduled after every frame
    Running,
    /// Unmounted; nothing is scheduled any more
    TornDown,
}

/// Summary of the most recent frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FrameStats {
    /// 1-based frame counter
    pub frame: u64,
    pub nodes: usize,
    pub links: usize,
    pub duration_ms: f64,
    /// Layout time the frame was computed at
    pub layout_time: f64,
}

/// Inputs of the last rendered frame, reused by pointer handlers so hit tests
/// see exactly what was drawn.
#[derive(Debug, Clone, Copy)]
struct FrameInputs {
    time: FrameTime,
    anchor: DateTime<Utc>,
}

/// The graph visualisation engine bound to one canvas.
pub struct Engine<C: CanvasElement, H: Host> {
    canvas: Option<C>,
    host: H,
    clock: Box<dyn Clock>,
    config: EngineConfig,
    store: FeatureStore,
    view: ViewState,
    anchor_override: Option<DateTime<Utc>>,

    ready: bool,
    canvas_visible: bool,
    state: AnimationState,
    pending: Option<FrameHandle>,
    listeners: Vec<ListenerId>,
    observer: Option<ObserverId>,

    viewport: Viewport,
    transform: PointerTransform,
    visible: VisibleSet,
    nodes: NodeBuffers,
    links: Vec<Link>,
    renderer: Renderer,
    controller: InteractionController,
    last_frame: Option<FrameInputs>,
    timer: FrameTimer,
    stats: FrameStats,
}

impl<C: CanvasElement, H: Host> Engine<C, H> {
    /// Mount on `canvas` using the system clock.
    pub fn mount(canvas: Option<C>, host: H, store: FeatureStore, config: EngineConfig) -> Self {
        Self::mount_with_clock(canvas, host, store, config, Box::new(SystemClock))
    }

    /// Mount on `canvas`.
    ///
    /// Never fails: without a canvas or a 2D context the engine stays inert and
    /// [`is_ready`](Self::is_ready) reports `false` so the host can show a
    /// fallback.
    pub fn mount_with_clock(
        canvas: Option<C>,
        host: H,
        store: FeatureStore,
        config: EngineConfig,
        clock: Box<dyn Clock>,
    ) -> Self {
        let renderer = Renderer::new(&config);
        let capacity = store.hazards().len() + store.communities().len();
        let mut engine = Self {
            canvas,
            host,
            clock,
            config,
            store,
            view: ViewState::default(),
            anchor_override: None,
            ready: false,
            canvas_visible: true,
            state: AnimationState::Idle,
            pending: None,
            listeners: Vec::with_capacity(ListenerKind::ALL.len()),
            observer: None,
            viewport: Viewport::new(0.0, 0.0),
            transform: PointerTransform::default(),
            visible: VisibleSet::default(),
            nodes: NodeBuffers::with_capacity(capacity),
            links: Vec::new(),
            renderer,
            controller: InteractionController::new(),
            last_frame: None,
            timer: FrameTimer::new(),
            stats: FrameStats::default(),
        };

        let Some(canvas) = engine.canvas.as_mut() else {
            warn!("No canvas element; graph engine not initialised");
            return engine;
        };
        if canvas.context_2d().is_none() {
            warn!("2D context unavailable; graph engine not initialised");
            return engine;
        }

        engine.ready = true;
        engine.apply_resize();
        for kind in ListenerKind::ALL {
            let id = engine.host.add_listener(kind);
            engine.listeners.push(id);
        }
        match engine.host.observe_resize() {
            Ok(id) => engine.observer = Some(id),
            Err(e) => warn!("{}; canvas will only resize on explicit resize events", e),
        }

        info!(
            "Graph engine mounted: {}x{} buffer, {} hazards, {} communities",
            engine.viewport.width,
            engine.viewport.height,
            engine.store.hazards().len(),
            engine.store.communities().len()
        );
        engine.sync_schedule();
        engine.invalidate();
        engine
    }

    // ====== Lifecycle ======

    /// Cancel the pending frame and remove listeners and the resize observer.
    /// Idempotent.
    pub fn unmount(&mut self) {
        if self.state == AnimationState::TornDown {
            return;
        }
        if let Some(handle) = self.pending.take() {
            self.host.cancel_frame(handle);
        }
        for id in self.listeners.drain(..) {
            self.host.remove_listener(id);
        }
        if let Some(id) = self.observer.take() {
            self.host.unobserve_resize(id);
        }
        self.controller.reset();
        self.state = AnimationState::TornDown;
        self.ready = false;
        info!("Graph engine torn down");
    }

    /// Whether the engine obtained a 2D context and has not been torn down.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    fn wants_continuous(&self) -> bool {
        self.canvas_visible && (self.view.is_playing || self.view.mode.animates_continuously())
    }

    /// Bring the loop state in line with the view, scheduling a frame if the
    /// loop should be running and none is pending.
    fn sync_schedule(&mut self) {
        if !self.ready {
            return;
        }
        if self.wants_continuous() {
            if self.state != AnimationState::Running {
                debug!("Animation loop running");
            }
            self.state = AnimationState::Running;
            if self.pending.is_none() {
                self.pending = Some(self.host.request_frame());
            }
        } else {
            if self.state == AnimationState::Running {
                debug!("Animation loop idle");
            }
            self.state = AnimationState::Idle;
        }
    }

    /// Request a single redraw if nothing is pending.
    fn invalidate(&mut self) {
        if self.ready && self.canvas_visible && self.pending.is_none() {
            self.pending = Some(self.host.request_frame());
        }
    }

    /// Frame callback. Stale or cancelled handles are ignored.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Option<FrameStats> {
        if self.state == AnimationState::TornDown || self.pending != Some(handle) {
            debug!("Ignoring stale frame {:?}", handle);
            return None;
        }
        self.pending = None;
        let stats = self.render_frame();
        self.sync_schedule();
        stats
    }

    fn render_frame(&mut self) -> Option<FrameStats> {
        let now = self.clock.now();
        let anchor = self.anchor_override.unwrap_or(now);
        let time = FrameTime::from_seconds(self.clock.seconds(), &self.config);
        let mut duration_ms = 0.0;
        {
            let _scope = ProfilerScope::recording("frame", &mut duration_ms);

            self.visible.rebuild(&self.store, &self.view, anchor);
            let input = LayoutInput {
                store: &self.store,
                visible: &self.visible,
                mode: self.view.mode,
                viewport: self.viewport,
                time: time.layout,
            };
            compute_layout(&input, &self.config, self.controller.pins(), &mut self.nodes);
            derive_links(
                &self.nodes,
                &self.store,
                &self.view.visible_layers,
                link_threshold(self.view.mode, self.viewport, &self.config),
                &mut self.links,
            );

            let Some(surface) = self.canvas.as_mut().and_then(|c| c.context_2d()) else {
                warn!("2D context lost; skipping frame");
                return None;
            };
            let scene = Scene {
                store: &self.store,
                nodes: &self.nodes,
                links: &self.links,
                view: &self.view,
                viewport: self.viewport,
                time,
                pixel_ratio: self.transform.device_pixel_ratio,
            };
            self.renderer.render(surface, &scene, &self.config);
        }

        self.last_frame = Some(FrameInputs { time, anchor });
        self.timer.record(duration_ms);
        self.stats = FrameStats {
            frame: self.timer.frames(),
            nodes: self.nodes.len(),
            links: self.links.len(),
            duration_ms,
            layout_time: time.layout,
        };
        debug!(
            "Frame {}: {} nodes, {} links, {:.3}ms",
            self.stats.frame, self.stats.nodes, self.stats.links, duration_ms
        );
        Some(self.stats)
    }

    // ====== Canvas sizing ======

    /// Sync the backing buffer with the CSS size and device pixel ratio.
    fn apply_resize(&mut self) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let rect = canvas.client_rect();
        let dpr = canvas.device_pixel_ratio();
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        if !(rect.width.is_finite() && rect.height.is_finite()) {
            warn!("Ignoring resize to a non-finite canvas size");
            return;
        }
        let width = (rect.width.max(0.0) * dpr).round() as u32;
        let height = (rect.height.max(0.0) * dpr).round() as u32;
        canvas.set_buffer_size(width, height);
        self.viewport = Viewport::new(width as f32, height as f32);
        self.transform = PointerTransform {
            origin: rect.origin(),
            device_pixel_ratio: dpr,
        };
        debug!("Canvas buffer resized to {}x{} (dpr {})", width, height, dpr);
    }

    /// Resize notification from the host's observer or an explicit resize event.
    pub fn on_resize(&mut self) {
        if !self.ready {
            return;
        }
        self.apply_resize();
        self.invalidate();
    }

    /// Canvas scrolled in or out of view. Hidden canvases schedule nothing.
    pub fn set_canvas_visible(&mut self, visible: bool) {
        self.canvas_visible = visible;
        if !visible {
            if let Some(handle) = self.pending.take() {
                self.host.cancel_frame(handle);
            }
        }
        self.sync_schedule();
        self.invalidate();
    }

    // ====== Pointer input (client coordinates) ======

    /// Frame inputs for hit testing: the last rendered frame, or "now" before
    /// the first frame.
    fn hit_inputs(&self) -> FrameInputs {
        self.last_frame.unwrap_or_else(|| FrameInputs {
            time: FrameTime::from_seconds(self.clock.seconds(), &self.config),
            anchor: self.anchor_override.unwrap_or_else(|| self.clock.now()),
        })
    }

    pub fn pointer_click(&mut self, client: Vec2) -> Option<String> {
        if !self.ready {
            return None;
        }
        let point = self.transform.to_buffer(client);
        let inputs = self.hit_inputs();
        self.visible.rebuild(&self.store, &self.view, inputs.anchor);
        let ctx = HitContext {
            store: &self.store,
            visible: &self.visible,
            viewport: self.viewport,
            layout_time: inputs.time.layout,
            config: &self.config,
        };
        let hit = self.controller.click(&mut self.view, point, &ctx);
        self.invalidate();
        hit
    }

    /// Returns whether a drag started.
    pub fn pointer_down(&mut self, client: Vec2) -> bool {
        if !self.ready {
            return false;
        }
        let point = self.transform.to_buffer(client);
        let inputs = self.hit_inputs();
        self.visible.rebuild(&self.store, &self.view, inputs.anchor);
        let ctx = HitContext {
            store: &self.store,
            visible: &self.visible,
            viewport: self.viewport,
            layout_time: inputs.time.layout,
            config: &self.config,
        };
        let started = self.controller.pointer_down(&self.view, point, &ctx);
        if started {
            self.invalidate();
        }
        started
    }

    pub fn pointer_move(&mut self, client: Vec2) {
        if !self.ready || !self.controller.is_dragging() {
            return;
        }
        self.controller.pointer_move(self.transform.to_buffer(client));
        self.invalidate();
    }

    pub fn pointer_up(&mut self) {
        if !self.ready || !self.controller.is_dragging() {
            return;
        }
        self.controller.pointer_up();
        self.invalidate();
    }

    // ====== View / filter controls ======

    pub fn set_mode(&mut self, mode: Mode) {
        if self.view.mode != mode {
            info!("Switching to {} mode", mode);
            self.view.mode = mode;
        }
        self.sync_schedule();
        self.invalidate();
    }

    pub fn set_layer(&mut self, layer: Layer, visible: bool) {
        self.view.visible_layers.set(layer, visible);
        self.invalidate();
    }

    pub fn set_time_period(&mut self, period: TimePeriod) {
        self.view.time_period = period;
        self.invalidate();
    }

    /// Pin the time-filter anchor instead of following the clock.
    pub fn set_time_anchor(&mut self, anchor: Option<DateTime<Utc>>) {
        self.anchor_override = anchor;
        self.invalidate();
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.view.is_playing = playing;
        self.sync_schedule();
    }

    pub fn set_simulation_speed(&mut self, speed: SimulationSpeed) {
        self.view.simulation_speed = speed;
        self.invalidate();
    }

    /// Side-panel list selection.
    pub fn select_node(&mut self, id: &str, kind: NodeKind) {
        self.controller.select(&mut self.view, id, kind);
        self.invalidate();
    }

    pub fn clear_selection(&mut self) {
        self.controller.clear_selection(&mut self.view);
        self.invalidate();
    }

    /// Swap in refreshed data. Drag state is dropped.
    pub fn replace_store(&mut self, store: FeatureStore) {
        info!(
            "Feature store replaced: {} hazards, {} communities",
            store.hazards().len(),
            store.communities().len()
        );
        self.store = store;
        // Frame buffers index into the old store
        self.nodes.clear();
        self.links.clear();
        self.last_frame = None;
        self.controller.pointer_up();
        self.invalidate();
    }

    /// Take events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.controller.drain_events()
    }

    // ====== Accessors ======

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn canvas(&self) -> Option<&C> {
        self.canvas.as_ref()
    }

    pub fn canvas_mut(&mut self) -> Option<&mut C> {
        self.canvas.as_mut()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn pointer_transform(&self) -> PointerTransform {
        self.transform
    }

    /// Nodes of the last rendered frame.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        (0..self.nodes.len()).map(move |i| self.nodes.node(i, &self.store))
    }

    #[must_use]
    pub fn node_buffers(&self) -> &NodeBuffers {
        &self.nodes
    }

    /// Links of the last rendered frame.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    #[must_use]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    #[must_use]
    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }
}

impl<C: CanvasElement> Engine<C, HeadlessHost> {
    /// Fire the host's next frame, as a browser would on the next vsync.
    pub fn tick(&mut self) -> Option<FrameStats> {
        let handle = self.host.fire_next()?;
        self.on_frame(handle)
    }
}

impl<C: CanvasElement, H: Host> Drop for Engine<C, H> {
    fn drop(&mut self) {
        self.unmount();
    }
}
