//! Host environment: canvas element, frame scheduler, listeners, resize observer.
//!
//! A browser host backs these with `requestAnimationFrame`, DOM listeners and a
//! `ResizeObserver`. [`HeadlessHost`] and [`HeadlessCanvas`] back them in memory
//! so the engine can be driven and inspected without a browser.

use crate::core_types::Vec2;
use crate::render::{RecordingSurface, Surface};
use thiserror::Error;

/// Handle of a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Handle of a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle of a resize observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Pointer events the engine listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerDown,
    PointerMove,
    PointerUp,
    Click,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 4] = [
        ListenerKind::PointerDown,
        ListenerKind::PointerMove,
        ListenerKind::PointerUp,
        ListenerKind::Click,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("resize observer unavailable: {0}")]
    ResizeObserver(String),
}

/// Frame scheduling and event plumbing.
pub trait Host {
    /// Schedule one frame callback.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a scheduled callback. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);

    fn observe_resize(&mut self) -> Result<ObserverId, HostError>;

    fn unobserve_resize(&mut self, id: ObserverId);
}

/// Canvas rectangle in CSS pixels, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ClientRect {
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }
}

/// The single canvas element the engine draws into.
pub trait CanvasElement {
    fn client_rect(&self) -> ClientRect;

    fn device_pixel_ratio(&self) -> f32;

    /// Resize the backing buffer, in device pixels.
    fn set_buffer_size(&mut self, width: u32, height: u32);

    /// The 2D drawing context, or `None` when the canvas cannot provide one.
    fn context_2d(&mut self) -> Option<&mut dyn Surface>;
}

/// In-memory host that tracks scheduled frames and registrations.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    next_id: u64,
    frames: Vec<FrameHandle>,
    listeners: Vec<(ListenerId, ListenerKind)>,
    observers: Vec<ObserverId>,
    /// Make `observe_resize` fail, as in a host without `ResizeObserver`
    pub fail_resize_observer: bool,
}

impl HeadlessHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Fire the oldest pending frame: it is consumed and its handle returned
    /// for the engine's frame callback.
    pub fn fire_next(&mut self) -> Option<FrameHandle> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.frames.remove(0))
        }
    }
}

impl Host for HeadlessHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next());
        self.frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|&h| h != handle);
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next());
        self.listeners.push((id, kind));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|&(l, _)| l != id);
    }

    fn observe_resize(&mut self) -> Result<ObserverId, HostError> {
        if self.fail_resize_observer {
            return Err(HostError::ResizeObserver("not supported".into()));
        }
        let id = ObserverId(self.next());
        self.observers.push(id);
        Ok(id)
    }

    fn unobserve_resize(&mut self, id: ObserverId) {
        self.observers.retain(|&o| o != id);
    }
}

/// In-memory canvas recording into a [`RecordingSurface`].
#[derive(Debug, Clone)]
pub struct HeadlessCanvas {
    pub rect: ClientRect,
    pub device_pixel_ratio: f32,
    /// `false` simulates a canvas without 2D support
    pub has_context: bool,
    buffer_size: (u32, u32),
    surface: RecordingSurface,
}

impl HeadlessCanvas {
    #[must_use]
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            rect: ClientRect {
                left: 0.0,
                top: 0.0,
                width,
                height,
            },
            device_pixel_ratio,
            has_context: true,
            buffer_size: (0, 0),
            surface: RecordingSurface::new(),
        }
    }

    #[must_use]
    pub fn without_context(mut self) -> Self {
        self.has_context = false;
        self
    }

    #[must_use]
    pub fn buffer_size(&self) -> (u32, u32) {
        self.buffer_size
    }

    #[must_use]
    pub fn surface(&self) -> &RecordingSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut RecordingSurface {
        &mut self.surface
    }
}

impl CanvasElement for HeadlessCanvas {
    fn client_rect(&self) -> ClientRect {
        self.rect
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    fn set_buffer_size(&mut self, width: u32, height: u32) {
        self.buffer_size = (width, height);
    }

    fn context_2d(&mut self) -> Option<&mut dyn Surface> {
        if self.has_context {
            Some(&mut self.surface)
        } else {
            None
        }
    }
}
