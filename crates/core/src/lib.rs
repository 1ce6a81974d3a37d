//! Hazard Graph Core Library
//!
//! Real-time visualisation of climate hazards and the communities exposed to
//! them, drawn as a node-link graph on a 2D canvas.
//!
//! ## Views
//!
//! - **Spatial**: hazards in a row across the upper part of the canvas,
//!   communities in a row across the lower part, over a light grid
//! - **Network**: hazards on an outer ring and communities on an inner ring,
//!   counter-rotating over a starfield, joined by weighted proximity links with
//!   flowing particles
//!
//! ## Pipeline
//!
//! Every frame runs time filter → layer toggles → layout → links → render,
//! single-threaded, reusing its buffers. Layout is a pure function of the visible
//! features, the viewport and the frame time, so a click handler can rebuild
//! exactly the positions the user sees.
//!
//! The host environment (canvas, frame scheduler, listeners, resize observer)
//! sits behind the traits in [`engine`]; [`engine::HeadlessHost`] and
//! [`engine::HeadlessCanvas`] drive the engine without a browser.

// Feature records, colours and geometry
pub mod core_types;

// Data and view state
pub mod config;
pub mod store;
pub mod view;

// Frame pipeline
pub mod layout;
pub mod links;
pub mod render;

// Input, loop and lifecycle
pub mod engine;
pub mod interaction;
pub mod profiler;

// Re-export core types
pub use core_types::{Color, CommunityFeature, HazardFeature, HazardType, RejectReason, Vec2};

// Re-export pipeline types
pub use config::EngineConfig;
pub use layout::{Node, NodeBuffers, NodeKind, Viewport};
pub use links::Link;
pub use render::{DrawCommand, RecordingSurface, Renderer, Surface};
pub use store::{FeatureStore, IngestReport, LoadError, TimePeriod};
pub use view::{Layer, Mode, SimulationSpeed, ViewState};

// Re-export engine types
pub use engine::{
    AnimationState, CanvasElement, Clock, Engine, FixedClock, FrameStats, HeadlessCanvas,
    HeadlessHost, Host, SystemClock,
};
pub use interaction::EngineEvent;
