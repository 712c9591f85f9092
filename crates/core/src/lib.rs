//! Core library for the Zellij pattern animator.
//!
//! Patterns are built step by step: each controller walks a fixed timeline
//! one pulse at a time and, for every state, derives target geometry from
//! the rectangle it was started with. The crate never paints anything; it
//! hands [`RenderCommand`]s to whatever [`RenderSink`] the application
//! provides.

pub mod config;
pub mod error;
pub mod geometry;
pub mod pattern;
pub mod record;
pub mod render;
pub mod shape;
pub mod timeline;

pub use config::{AppConfig, CanvasConfig, FinaleConfig};
pub use error::{Result, ZellijError};
pub use geometry::{Point, PointPair, Rect, RectHalf};
pub use pattern::{
    ConstructionCircle, ConstructionCircleState, PatternController, PatternOneConstruction,
    PatternOneConstructionState, PatternOneDrawing, PatternOneDrawingState, Quarter, Stage,
};
pub use record::{RecordedCommand, Recorder, RecordingSettings};
pub use render::{Curve, RenderCommand, RenderSink, Repeat, Transition, UpdateBatch};
pub use shape::{CircleShape, ColorRef, LineShape, PulsingMarker, Shape, ShapeId, ShapeModel};
pub use timeline::{
    CancelToken, Clock, PlaybackClock, Scheduler, SharedClock, Timeline, TimelineState, WallClock,
};
