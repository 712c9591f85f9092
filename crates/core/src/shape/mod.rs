//! Target-value records mutated by pattern controllers.
//!
//! Shapes hold where a drawable should end up, never an interpolated
//! in-between value. Each carries a stable [`ShapeId`] so the renderer can
//! match successive targets to the same on-screen element.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, PointPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeId(Uuid);

impl ShapeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Symbolic stroke/fill colour. The application shell maps these to real
/// colours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRef {
    #[default]
    Default,
    /// Shapes still being constructed.
    Drawing,
    /// Finished construction guides.
    Construction,
}

/// A circle stroked from zero to `progress` of its circumference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleShape {
    pub id: ShapeId,
    pub progress: f64,
    pub stroke: ColorRef,
}

impl CircleShape {
    pub fn zero() -> Self {
        Self {
            id: ShapeId::new(),
            progress: 0.0,
            stroke: ColorRef::Default,
        }
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineShape {
    pub id: ShapeId,
    pub start: Point,
    pub end: Point,
    pub stroke: ColorRef,
    pub width: f64,
}

impl LineShape {
    pub fn zero() -> Self {
        Self {
            id: ShapeId::new(),
            start: Point::ZERO,
            end: Point::ZERO,
            stroke: ColorRef::Default,
            width: 1.0,
        }
    }

    /// Collapses the line onto `point` so it has no visible extent.
    pub fn reset(&mut self, point: Point) {
        self.set(PointPair::collapsed(point));
    }

    pub fn set(&mut self, pair: PointPair) {
        self.start = pair.start;
        self.end = pair.end;
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// A marker that expands while fading out, used to highlight a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulsingMarker {
    pub id: ShapeId,
    pub progress: f64,
    pub center: Point,
    pub alpha: f64,
    pub color: ColorRef,
}

impl PulsingMarker {
    pub fn zero() -> Self {
        Self {
            id: ShapeId::new(),
            progress: 0.0,
            center: Point::ZERO,
            alpha: 0.0,
            color: ColorRef::Default,
        }
    }

    /// Fully opaque and not yet expanded.
    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.alpha = 1.0;
    }

    /// Fully expanded and faded out.
    pub fn expand(&mut self) {
        self.progress = 1.0;
        self.alpha = 0.0;
    }
}

/// Snapshot of any shape, as handed to the rendering boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Circle(CircleShape),
    Line(LineShape),
    Marker(PulsingMarker),
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        match self {
            Shape::Circle(circle) => circle.id,
            Shape::Line(line) => line.id,
            Shape::Marker(marker) => marker.id,
        }
    }
}

/// Shapes that can be snapshotted into a [`Shape`].
pub trait ShapeModel: Clone {
    fn id(&self) -> ShapeId;
    fn snapshot(&self) -> Shape;
}

impl ShapeModel for CircleShape {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn snapshot(&self) -> Shape {
        Shape::Circle(self.clone())
    }
}

impl ShapeModel for LineShape {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn snapshot(&self) -> Shape {
        Shape::Line(self.clone())
    }
}

impl ShapeModel for PulsingMarker {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn snapshot(&self) -> Shape {
        Shape::Marker(self.clone())
    }
}
