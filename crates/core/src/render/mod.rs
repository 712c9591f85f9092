//! Rendering boundary.
//!
//! Controllers never paint or interpolate. Each state transition produces
//! [`RenderCommand`]s describing a shape's previous and target value plus the
//! [`Transition`] an external renderer should use to get there.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shape::{Shape, ShapeId, ShapeModel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    #[default]
    Linear,
}

/// Replay policy for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repeat {
    pub count: u32,
    pub autoreverses: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub duration: Duration,
    pub curve: Curve,
    pub repeat: Option<Repeat>,
}

impl Transition {
    /// Jump straight to the target.
    pub const SNAP: Transition = Transition {
        duration: Duration::ZERO,
        curve: Curve::Linear,
        repeat: None,
    };

    pub fn linear(duration: Duration) -> Self {
        Self {
            duration,
            curve: Curve::Linear,
            repeat: None,
        }
    }

    pub fn repeating(mut self, repeat: Repeat) -> Self {
        self.repeat = Some(repeat);
        self
    }

    pub fn is_snap(&self) -> bool {
        self.duration.is_zero()
    }
}

/// One shape change handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderCommand {
    pub shape_id: ShapeId,
    pub previous: Shape,
    pub target: Shape,
    pub transition: Transition,
}

/// Consumer of render commands, implemented by whatever paints the pattern.
pub trait RenderSink {
    fn submit(&mut self, command: RenderCommand);
}

impl RenderSink for Vec<RenderCommand> {
    fn submit(&mut self, command: RenderCommand) {
        self.push(command);
    }
}

/// Commands produced by a single state transition, in submission order.
#[derive(Debug, Default, Clone)]
pub struct UpdateBatch {
    commands: Vec<RenderCommand>,
}

impl UpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `change` to `shape` and records the transition from its old
    /// value to its new one.
    pub fn animate<T, F>(&mut self, shape: &mut T, transition: Transition, change: F)
    where
        T: ShapeModel,
        F: FnOnce(&mut T),
    {
        let previous = shape.snapshot();
        change(shape);
        self.commands.push(RenderCommand {
            shape_id: shape.id(),
            previous,
            target: shape.snapshot(),
            transition,
        });
    }

    pub fn snap<T, F>(&mut self, shape: &mut T, change: F)
    where
        T: ShapeModel,
        F: FnOnce(&mut T),
    {
        self.animate(shape, Transition::SNAP, change);
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Longest non-snap duration in the batch.
    pub fn duration(&self) -> Duration {
        self.commands
            .iter()
            .map(|command| command.transition.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn submit_to(self, sink: &mut dyn RenderSink) {
        for command in self.commands {
            sink.submit(command);
        }
    }
}
