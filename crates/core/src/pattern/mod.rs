//! Pattern controllers.
//!
//! Each controller owns a [`Scheduler`] over its own timeline, the geometry
//! derived from the rectangle it was started with, and the shapes it mutates.
//! Composite controllers own their children and delay their own timeline
//! until every descendant has finished.

use std::time::Duration;

use crate::{
    geometry::Rect,
    render::{RenderSink, UpdateBatch},
    shape::Shape,
    timeline::{CancelToken, Scheduler, TimelineState},
    Result, ZellijError,
};

pub mod construction_circle;
pub mod pattern_one_construction;
pub mod pattern_one_drawing;

pub use construction_circle::{ConstructionCircle, ConstructionCircleState};
pub use pattern_one_construction::{PatternOneConstruction, PatternOneConstructionState, Quarter};
pub use pattern_one_drawing::{PatternOneDrawing, PatternOneDrawingState, Stage};

/// Number of points sampled on the construction circle.
pub const CIRCLE_DIVISIONS: usize = 8;

/// Capability shared by every pattern controller.
pub trait PatternController {
    type State: TimelineState;

    /// Derives all rectangle-dependent geometry and starts the timeline (and
    /// any children) after `delay`. The run is additionally cancelled when
    /// `parent` is.
    fn start_linked(
        &mut self,
        rect: Rect,
        delay: Duration,
        parent: Option<&CancelToken>,
    ) -> Result<()>;

    fn start(&mut self, rect: Rect, delay: Duration) -> Result<()> {
        self.start_linked(rect, delay, None)
    }

    /// Cancels pending transitions for this controller and its children.
    fn stop(&mut self);

    /// Maps a timeline state to shape changes.
    fn on_state(&mut self, state: Self::State) -> UpdateBatch;

    /// Delivers every transition that has come due, children first.
    fn poll(&mut self, sink: &mut dyn RenderSink);

    /// Current targets of every shape, children first.
    fn shapes(&self) -> Vec<Shape>;

    fn current_state(&self) -> Option<Self::State>;

    fn is_running(&self) -> bool;

    fn pulse(&self) -> Duration;

    /// Time owned children need before this controller's first tick can follow.
    fn lead_in(&self) -> Duration;

    /// Lead-in plus the length of this controller's own timeline.
    fn span(&self) -> Duration {
        self.lead_in() + self.pulse() * Self::State::TIMELINE.len() as u32
    }
}

/// Starts `scheduler` once `lead_in` has elapsed after `delay`.
fn start_scheduler<S>(
    scheduler: &mut Scheduler<S>,
    delay: Duration,
    lead_in: Duration,
    parent: Option<&CancelToken>,
) -> Result<()>
where
    S: Copy + std::fmt::Debug,
{
    let delay = delay.checked_add(lead_in).ok_or_else(|| {
        ZellijError::InvalidConfig(format!("delay {delay:?} is too long to schedule"))
    })?;
    match parent {
        Some(token) => scheduler.start_linked(delay, token),
        None => scheduler.start(delay),
    }
}
