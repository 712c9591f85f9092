use std::time::Duration;

use crate::{
    geometry::{Point, PointPair, Rect},
    render::{RenderSink, Transition, UpdateBatch},
    shape::{CircleShape, ColorRef, LineShape, Shape, ShapeModel},
    timeline::{CancelToken, Scheduler, SharedClock, TimelineState},
    Result,
};

use super::{start_scheduler, PatternController};

/// Guide circle with its two axes and two diagonals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionCircleState {
    Initial,
    DrawCircle,
    DrawAxis,
    DrawCross,
    Pause,
    Done,
}

impl TimelineState for ConstructionCircleState {
    const TIMELINE: &'static [Self] = &[
        Self::Initial,
        Self::DrawCircle,
        Self::Pause,
        Self::DrawAxis,
        Self::DrawCross,
        Self::Pause,
        Self::Done,
    ];
}

#[derive(Debug)]
pub struct ConstructionCircle {
    scheduler: Scheduler<ConstructionCircleState>,
    rect: Option<Rect>,
    circle: CircleShape,
    /// Vertical axis, horizontal axis, falling diagonal, rising diagonal.
    lines: [LineShape; 4],
}

impl ConstructionCircle {
    pub fn new(clock: SharedClock, pulse: Duration) -> Result<Self> {
        Ok(Self {
            scheduler: Scheduler::new(ConstructionCircleState::timeline()?, pulse, clock)?,
            rect: None,
            circle: CircleShape::zero(),
            lines: std::array::from_fn(|_| LineShape::zero()),
        })
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn circle(&self) -> &CircleShape {
        &self.circle
    }

    pub fn lines(&self) -> &[LineShape] {
        &self.lines
    }
}

fn anchors(rect: &Rect) -> [Point; 4] {
    [
        Point::new(rect.mid_x(), rect.min_y),
        Point::new(rect.min_x, rect.mid_y()),
        Point::new(rect.min_x, rect.min_y),
        Point::new(rect.max_x, rect.min_y),
    ]
}

impl PatternController for ConstructionCircle {
    type State = ConstructionCircleState;

    fn start_linked(
        &mut self,
        rect: Rect,
        delay: Duration,
        parent: Option<&CancelToken>,
    ) -> Result<()> {
        self.scheduler.ensure_startable()?;
        start_scheduler(&mut self.scheduler, delay, Duration::ZERO, parent)?;
        self.rect = Some(rect);
        tracing::info!(?rect, ?delay, "construction circle started");
        Ok(())
    }

    fn stop(&mut self) {
        self.scheduler.stop();
    }

    fn on_state(&mut self, state: ConstructionCircleState) -> UpdateBatch {
        let mut batch = UpdateBatch::new();
        let Some(rect) = self.rect else {
            return batch;
        };
        let pulse = Transition::linear(self.scheduler.pulse());

        match state {
            ConstructionCircleState::Initial => {
                batch.snap(&mut self.circle, |circle| {
                    circle.reset();
                    circle.stroke = ColorRef::Drawing;
                });
                for (line, anchor) in self.lines.iter_mut().zip(anchors(&rect)) {
                    batch.snap(line, |line| {
                        line.reset(anchor);
                        line.stroke = ColorRef::Drawing;
                    });
                }
            }
            ConstructionCircleState::DrawCircle => {
                let transition = Transition::linear(self.scheduler.pulse() * 2);
                batch.animate(&mut self.circle, transition, |circle| circle.progress = 1.0);
            }
            ConstructionCircleState::DrawAxis => {
                let targets = [
                    PointPair::new(
                        Point::new(rect.mid_x(), rect.min_y),
                        Point::new(rect.mid_x(), rect.max_y),
                    ),
                    PointPair::new(
                        Point::new(rect.min_x, rect.mid_y()),
                        Point::new(rect.max_x, rect.mid_y()),
                    ),
                ];
                for (line, target) in self.lines[..2].iter_mut().zip(targets) {
                    batch.animate(line, pulse, |line| line.set(target));
                }
            }
            ConstructionCircleState::DrawCross => {
                let targets = [
                    PointPair::new(
                        Point::new(rect.min_x, rect.min_y),
                        Point::new(rect.max_x, rect.max_y),
                    ),
                    PointPair::new(
                        Point::new(rect.max_x, rect.min_y),
                        Point::new(rect.min_x, rect.max_y),
                    ),
                ];
                for (line, target) in self.lines[2..].iter_mut().zip(targets) {
                    batch.animate(line, pulse, |line| line.set(target));
                }
            }
            ConstructionCircleState::Pause => {}
            ConstructionCircleState::Done => {
                batch.animate(&mut self.circle, pulse, |circle| {
                    circle.stroke = ColorRef::Construction
                });
                for line in &mut self.lines {
                    batch.animate(line, pulse, |line| line.stroke = ColorRef::Construction);
                }
            }
        }

        batch
    }

    fn poll(&mut self, sink: &mut dyn RenderSink) {
        for state in self.scheduler.poll() {
            let batch = self.on_state(state);
            tracing::trace!(
                ?state,
                commands = batch.len(),
                duration = ?batch.duration(),
                "applying state"
            );
            batch.submit_to(sink);
        }
    }

    fn shapes(&self) -> Vec<Shape> {
        std::iter::once(self.circle.snapshot())
            .chain(self.lines.iter().map(ShapeModel::snapshot))
            .collect()
    }

    fn current_state(&self) -> Option<ConstructionCircleState> {
        self.scheduler.current()
    }

    fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    fn pulse(&self) -> Duration {
        self.scheduler.pulse()
    }

    fn lead_in(&self) -> Duration {
        Duration::ZERO
    }
}
