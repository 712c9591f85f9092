use std::time::Duration;

use crate::{
    geometry::{bounded_line, circle_points, Point, PointPair, Rect},
    render::{RenderSink, Transition, UpdateBatch},
    shape::{ColorRef, LineShape, PulsingMarker, Shape, ShapeModel},
    timeline::{CancelToken, Scheduler, SharedClock, TimelineState},
    Result,
};

use super::{start_scheduler, ConstructionCircle, PatternController, CIRCLE_DIVISIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quarter {
    One,
    Two,
    Three,
    Four,
}

impl Quarter {
    fn index(self) -> usize {
        match self {
            Quarter::One => 0,
            Quarter::Two => 1,
            Quarter::Three => 2,
            Quarter::Four => 3,
        }
    }
}

/// Chords between circle points that are later extended to the rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOneConstructionState {
    Initial,
    Pulse(Quarter),
    DrawLines(Quarter),
    ExtendLines,
    Pause,
    Done,
}

impl TimelineState for PatternOneConstructionState {
    const TIMELINE: &'static [Self] = &[
        Self::Initial,
        Self::Pulse(Quarter::One),
        Self::DrawLines(Quarter::One),
        Self::Pulse(Quarter::Two),
        Self::DrawLines(Quarter::Two),
        Self::Pulse(Quarter::Three),
        Self::DrawLines(Quarter::Three),
        Self::Pulse(Quarter::Four),
        Self::DrawLines(Quarter::Four),
        Self::Pause,
        Self::ExtendLines,
        Self::Pause,
        Self::Done,
    ];
}

/// Circle point indices flashed by each pulse.
const PULSE_POINTS: [[usize; 3]; 4] = [[0, 3, 5], [4, 7, 1], [2, 5, 7], [6, 1, 3]];

/// Chord endpoints by line; quarter `q` draws lines `2q` and `2q + 1`.
const CHORDS: [(usize, usize); 8] = [
    (0, 3),
    (0, 5),
    (4, 1),
    (4, 7),
    (2, 5),
    (2, 7),
    (6, 1),
    (6, 3),
];

/// Extended chords that grow from their far end.
const EXTEND_FLIPPED: [bool; 8] = [true, true, false, false, true, false, false, true];

#[derive(Debug, Clone)]
struct ConstructionLayout {
    points: Vec<Point>,
    extended: [PointPair; 8],
}

impl ConstructionLayout {
    fn new(rect: &Rect) -> Self {
        let points = circle_points(
            rect.width().min(rect.height()) * 0.5,
            rect.center(),
            CIRCLE_DIVISIONS,
        );
        let extended = std::array::from_fn(|line| {
            let (a, b) = CHORDS[line];
            let pair = bounded_line(points[a], points[b], rect);
            if EXTEND_FLIPPED[line] {
                pair.flipped()
            } else {
                pair
            }
        });
        Self { points, extended }
    }
}

#[derive(Debug)]
pub struct PatternOneConstruction {
    scheduler: Scheduler<PatternOneConstructionState>,
    circle: ConstructionCircle,
    layout: Option<ConstructionLayout>,
    markers: [PulsingMarker; 3],
    lines: [LineShape; 8],
}

impl PatternOneConstruction {
    pub fn new(clock: SharedClock, pulse: Duration) -> Result<Self> {
        Ok(Self {
            scheduler: Scheduler::new(
                PatternOneConstructionState::timeline()?,
                pulse,
                clock.clone(),
            )?,
            circle: ConstructionCircle::new(clock, pulse)?,
            layout: None,
            markers: std::array::from_fn(|_| PulsingMarker::zero()),
            lines: std::array::from_fn(|_| LineShape::zero()),
        })
    }

    pub fn construction_circle(&self) -> &ConstructionCircle {
        &self.circle
    }

    /// Circle points derived from the last started rectangle.
    pub fn circle_points(&self) -> &[Point] {
        self.layout
            .as_ref()
            .map(|layout| layout.points.as_slice())
            .unwrap_or(&[])
    }

    pub fn markers(&self) -> &[PulsingMarker] {
        &self.markers
    }

    pub fn lines(&self) -> &[LineShape] {
        &self.lines
    }
}

impl PatternController for PatternOneConstruction {
    type State = PatternOneConstructionState;

    fn start_linked(
        &mut self,
        rect: Rect,
        delay: Duration,
        parent: Option<&CancelToken>,
    ) -> Result<()> {
        self.scheduler.ensure_startable()?;
        self.circle.stop();

        let layout = ConstructionLayout::new(&rect);
        let lead_in = self.lead_in();
        start_scheduler(&mut self.scheduler, delay, lead_in, parent)?;
        if let Err(err) = self
            .circle
            .start_linked(rect, delay, Some(self.scheduler.token()))
        {
            self.scheduler.stop();
            return Err(err);
        }

        self.layout = Some(layout);
        tracing::info!(?rect, ?delay, "pattern one construction started");
        Ok(())
    }

    fn stop(&mut self) {
        self.scheduler.stop();
        self.circle.stop();
    }

    fn on_state(&mut self, state: PatternOneConstructionState) -> UpdateBatch {
        let mut batch = UpdateBatch::new();
        let Self {
            scheduler,
            layout,
            markers,
            lines,
            ..
        } = self;
        let Some(layout) = layout.as_ref() else {
            return batch;
        };
        let pulse = Transition::linear(scheduler.pulse());

        match state {
            PatternOneConstructionState::Initial => {
                for marker in markers.iter_mut() {
                    batch.snap(marker, |marker| {
                        marker.progress = 0.0;
                        marker.center = Point::ZERO;
                        marker.alpha = 0.0;
                        marker.color = ColorRef::Drawing;
                    });
                }
                for line in lines.iter_mut() {
                    batch.snap(line, |line| {
                        line.reset(Point::ZERO);
                        line.stroke = ColorRef::Drawing;
                    });
                }
            }
            PatternOneConstructionState::Pulse(quarter) => {
                let centers = PULSE_POINTS[quarter.index()].map(|index| layout.points[index]);
                for (marker, center) in markers.iter_mut().zip(centers) {
                    batch.snap(marker, |marker| {
                        marker.center = center;
                        marker.reset();
                    });
                }
                for marker in markers.iter_mut() {
                    batch.animate(marker, pulse, PulsingMarker::expand);
                }
            }
            PatternOneConstructionState::DrawLines(quarter) => {
                let first = quarter.index() * 2;
                for line_index in first..first + 2 {
                    let (from, to) = CHORDS[line_index];
                    let (from, to) = (layout.points[from], layout.points[to]);
                    batch.snap(&mut lines[line_index], |line| line.reset(from));
                    batch.animate(&mut lines[line_index], pulse, |line| {
                        line.set(PointPair::new(from, to))
                    });
                }
            }
            PatternOneConstructionState::ExtendLines => {
                for (line, target) in lines.iter_mut().zip(layout.extended) {
                    batch.animate(line, pulse, |line| line.set(target));
                }
            }
            PatternOneConstructionState::Pause => {}
            PatternOneConstructionState::Done => {
                for marker in markers.iter_mut() {
                    batch.animate(marker, pulse, |marker| marker.color = ColorRef::Construction);
                }
                for line in lines.iter_mut() {
                    batch.animate(line, pulse, |line| line.stroke = ColorRef::Construction);
                }
            }
        }

        batch
    }

    fn poll(&mut self, sink: &mut dyn RenderSink) {
        self.circle.poll(sink);
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
        let mut shapes = self.circle.shapes();
        shapes.extend(self.markers.iter().map(ShapeModel::snapshot));
        shapes.extend(self.lines.iter().map(ShapeModel::snapshot));
        shapes
    }

    fn current_state(&self) -> Option<PatternOneConstructionState> {
        self.scheduler.current()
    }

    fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    fn pulse(&self) -> Duration {
        self.scheduler.pulse()
    }

    fn lead_in(&self) -> Duration {
        self.circle.span()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pattern::{
            test_support::{close, line_target},
            ConstructionCircleState,
        },
        render::RenderCommand,
        timeline::PlaybackClock,
        ZellijError,
    };

    const PULSE: Duration = Duration::from_millis(500);

    fn started(clock: &PlaybackClock, delay: Duration) -> PatternOneConstruction {
        let mut controller = PatternOneConstruction::new(clock.shared(), PULSE).unwrap();
        controller
            .start(Rect::new(0.0, 0.0, 100.0, 100.0), delay)
            .unwrap();
        controller
    }

    fn poll(controller: &mut PatternOneConstruction) -> Vec<RenderCommand> {
        let mut sink = Vec::new();
        controller.poll(&mut sink);
        sink
    }

    #[test]
    fn waits_for_the_construction_circle() {
        let clock = PlaybackClock::new();
        let delay = Duration::from_secs(1);
        let mut controller = started(&clock, delay);
        assert_eq!(controller.lead_in(), PULSE * 7);
        assert_eq!(controller.span(), PULSE * 20);

        clock.set(delay + PULSE * 7);
        poll(&mut controller);
        assert_eq!(
            controller.construction_circle().current_state(),
            Some(ConstructionCircleState::Done)
        );
        assert_eq!(controller.current_state(), None);

        clock.set(delay + PULSE * 8);
        poll(&mut controller);
        assert_eq!(
            controller.current_state(),
            Some(PatternOneConstructionState::Initial)
        );
    }

    #[test]
    fn samples_eight_points_on_the_inscribed_circle() {
        let clock = PlaybackClock::new();
        let controller = started(&clock, Duration::ZERO);
        let points = controller.circle_points();
        assert_eq!(points.len(), 8);
        assert!(close(points[0], Point::new(100.0, 50.0)));
        assert!(close(points[2], Point::new(50.0, 100.0)));
        assert!(close(points[4], Point::new(0.0, 50.0)));
    }

    #[test]
    fn pulses_flash_three_markers() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, Duration::ZERO);
        clock.set(PULSE * 8);
        poll(&mut controller);

        clock.set(PULSE * 9);
        let commands = poll(&mut controller);
        assert_eq!(
            controller.current_state(),
            Some(PatternOneConstructionState::Pulse(Quarter::One))
        );
        assert_eq!(commands.len(), 6);
        assert!(commands[..3].iter().all(|c| c.transition.is_snap()));
        assert!(commands[3..].iter().all(|c| c.transition.duration == PULSE));

        let points = controller.circle_points().to_vec();
        for (marker, index) in controller.markers().iter().zip([0, 3, 5]) {
            assert!(close(marker.center, points[index]));
            assert_eq!((marker.progress, marker.alpha), (1.0, 0.0));
        }
    }

    #[test]
    fn draws_chords_from_a_collapsed_start() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, Duration::ZERO);
        clock.set(PULSE * 9);
        poll(&mut controller);

        clock.set(PULSE * 10);
        let commands = poll(&mut controller);
        let points = controller.circle_points().to_vec();

        assert_eq!(commands.len(), 4);
        let (start, end) = line_target(&commands[0]);
        assert_eq!(start, end);
        assert!(close(start, points[0]));
        let (start, end) = line_target(&commands[1]);
        assert!(close(start, points[0]) && close(end, points[3]));
        let (start, end) = line_target(&commands[3]);
        assert!(close(start, points[0]) && close(end, points[5]));
    }

    #[test]
    fn extends_every_chord_to_the_rectangle() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, Duration::ZERO);
        clock.set(PULSE * 18);
        poll(&mut controller);
        assert_eq!(
            controller.current_state(),
            Some(PatternOneConstructionState::ExtendLines)
        );

        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        let on_edge = |p: Point| {
            (p.x - rect.min_x).abs() < 1e-9
                || (p.x - rect.max_x).abs() < 1e-9
                || (p.y - rect.min_y).abs() < 1e-9
                || (p.y - rect.max_y).abs() < 1e-9
        };
        for line in controller.lines() {
            assert!(on_edge(line.start) && on_edge(line.end), "{line:?}");
        }

        // Chord 0 is flipped so it keeps growing out of point 0.
        let points = controller.circle_points().to_vec();
        let line = &controller.lines()[0];
        assert!(close(line.start, points[0]));
        let exit_y = 50.0 + 100.0 * (std::f64::consts::SQRT_2 - 1.0);
        assert!(close(line.end, Point::new(0.0, exit_y)));
    }

    #[test]
    fn stop_cascades_to_the_construction_circle() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, Duration::ZERO);
        clock.set(PULSE * 2);
        assert_eq!(poll(&mut controller).len(), 6);

        controller.stop();
        clock.set(PULSE * 40);
        assert!(poll(&mut controller).is_empty());
        assert!(!controller.construction_circle().is_running());
    }

    #[test]
    fn rejected_restart_keeps_the_running_layout() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, Duration::ZERO);
        clock.set(PULSE * 9);
        poll(&mut controller);
        let points = controller.circle_points().to_vec();

        let result = controller.start(Rect::new(0.0, 0.0, 200.0, 100.0), Duration::ZERO);
        assert!(matches!(result, Err(ZellijError::AlreadyRunning)));
        assert_eq!(controller.circle_points(), points.as_slice());
        assert_eq!(
            controller.construction_circle().rect(),
            Some(Rect::new(0.0, 0.0, 100.0, 100.0))
        );
        assert_eq!(
            controller.current_state(),
            Some(PatternOneConstructionState::Pulse(Quarter::One))
        );

        clock.set(PULSE * 10);
        poll(&mut controller);
        assert_eq!(
            controller.current_state(),
            Some(PatternOneConstructionState::DrawLines(Quarter::One))
        );
    }

    #[test]
    fn restart_recomputes_geometry() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, Duration::ZERO);
        let before = controller.circle_points().to_vec();

        controller.stop();
        controller
            .start(Rect::new(0.0, 0.0, 200.0, 100.0), Duration::ZERO)
            .unwrap();
        let after = controller.circle_points();
        assert!(close(after[0], Point::new(150.0, 50.0)));
        assert!(!close(after[0], before[0]));
    }
}
