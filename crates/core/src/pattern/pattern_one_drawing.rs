use std::time::Duration;

use crate::{
    config::FinaleConfig,
    geometry::{bounded_line, circle_points, intersect, Point, PointPair, Rect, RectHalf},
    render::{Repeat, RenderSink, Transition, UpdateBatch},
    shape::{ColorRef, LineShape, PulsingMarker, Shape, ShapeModel},
    timeline::{CancelToken, Scheduler, SharedClock, TimelineState},
    Result,
};

use super::{start_scheduler, PatternController, PatternOneConstruction, CIRCLE_DIVISIONS};

/// The four outside points are drawn first, then the four star points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OutsideOne,
    OutsideTwo,
    OutsideThree,
    OutsideFour,
    StarOne,
    StarTwo,
    StarThree,
    StarFour,
}

impl Stage {
    fn index(self) -> usize {
        match self {
            Stage::OutsideOne => 0,
            Stage::OutsideTwo => 1,
            Stage::OutsideThree => 2,
            Stage::OutsideFour => 3,
            Stage::StarOne => 4,
            Stage::StarTwo => 5,
            Stage::StarThree => 6,
            Stage::StarFour => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOneDrawingState {
    Initial,
    Pulse(Stage),
    Draw(Stage),
    OutsideDone,
    StarDone,
    Pause,
    Done,
}

impl TimelineState for PatternOneDrawingState {
    const TIMELINE: &'static [Self] = &[
        Self::Initial,
        Self::Pulse(Stage::OutsideOne),
        Self::Draw(Stage::OutsideOne),
        Self::Pulse(Stage::OutsideTwo),
        Self::Draw(Stage::OutsideTwo),
        Self::Pulse(Stage::OutsideThree),
        Self::Draw(Stage::OutsideThree),
        Self::Pulse(Stage::OutsideFour),
        Self::Draw(Stage::OutsideFour),
        Self::OutsideDone,
        Self::Pulse(Stage::StarOne),
        Self::Draw(Stage::StarOne),
        Self::Pulse(Stage::StarTwo),
        Self::Draw(Stage::StarTwo),
        Self::Pulse(Stage::StarThree),
        Self::Draw(Stage::StarThree),
        Self::Pulse(Stage::StarFour),
        Self::Draw(Stage::StarFour),
        Self::StarDone,
        Self::Pause,
        Self::Pause,
        Self::Done,
    ];
}

/// A point the drawing refers to by table index.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    Circle(usize),
    Outside(usize),
    Star(usize),
}

use Anchor::{Circle, Outside, Star};

/// Each intersection is between the lines through circle points `(a, b)`
/// and `(c, d)`, both extended to the full rectangle.
const OUTSIDE_INTERSECTIONS: [[usize; 4]; 4] =
    [[4, 7, 5, 0], [3, 0, 1, 4], [5, 2, 3, 6], [7, 2, 1, 6]];
const STAR_INTERSECTIONS: [[usize; 4]; 4] =
    [[6, 3, 4, 7], [6, 1, 0, 5], [2, 5, 4, 1], [2, 7, 0, 3]];

/// Markers flashed by each stage's pulse.
const PULSES: [[Anchor; 3]; 8] = [
    [Circle(5), Circle(7), Outside(0)],
    [Circle(3), Circle(1), Outside(1)],
    [Circle(5), Circle(3), Outside(2)],
    [Circle(1), Circle(7), Outside(3)],
    [Circle(6), Star(0), Star(1)],
    [Circle(4), Star(0), Star(2)],
    [Circle(0), Star(1), Star(3)],
    [Circle(2), Star(2), Star(3)],
];

/// Origin and the two far ends drawn by each stage; stage `s` owns lines
/// `2s` and `2s + 1`.
const DRAWS: [[Anchor; 3]; 8] = [
    [Outside(0), Circle(5), Circle(7)],
    [Outside(1), Circle(3), Circle(1)],
    [Outside(2), Circle(5), Circle(3)],
    [Outside(3), Circle(7), Circle(1)],
    [Circle(6), Star(0), Star(1)],
    [Circle(4), Star(0), Star(2)],
    [Circle(0), Star(1), Star(3)],
    [Circle(2), Star(2), Star(3)],
];

/// Line through two circle points clipped to one half of the rectangle.
#[derive(Debug, Clone, Copy)]
struct HalfClip {
    from: usize,
    to: usize,
    half: RectHalf,
    flipped: bool,
}

const fn clip(from: usize, to: usize, half: RectHalf, flipped: bool) -> HalfClip {
    HalfClip {
        from,
        to,
        half,
        flipped,
    }
}

/// Where the outside lines settle once all four outside points are drawn.
const OUTSIDE_BOUNDS: [HalfClip; 8] = [
    clip(5, 0, RectHalf::Left, true),
    clip(7, 4, RectHalf::Right, false),
    clip(3, 0, RectHalf::Left, true),
    clip(1, 4, RectHalf::Right, false),
    clip(5, 2, RectHalf::Top, true),
    clip(3, 6, RectHalf::Bottom, true),
    clip(7, 2, RectHalf::Top, false),
    clip(1, 6, RectHalf::Bottom, false),
];

/// Finale swing targets: 0..8 for the outside lines, 8..16 for the star lines.
const FINALE_PAIRS: [HalfClip; 16] = [
    clip(5, 6, RectHalf::Left, true),
    clip(7, 6, RectHalf::Right, false),
    clip(3, 2, RectHalf::Left, true),
    clip(1, 2, RectHalf::Right, false),
    clip(5, 4, RectHalf::Top, false),
    clip(3, 4, RectHalf::Bottom, false),
    clip(7, 0, RectHalf::Top, true),
    clip(1, 0, RectHalf::Bottom, true),
    clip(5, 6, RectHalf::Top, true),
    clip(7, 6, RectHalf::Top, false),
    clip(4, 5, RectHalf::Top, false),
    clip(4, 3, RectHalf::Bottom, false),
    clip(0, 7, RectHalf::Top, true),
    clip(0, 1, RectHalf::Bottom, true),
    clip(2, 3, RectHalf::Bottom, true),
    clip(2, 1, RectHalf::Bottom, false),
];

/// Geometry derived once per start.
#[derive(Debug, Clone)]
struct DrawingLayout {
    points: Vec<Point>,
    outside: [Point; 4],
    star: [Point; 4],
    outside_bounds: [PointPair; 8],
    finale: [PointPair; 16],
}

impl DrawingLayout {
    fn new(rect: &Rect) -> Self {
        let points = circle_points(
            rect.width().min(rect.height()) * 0.5,
            rect.center(),
            CIRCLE_DIVISIONS,
        );

        let crossing = |[a, b, c, d]: [usize; 4]| {
            intersect(
                bounded_line(points[a], points[b], rect),
                bounded_line(points[c], points[d], rect),
            )
        };
        let clipped = |clip: HalfClip| {
            let half = rect.divided(clip.half);
            let pair = bounded_line(points[clip.from], points[clip.to], &half);
            if clip.flipped {
                pair.flipped()
            } else {
                pair
            }
        };

        Self {
            outside: OUTSIDE_INTERSECTIONS.map(crossing),
            star: STAR_INTERSECTIONS.map(crossing),
            outside_bounds: OUTSIDE_BOUNDS.map(clipped),
            finale: FINALE_PAIRS.map(clipped),
            points,
        }
    }

    fn resolve(&self, anchor: Anchor) -> Point {
        match anchor {
            Anchor::Circle(index) => self.points[index],
            Anchor::Outside(index) => self.outside[index],
            Anchor::Star(index) => self.star[index],
        }
    }
}

/// Draws the eight-point star over the construction lines.
#[derive(Debug)]
pub struct PatternOneDrawing {
    scheduler: Scheduler<PatternOneDrawingState>,
    construction: PatternOneConstruction,
    finale: FinaleConfig,
    layout: Option<DrawingLayout>,
    markers: [PulsingMarker; 3],
    /// Outside lines 0..8, star lines 8..16.
    lines: [LineShape; 16],
}

impl PatternOneDrawing {
    pub fn new(clock: SharedClock, pulse: Duration) -> Result<Self> {
        Self::with_finale(clock, pulse, FinaleConfig::default())
    }

    pub fn with_finale(clock: SharedClock, pulse: Duration, finale: FinaleConfig) -> Result<Self> {
        finale.validate()?;
        Ok(Self {
            scheduler: Scheduler::new(
                PatternOneDrawingState::timeline()?,
                pulse,
                clock.clone(),
            )?,
            construction: PatternOneConstruction::new(clock, pulse)?,
            finale,
            layout: None,
            markers: std::array::from_fn(|_| PulsingMarker::zero()),
            lines: std::array::from_fn(|_| LineShape::zero()),
        })
    }

    pub fn construction(&self) -> &PatternOneConstruction {
        &self.construction
    }

    pub fn markers(&self) -> &[PulsingMarker] {
        &self.markers
    }

    pub fn lines(&self) -> &[LineShape] {
        &self.lines
    }

    pub fn outside_intersections(&self) -> Option<&[Point; 4]> {
        self.layout.as_ref().map(|layout| &layout.outside)
    }

    pub fn star_intersections(&self) -> Option<&[Point; 4]> {
        self.layout.as_ref().map(|layout| &layout.star)
    }

    fn finale_transition(&self) -> Transition {
        Transition::linear(self.finale.swing(self.scheduler.pulse())).repeating(Repeat {
            count: self.finale.repeat_count,
            autoreverses: self.finale.autoreverses,
        })
    }
}

impl PatternController for PatternOneDrawing {
    type State = PatternOneDrawingState;

    fn start_linked(
        &mut self,
        rect: Rect,
        delay: Duration,
        parent: Option<&CancelToken>,
    ) -> Result<()> {
        self.scheduler.ensure_startable()?;
        self.construction.stop();

        let layout = DrawingLayout::new(&rect);
        let lead_in = self.lead_in();
        start_scheduler(&mut self.scheduler, delay, lead_in, parent)?;
        if let Err(err) = self
            .construction
            .start_linked(rect, delay, Some(self.scheduler.token()))
        {
            self.scheduler.stop();
            return Err(err);
        }

        self.layout = Some(layout);
        tracing::info!(?rect, ?delay, ?lead_in, "pattern one drawing started");
        Ok(())
    }

    fn stop(&mut self) {
        self.scheduler.stop();
        self.construction.stop();
    }

    fn on_state(&mut self, state: PatternOneDrawingState) -> UpdateBatch {
        let mut batch = UpdateBatch::new();
        let finale = self.finale_transition();
        let Self {
            scheduler,
            layout,
            markers,
            lines,
            finale: finale_config,
            ..
        } = self;
        let Some(layout) = layout.as_ref() else {
            return batch;
        };
        let pulse = Transition::linear(scheduler.pulse());

        match state {
            PatternOneDrawingState::Initial => {
                for marker in markers.iter_mut() {
                    batch.snap(marker, |marker| {
                        marker.progress = 0.0;
                        marker.center = Point::ZERO;
                        marker.alpha = 0.0;
                        marker.color = ColorRef::Default;
                    });
                }
                for line in lines.iter_mut() {
                    batch.snap(line, |line| {
                        line.reset(Point::ZERO);
                        line.stroke = ColorRef::Default;
                    });
                }
            }
            PatternOneDrawingState::Pulse(stage) => {
                let centers = PULSES[stage.index()].map(|anchor| layout.resolve(anchor));
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
            PatternOneDrawingState::Draw(stage) => {
                let [origin, first_end, second_end] =
                    DRAWS[stage.index()].map(|anchor| layout.resolve(anchor));
                let first = stage.index() * 2;
                for (line_index, end) in [(first, first_end), (first + 1, second_end)] {
                    batch.snap(&mut lines[line_index], |line| line.reset(origin));
                    batch.animate(&mut lines[line_index], pulse, |line| {
                        line.set(PointPair::new(origin, end))
                    });
                }
            }
            PatternOneDrawingState::OutsideDone => {
                for (line, target) in lines[..8].iter_mut().zip(layout.outside_bounds) {
                    batch.animate(line, pulse, |line| line.set(target));
                }
            }
            PatternOneDrawingState::StarDone | PatternOneDrawingState::Pause => {}
            PatternOneDrawingState::Done => {
                let swinging = if finale_config.animate_star_lines {
                    lines.len()
                } else {
                    8
                };
                for (line, target) in lines[..swinging].iter_mut().zip(layout.finale) {
                    batch.animate(line, finale, |line| line.set(target));
                }
            }
        }

        batch
    }

    fn poll(&mut self, sink: &mut dyn RenderSink) {
        self.construction.poll(sink);
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
        let mut shapes = self.construction.shapes();
        shapes.extend(self.markers.iter().map(ShapeModel::snapshot));
        shapes.extend(self.lines.iter().map(ShapeModel::snapshot));
        shapes
    }

    fn current_state(&self) -> Option<PatternOneDrawingState> {
        self.scheduler.current()
    }

    fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    fn pulse(&self) -> Duration {
        self.scheduler.pulse()
    }

    fn lead_in(&self) -> Duration {
        self.construction.span()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pattern::{
            test_support::{close, line_target},
            PatternOneConstructionState,
        },
        render::RenderCommand,
        timeline::PlaybackClock,
        ZellijError,
    };

    const PULSE: Duration = Duration::from_millis(500);

    fn rect() -> Rect {
        Rect::new(0.0, 0.0, 100.0, 100.0)
    }

    fn started(clock: &PlaybackClock, finale: FinaleConfig) -> PatternOneDrawing {
        let mut controller =
            PatternOneDrawing::with_finale(clock.shared(), PULSE, finale).unwrap();
        controller.start(rect(), Duration::ZERO).unwrap();
        controller
    }

    fn poll_at(
        clock: &PlaybackClock,
        controller: &mut PatternOneDrawing,
        time: Duration,
    ) -> Vec<RenderCommand> {
        clock.set(time);
        let mut sink = Vec::new();
        controller.poll(&mut sink);
        sink
    }

    /// Time at which this controller's own tick `k` fires.
    fn own_tick(controller: &PatternOneDrawing, k: u32) -> Duration {
        controller.lead_in() + PULSE * k
    }

    #[test]
    fn delays_compose_through_grandchildren() {
        let clock = PlaybackClock::new();
        let controller = started(&clock, FinaleConfig::default());
        assert_eq!(controller.construction().lead_in(), PULSE * 7);
        assert_eq!(controller.lead_in(), PULSE * 20);
        assert_eq!(controller.span(), PULSE * 42);
    }

    #[test]
    fn first_transition_follows_the_whole_construction() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, FinaleConfig::default());

        poll_at(&clock, &mut controller, PULSE * 20);
        assert_eq!(
            controller.construction().current_state(),
            Some(PatternOneConstructionState::Done)
        );
        assert_eq!(controller.current_state(), None);

        poll_at(&clock, &mut controller, PULSE * 21 - Duration::from_nanos(1));
        assert_eq!(controller.current_state(), None);

        let commands = poll_at(&clock, &mut controller, PULSE * 21);
        assert_eq!(controller.current_state(), Some(PatternOneDrawingState::Initial));
        assert_eq!(commands.len(), 3 + 16);
    }

    #[test]
    fn intersections_form_the_inner_octagon() {
        let clock = PlaybackClock::new();
        let controller = started(&clock, FinaleConfig::default());
        let center = rect().center();
        let inner = 50.0 * (std::f64::consts::SQRT_2 - 1.0);

        let outside = controller.outside_intersections().unwrap();
        let star = controller.star_intersections().unwrap();
        for point in outside.iter().chain(star) {
            assert!((point.distance(center) - inner).abs() < 1e-9, "{point:?}");
        }

        // Lines 4-7 and 5-0 cross on the vertical axis above the center.
        assert!(close(outside[0], Point::new(50.0, 50.0 - inner)));
        assert!(close(outside[1], Point::new(50.0, 50.0 + inner)));
    }

    #[test]
    fn pulse_and_draw_use_the_stage_tables() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, FinaleConfig::default());
        let tick = |k| own_tick(&controller, k);
        let (pulse_time, draw_time) = (tick(2), tick(3));

        poll_at(&clock, &mut controller, pulse_time);
        assert_eq!(
            controller.current_state(),
            Some(PatternOneDrawingState::Pulse(Stage::OutsideOne))
        );
        let points = controller.construction().circle_points().to_vec();
        let outside = *controller.outside_intersections().unwrap();
        assert!(close(controller.markers()[0].center, points[5]));
        assert!(close(controller.markers()[1].center, points[7]));
        assert!(close(controller.markers()[2].center, outside[0]));

        let commands = poll_at(&clock, &mut controller, draw_time);
        assert_eq!(commands.len(), 4);
        let (start, end) = line_target(&commands[1]);
        assert!(close(start, outside[0]) && close(end, points[5]));
        let (start, end) = line_target(&commands[3]);
        assert!(close(start, outside[0]) && close(end, points[7]));
    }

    #[test]
    fn star_stages_draw_from_circle_points() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, FinaleConfig::default());
        let time = own_tick(&controller, 12);

        let commands = poll_at(&clock, &mut controller, time);
        assert_eq!(
            controller.current_state(),
            Some(PatternOneDrawingState::Draw(Stage::StarOne))
        );
        let points = controller.construction().circle_points().to_vec();
        let star = *controller.star_intersections().unwrap();
        let line = &controller.lines()[8];
        assert!(close(line.start, points[6]) && close(line.end, star[0]));
        let line = &controller.lines()[9];
        assert!(close(line.start, points[6]) && close(line.end, star[1]));
        assert!(!commands.is_empty());
    }

    #[test]
    fn outside_done_settles_lines_inside_their_halves() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, FinaleConfig::default());
        let time = own_tick(&controller, 10);

        poll_at(&clock, &mut controller, time);
        assert_eq!(
            controller.current_state(),
            Some(PatternOneDrawingState::OutsideDone)
        );

        let halves = [
            RectHalf::Left,
            RectHalf::Right,
            RectHalf::Left,
            RectHalf::Right,
            RectHalf::Top,
            RectHalf::Bottom,
            RectHalf::Top,
            RectHalf::Bottom,
        ];
        let inside = |p: Point, r: Rect| {
            p.x >= r.min_x - 1e-9
                && p.x <= r.max_x + 1e-9
                && p.y >= r.min_y - 1e-9
                && p.y <= r.max_y + 1e-9
        };
        for (line, half) in controller.lines()[..8].iter().zip(halves) {
            let bounds = rect().divided(half);
            assert!(inside(line.start, bounds) && inside(line.end, bounds), "{line:?}");
            assert!(!line.is_collapsed());
        }
        assert!(controller.lines()[8..].iter().all(LineShape::is_collapsed));
    }

    #[test]
    fn done_swings_outside_lines_with_a_repeating_transition() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, FinaleConfig::default());
        let time = own_tick(&controller, 22);

        let commands = poll_at(&clock, &mut controller, time);
        assert_eq!(controller.current_state(), Some(PatternOneDrawingState::Done));

        let finale: Vec<_> = commands
            .iter()
            .filter(|command| command.transition.repeat.is_some())
            .collect();
        assert_eq!(finale.len(), 8);
        for command in finale {
            assert_eq!(command.transition.duration, Duration::from_millis(750));
            assert_eq!(
                command.transition.repeat,
                Some(Repeat {
                    count: 20,
                    autoreverses: true
                })
            );
        }

        clock.set(time + PULSE * 100);
        let mut sink = Vec::new();
        controller.poll(&mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn finale_can_include_star_lines() {
        let clock = PlaybackClock::new();
        let finale = FinaleConfig {
            repeat_count: 3,
            animate_star_lines: true,
            ..FinaleConfig::default()
        };
        let mut controller = started(&clock, finale);
        let time = own_tick(&controller, 22);

        let commands = poll_at(&clock, &mut controller, time);
        let repeating = commands
            .iter()
            .filter(|command| command.transition.repeat.map(|r| r.count) == Some(3))
            .count();
        assert_eq!(repeating, 16);
    }

    #[test]
    fn stop_silences_the_whole_tree() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, FinaleConfig::default());
        poll_at(&clock, &mut controller, PULSE * 3);

        controller.stop();
        assert!(poll_at(&clock, &mut controller, PULSE * 100).is_empty());
        assert!(!controller.construction().is_running());
        assert!(!controller.construction().construction_circle().is_running());
    }

    #[test]
    fn rejected_restart_keeps_the_running_layout() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, FinaleConfig::default());
        let time = own_tick(&controller, 3);
        poll_at(&clock, &mut controller, time);
        let star = *controller.star_intersections().unwrap();
        let points = controller.construction().circle_points().to_vec();

        let result = controller.start(Rect::new(0.0, 0.0, 300.0, 300.0), Duration::ZERO);
        assert!(matches!(result, Err(ZellijError::AlreadyRunning)));
        assert_eq!(*controller.star_intersections().unwrap(), star);
        assert_eq!(controller.construction().circle_points(), points.as_slice());
        assert!(controller.construction().is_running());
        assert_eq!(
            controller.current_state(),
            Some(PatternOneDrawingState::Draw(Stage::OutsideOne))
        );

        let time = own_tick(&controller, 4);
        poll_at(&clock, &mut controller, time);
        assert_eq!(
            controller.current_state(),
            Some(PatternOneDrawingState::Pulse(Stage::OutsideTwo))
        );
    }

    #[test]
    fn oversized_pulse_is_rejected_at_construction() {
        let clock = PlaybackClock::new();
        let pulse = Duration::from_secs(1_000_000_000_000_000_000);
        let result = PatternOneDrawing::new(clock.shared(), pulse);
        assert!(matches!(result, Err(ZellijError::InvalidPulse(_))));
    }

    #[test]
    fn unschedulable_delay_starts_nothing() {
        let clock = PlaybackClock::new();
        let mut controller = PatternOneDrawing::new(clock.shared(), PULSE).unwrap();

        let result = controller.start(rect(), Duration::MAX);
        assert!(matches!(result, Err(ZellijError::InvalidConfig(_))));
        assert!(!controller.is_running());
        assert!(!controller.construction().is_running());
        assert!(controller.star_intersections().is_none());

        controller.start(rect(), Duration::ZERO).unwrap();
        assert!(controller.is_running());
        assert!(controller.construction().construction_circle().is_running());
    }

    #[test]
    fn restart_reproduces_identical_geometry() {
        let clock = PlaybackClock::new();
        let mut controller = started(&clock, FinaleConfig::default());
        let first = *controller.star_intersections().unwrap();

        controller.stop();
        controller.start(rect(), Duration::ZERO).unwrap();
        assert_eq!(*controller.star_intersections().unwrap(), first);

        controller.stop();
        controller
            .start(Rect::new(0.0, 0.0, 300.0, 300.0), Duration::ZERO)
            .unwrap();
        let scaled = controller.star_intersections().unwrap();
        assert!(close(scaled[0], Point::new(first[0].x * 3.0, first[0].y * 3.0)));
    }
}
