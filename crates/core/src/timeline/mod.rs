//! Discrete timelines and the pulse-driven scheduler that walks them.
//!
//! A [`Scheduler`] is polled against an injected [`Clock`]. Tick `k` (1-based)
//! of a run started at `origin` with `delay` is due at
//! `origin + delay + k * pulse` and delivers the `k - 1`th timeline state.
//! Once the terminal state is delivered no further ticks fire.

use std::{
    cell::Cell,
    fmt,
    rc::Rc,
    time::{Duration, Instant},
};

use crate::{Result, ZellijError};

/// Longest accepted pulse. Keeps every timeline span well inside the range
/// of [`Duration`].
pub const MAX_PULSE: Duration = Duration::from_secs(60 * 60);

/// Monotonic time source shared by every scheduler of a pattern.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

pub type SharedClock = Rc<dyn Clock>;

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    time: Rc<Cell<Duration>>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.time.set(Duration::ZERO);
    }

    pub fn advance(&self, delta: Duration) {
        self.time.set(self.time.get() + delta);
    }

    pub fn set(&self, time: Duration) {
        self.time.set(time);
    }

    pub fn shared(&self) -> SharedClock {
        Rc::new(self.clone())
    }
}

impl Clock for PlaybackClock {
    fn now(&self) -> Duration {
        self.time.get()
    }
}

/// Real time, measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for WallClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Cancellation flag that also observes every ancestor token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Rc<TokenNode>,
}

#[derive(Debug, Default)]
struct TokenNode {
    cancelled: Cell<bool>,
    parent: Option<Rc<TokenNode>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that is cancelled when either it or `self` is cancelled.
    pub fn child(&self) -> Self {
        Self {
            inner: Rc::new(TokenNode {
                cancelled: Cell::new(false),
                parent: Some(self.inner.clone()),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        let mut node = Some(&self.inner);
        while let Some(current) = node {
            if current.cancelled.get() {
                return true;
            }
            node = current.parent.as_ref();
        }
        false
    }
}

/// A pattern's set of discrete states with its fixed ordering.
pub trait TimelineState: Copy + PartialEq + fmt::Debug + 'static {
    /// Ordered states; the first is the initial state, the last the terminal one.
    const TIMELINE: &'static [Self];

    fn timeline() -> Result<Timeline<Self>> {
        Timeline::new(Self::TIMELINE.to_vec())
    }
}

/// Non-empty ordered list of states, one pulse each.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline<S> {
    states: Vec<S>,
}

impl<S: Copy> Timeline<S> {
    pub fn new(states: Vec<S>) -> Result<Self> {
        if states.is_empty() {
            return Err(ZellijError::EmptyTimeline);
        }
        Ok(Self { states })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<S> {
        self.states.get(index).copied()
    }

    pub fn initial(&self) -> S {
        self.states[0]
    }

    pub fn terminal(&self) -> S {
        self.states[self.states.len() - 1]
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    /// Time needed to step through every state once.
    pub fn duration(&self, pulse: Duration) -> Duration {
        pulse * self.states.len() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Running {
        origin: Duration,
        delay: Duration,
        /// Number of ticks delivered so far.
        delivered: usize,
    },
    Stopped,
}

/// Advances through a timeline one state per pulse.
pub struct Scheduler<S> {
    timeline: Timeline<S>,
    pulse: Duration,
    clock: SharedClock,
    phase: Phase,
    token: CancelToken,
}

impl<S: Copy + fmt::Debug> Scheduler<S> {
    pub fn new(timeline: Timeline<S>, pulse: Duration, clock: SharedClock) -> Result<Self> {
        if pulse.is_zero() || pulse > MAX_PULSE {
            return Err(ZellijError::InvalidPulse(pulse));
        }

        Ok(Self {
            timeline,
            pulse,
            clock,
            phase: Phase::Idle,
            token: CancelToken::new(),
        })
    }

    pub fn pulse(&self) -> Duration {
        self.pulse
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. }) && !self.token.is_cancelled()
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.phase, Phase::Stopped) || self.token.is_cancelled()
    }

    /// Errors with [`ZellijError::AlreadyRunning`] unless the scheduler is idle
    /// or stopped.
    pub fn ensure_startable(&self) -> Result<()> {
        if self.is_running() {
            return Err(ZellijError::AlreadyRunning);
        }
        Ok(())
    }

    pub fn start(&mut self, delay: Duration) -> Result<()> {
        self.start_with_token(delay, CancelToken::new())
    }

    /// Starts a run that is also cancelled when `parent` is.
    pub fn start_linked(&mut self, delay: Duration, parent: &CancelToken) -> Result<()> {
        self.start_with_token(delay, parent.child())
    }

    fn start_with_token(&mut self, delay: Duration, token: CancelToken) -> Result<()> {
        if self.is_running() {
            tracing::warn!("ignoring start on a running scheduler");
            return Err(ZellijError::AlreadyRunning);
        }

        let origin = self.clock.now();
        let end = origin
            .checked_add(delay)
            .and_then(|start| start.checked_add(self.timeline.duration(self.pulse)));
        if end.is_none() {
            return Err(ZellijError::InvalidConfig(format!(
                "delay {delay:?} is too long to schedule"
            )));
        }

        tracing::debug!(
            ?origin,
            ?delay,
            states = self.timeline.len(),
            "scheduler started"
        );

        self.token = token;
        self.phase = Phase::Running {
            origin,
            delay,
            delivered: 0,
        };
        Ok(())
    }

    /// Cancels every pending tick. Idempotent.
    pub fn stop(&mut self) {
        if !matches!(self.phase, Phase::Stopped) {
            tracing::debug!("scheduler stopped");
        }
        self.token.cancel();
        self.phase = Phase::Stopped;
    }

    /// Last delivered state, if any tick has fired.
    pub fn current(&self) -> Option<S> {
        match self.phase {
            Phase::Running { delivered, .. } if delivered > 0 => self.timeline.get(delivered - 1),
            _ => None,
        }
    }

    /// Index of the last delivered state.
    pub fn index(&self) -> Option<usize> {
        match self.phase {
            Phase::Running { delivered, .. } if delivered > 0 => Some(delivered - 1),
            _ => None,
        }
    }

    /// Time at which the next tick fires, if one is still pending.
    pub fn next_due(&self) -> Option<Duration> {
        match self.phase {
            Phase::Running {
                origin,
                delay,
                delivered,
            } if delivered < self.timeline.len() && !self.token.is_cancelled() => {
                Some(origin + delay + self.pulse * (delivered as u32 + 1))
            }
            _ => None,
        }
    }

    /// Returns every state whose tick has come due since the last poll, in
    /// timeline order.
    pub fn poll(&mut self) -> Vec<S> {
        if self.token.is_cancelled() {
            self.phase = Phase::Stopped;
            return Vec::new();
        }

        let Phase::Running {
            origin,
            delay,
            delivered,
        } = self.phase
        else {
            return Vec::new();
        };

        let start = origin + delay;
        let elapsed = self.clock.now().saturating_sub(start);
        let due = (elapsed.as_nanos() / self.pulse.as_nanos()).min(self.timeline.len() as u128);
        let due = due as usize;

        if due <= delivered {
            return Vec::new();
        }

        let states: Vec<S> = self.timeline.states()[delivered..due].to_vec();
        for (offset, state) in states.iter().enumerate() {
            tracing::debug!(index = delivered + offset, ?state, "timeline transition");
        }

        self.phase = Phase::Running {
            origin,
            delay,
            delivered: due,
        };
        states
    }
}

impl<S: fmt::Debug> fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("timeline", &self.timeline)
            .field("pulse", &self.pulse)
            .field("phase", &self.phase)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
