//! Time budgets and the slices that enforce them.
//!
//! A slice is consulted after every completed node. It never interrupts a
//! node in progress.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use crate::Error;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Positive duration a traversal may run before yielding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Budget(Duration);

impl Budget {
    /// 5 ms, short enough to keep a host loop responsive.
    pub const DEFAULT: Budget = Budget(Duration::from_millis(5));

    pub fn new(duration: Duration) -> Result<Self, Error> {
        if duration.is_zero() {
            return Err(Error::InvalidBudget(format!("{duration:?}")));
        }
        Ok(Self(duration))
    }

    /// Budget in milliseconds as hosts usually express latency.
    pub fn from_millis(millis: i64) -> Result<Self, Error> {
        if millis <= 0 {
            return Err(Error::InvalidBudget(format!("{millis}ms")));
        }
        Ok(Self(Duration::from_millis(millis as u64)))
    }

    pub fn duration(self) -> Duration {
        self.0
    }

    pub fn as_millis(self) -> u128 {
        self.0.as_millis()
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Decides when a traversal must yield.
pub trait Slice {
    /// Called once after each completed node.
    fn expired(&mut self) -> bool;
}

/// Never expires. Drives synchronous materialization.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl Slice for Unbounded {
    #[inline(always)]
    fn expired(&mut self) -> bool {
        false
    }
}

/// Expires once the clock reaches the deadline.
pub struct TimeSlice<'c, C: Clock + ?Sized> {
    clock: &'c C,
    deadline: Instant,
}

impl<'c, C: Clock + ?Sized> TimeSlice<'c, C> {
    /// Open a window of `budget` starting now.
    pub fn start(clock: &'c C, budget: Budget) -> Self {
        Self {
            clock,
            deadline: clock.now() + budget.duration(),
        }
    }
}

impl<C: Clock + ?Sized> Slice for TimeSlice<'_, C> {
    fn expired(&mut self) -> bool {
        self.clock.now() >= self.deadline
    }
}

/// Expires after a fixed number of nodes.
#[derive(Clone, Copy, Debug)]
pub struct StepSlice {
    remaining: usize,
}

impl StepSlice {
    /// A slice of `nodes` nodes; zero is treated as one.
    pub fn new(nodes: usize) -> Self {
        Self {
            remaining: nodes.max(1),
        }
    }
}

impl Slice for StepSlice {
    fn expired(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// The time budget, optionally capped by a node count: whichever runs out
/// first ends the slice.
pub struct Window<'c, C: Clock + ?Sized> {
    time: TimeSlice<'c, C>,
    steps: Option<StepSlice>,
}

impl<'c, C: Clock + ?Sized> Window<'c, C> {
    pub fn open(clock: &'c C, budget: Budget, nodes: Option<NonZeroUsize>) -> Self {
        Self {
            time: TimeSlice::start(clock, budget),
            steps: nodes.map(|n| StepSlice::new(n.get())),
        }
    }
}

impl<C: Clock + ?Sized> Slice for Window<'_, C> {
    fn expired(&mut self) -> bool {
        let by_steps = self.steps.as_mut().is_some_and(StepSlice::expired);
        let by_time = self.time.expired();
        by_steps || by_time
    }
}
