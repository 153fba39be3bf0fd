//! Time-budgeted driver for materializations.
//!
//! `submit` runs the first slice of a request immediately. Requests that do
//! not finish are parked on a FIFO run-queue and continued by `drain`, which
//! the host calls from its event loop tick. Each drain gives every queued
//! continuation at most one fresh slice, in order, until the queue is empty
//! or the tick's allowance is used up.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::accounting::{AccountingHook, MemoryAccounting};
use super::host::Host;
use super::materializer::{Materializer, Outcome};
use super::slice::{Budget, Clock, Slice, SystemClock, TimeSlice, Window};
use super::trace::LogTracer;
use crate::{Error, Result};

/// Host event loop signals.
pub trait EventLoop {
    /// Ask for `drain` to be called on a future tick.
    fn request_tick(&mut self);

    /// Whether pending work should keep the host loop alive.
    fn set_keep_alive(&mut self, alive: bool);
}

/// Event loop that ignores all signals. The caller polls `pending()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventLoop;

impl EventLoop for NoopEventLoop {
    #[inline(always)]
    fn request_tick(&mut self) {}

    #[inline(always)]
    fn set_keep_alive(&mut self, _alive: bool) {}
}

/// Single-shot completion of a submitted request.
///
/// Await it, or poll with `try_take` between drains.
pub struct Pending<V> {
    rx: oneshot::Receiver<Result<V>>,
}

impl<V> Pending<V> {
    /// The result if the request finished, `None` while it is still queued.
    pub fn try_take(&mut self) -> Option<Result<V>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(Error::Abandoned)),
        }
    }
}

impl<V> Future for Pending<V> {
    type Output = Result<V>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(Error::Abandoned)))
    }
}

/// Report of one `drain` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Drain {
    /// Continuations given a slice.
    pub ran: usize,
    /// Continuations that finished, successfully or not.
    pub completed: usize,
    /// Continuations still queued.
    pub remaining: usize,
}

impl Drain {
    pub fn is_idle(&self) -> bool {
        self.remaining == 0
    }
}

/// A parked request, type-erased over its host.
trait Task {
    fn id(&self) -> u64;

    /// Run one slice. Returns `true` when the task must be parked again.
    fn run(&mut self, slice: &mut dyn Slice) -> bool;
}

struct Continuation<H: Host> {
    id: u64,
    materializer: Materializer<H>,
    sender: Option<oneshot::Sender<Result<H::Value>>>,
}

impl<H: Host> Continuation<H> {
    fn deliver(&mut self, result: Result<H::Value>) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        if sender.send(result).is_err() {
            // No cancellation: the traversal ran to the end regardless.
            debug!(continuation = self.id, "receiver dropped before completion");
        }
    }
}

impl<H: Host> Task for Continuation<H> {
    fn id(&self) -> u64 {
        self.id
    }

    fn run(&mut self, slice: &mut dyn Slice) -> bool {
        match self.materializer.resume(slice, &mut LogTracer) {
            Outcome::Suspended => true,
            Outcome::Done(value) => {
                self.deliver(Ok(value));
                false
            }
            Outcome::Failed(error) => {
                self.deliver(Err(error));
                false
            }
        }
    }
}

/// Builder for [`Scheduler`].
pub struct SchedulerBuilder<C: Clock = SystemClock> {
    budget: Budget,
    nodes_per_slice: Option<NonZeroUsize>,
    clock: C,
    event_loop: Box<dyn EventLoop>,
    accounting: Option<Arc<MemoryAccounting>>,
    hook: Option<Box<dyn AccountingHook>>,
}

impl SchedulerBuilder<SystemClock> {
    pub fn new() -> Self {
        Self {
            budget: Budget::DEFAULT,
            nodes_per_slice: None,
            clock: SystemClock,
            event_loop: Box::new(NoopEventLoop),
            accounting: None,
            hook: None,
        }
    }
}

impl Default for SchedulerBuilder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SchedulerBuilder<C> {
    /// Set the time budget of one slice.
    pub fn budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Also end a slice after `nodes` nodes, whichever comes first.
    pub fn nodes_per_slice(mut self, nodes: NonZeroUsize) -> Self {
        self.nodes_per_slice = Some(nodes);
        self
    }

    /// Replace the time source.
    pub fn clock<D: Clock>(self, clock: D) -> SchedulerBuilder<D> {
        SchedulerBuilder {
            budget: self.budget,
            nodes_per_slice: self.nodes_per_slice,
            clock,
            event_loop: self.event_loop,
            accounting: self.accounting,
            hook: self.hook,
        }
    }

    pub fn event_loop(mut self, event_loop: impl EventLoop + 'static) -> Self {
        self.event_loop = Box::new(event_loop);
        self
    }

    /// Flush `accounting` to `hook` once per drain.
    pub fn accounting(
        mut self,
        accounting: Arc<MemoryAccounting>,
        hook: impl AccountingHook + 'static,
    ) -> Self {
        self.accounting = Some(accounting);
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Scheduler<C> {
        Scheduler {
            budget: self.budget,
            nodes_per_slice: self.nodes_per_slice,
            clock: self.clock,
            event_loop: self.event_loop,
            accounting: self.accounting,
            hook: self.hook,
            queue: VecDeque::new(),
            next_id: 0,
        }
    }
}

/// Cooperative scheduler owning the run-queue of suspended continuations.
pub struct Scheduler<C: Clock = SystemClock> {
    budget: Budget,
    nodes_per_slice: Option<NonZeroUsize>,
    clock: C,
    event_loop: Box<dyn EventLoop>,
    accounting: Option<Arc<MemoryAccounting>>,
    hook: Option<Box<dyn AccountingHook>>,
    queue: VecDeque<Box<dyn Task>>,
    next_id: u64,
}

impl Scheduler<SystemClock> {
    /// A scheduler with the default budget and no host signals.
    pub fn new() -> Self {
        SchedulerBuilder::new().build()
    }

    pub fn builder() -> SchedulerBuilder<SystemClock> {
        SchedulerBuilder::new()
    }
}

impl Default for Scheduler<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Scheduler<C> {
    pub fn budget(&self) -> Budget {
        self.budget
    }

    pub fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }

    /// Set the budget in milliseconds; zero and negative values are rejected.
    pub fn set_latency_millis(&mut self, millis: i64) -> Result<()> {
        self.budget = Budget::from_millis(millis)?;
        Ok(())
    }

    /// Continuations waiting on the run-queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Start a materialization, running its first slice now.
    pub fn submit<H>(&mut self, materializer: Materializer<H>) -> Pending<H::Value>
    where
        H: Host + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let id = self.next_id;
        self.next_id += 1;

        let mut task: Box<dyn Task> = Box::new(Continuation {
            id,
            materializer,
            sender: Some(tx),
        });
        if run_slice(&self.clock, self.budget, self.nodes_per_slice, task.as_mut()) {
            debug!(continuation = id, "parked after first slice");
            self.queue.push_back(task);
            self.event_loop.request_tick();
            self.event_loop.set_keep_alive(true);
        } else {
            trace!(continuation = id, "finished within first slice");
        }
        Pending { rx }
    }

    /// Continue queued work for one host tick.
    ///
    /// At least one continuation runs when the queue is non-empty, even if
    /// the allowance is already used up.
    #[tracing::instrument(level = "debug", skip(self), fields(queued = self.queue.len()))]
    pub fn drain(&mut self) -> Drain {
        let mut allowance = TimeSlice::start(&self.clock, self.budget);
        let round = self.queue.len();
        let mut ran = 0;
        let mut completed = 0;

        while ran < round {
            let Some(mut task) = self.queue.pop_front() else {
                break;
            };
            ran += 1;
            if run_slice(&self.clock, self.budget, self.nodes_per_slice, task.as_mut()) {
                trace!(continuation = task.id(), "requeued");
                self.queue.push_back(task);
            } else {
                completed += 1;
            }
            if allowance.expired() {
                break;
            }
        }

        self.flush_accounting();

        let remaining = self.queue.len();
        if remaining > 0 {
            self.event_loop.request_tick();
            self.event_loop.set_keep_alive(true);
        } else {
            self.event_loop.set_keep_alive(false);
        }
        debug!(ran, completed, remaining, "drained");

        Drain {
            ran,
            completed,
            remaining,
        }
    }

    fn flush_accounting(&mut self) {
        let (Some(accounting), Some(hook)) = (&self.accounting, &mut self.hook) else {
            return;
        };
        let delta = accounting.take();
        if delta != 0 {
            trace!(delta, "report external memory");
            hook.report_delta(delta);
        }
    }
}

impl<C: Clock> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("budget", &self.budget)
            .field("nodes_per_slice", &self.nodes_per_slice)
            .field("pending", &self.queue.len())
            .finish()
    }
}

fn run_slice<C: Clock>(
    clock: &C,
    budget: Budget,
    nodes_per_slice: Option<NonZeroUsize>,
    task: &mut dyn Task,
) -> bool {
    task.run(&mut Window::open(clock, budget, nodes_per_slice))
}
