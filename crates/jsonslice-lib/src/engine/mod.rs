//! Materialization engine.
//!
//! Generic over the output value through [`Host`]: the engine decides what
//! to build and when, the host decides how values look.

mod accounting;
mod cache;
mod frame;
mod host;
mod invariants;
mod materializer;
mod scheduler;
mod shallow;
mod slice;
mod trace;

#[cfg(test)]
mod materializer_tests;
#[cfg(test)]
mod scheduler_tests;

pub use accounting::{AccountingHook, MemoryAccounting, Retention};
pub use cache::{IdentityCache, OperationKind};
pub use host::{HandleHost, Host, Identity, Slot};
pub use materializer::{Materializer, Outcome, SharedCache, State};
pub use scheduler::{Drain, EventLoop, NoopEventLoop, Pending, Scheduler, SchedulerBuilder};
pub use shallow::{expand, get};
pub use slice::{Budget, Clock, Slice, StepSlice, SystemClock, TimeSlice, Unbounded, Window};
pub use trace::{LogTracer, NoopTracer, PrintTracer, Tracer, Verbosity};
