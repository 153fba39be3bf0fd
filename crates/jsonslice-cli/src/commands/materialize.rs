//! Build a whole subtree, blocking or through the scheduler.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use jsonslice_lib::engine::{EventLoop, MemoryAccounting};
use jsonslice_lib::{Json, Value};
use tracing::debug;

use super::run_common::{self, InputError, Schedule, Target};

pub struct MaterializeArgs {
    pub target: Target,
    pub is_async: bool,
    pub schedule: Schedule,
    pub pretty: bool,
    pub color: bool,
}

pub fn run(args: MaterializeArgs) {
    let value = if args.is_async {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap_or_else(|e| run_common::fail(e));
        let (value, ticks) = runtime
            .block_on(materialize_async(&args.target, args.schedule))
            .unwrap_or_else(|e| run_common::fail(e));
        eprintln!("materialized in {ticks} ticks");
        value
    } else {
        run_common::open(&args.target)
            .and_then(|json| Ok(json.to_object()?))
            .unwrap_or_else(|e| run_common::fail(e))
    };
    run_common::print_value(&value, args.pretty, args.color);
}

/// Parse off-thread, then drain the scheduler once per host tick until no
/// further tick is requested. Returns the value and the ticks it took.
pub async fn materialize_async(
    target: &Target,
    schedule: Schedule,
) -> Result<(Value, usize), InputError> {
    let text = run_common::read_input(&target.file)?;
    let accounting = Arc::new(MemoryAccounting::new());
    let host = HostLoop::default();
    let mut scheduler = schedule
        .builder()?
        .event_loop(host.clone())
        .accounting(Arc::clone(&accounting), |delta: i64| {
            debug!(delta, "retained memory changed")
        })
        .build();

    let root = Json::parse_async(text, Some(accounting)).await?;
    let json = root.path(&target.pointer)?;
    let pending = json.to_object_async(&mut scheduler);

    let mut ticks = 0;
    while host.take_tick() {
        tokio::task::yield_now().await;
        scheduler.drain();
        ticks += 1;
    }
    debug_assert!(!host.keep_alive(), "idle scheduler keeps the loop alive");

    Ok((pending.await?, ticks))
}

/// Single-threaded stand-in for a host event loop.
#[derive(Clone, Default)]
struct HostLoop(Rc<HostState>);

#[derive(Default)]
struct HostState {
    tick: Cell<bool>,
    keep_alive: Cell<bool>,
}

impl HostLoop {
    fn take_tick(&self) -> bool {
        self.0.tick.replace(false)
    }

    fn keep_alive(&self) -> bool {
        self.0.keep_alive.get()
    }
}

impl EventLoop for HostLoop {
    fn request_tick(&mut self) {
        self.0.tick.set(true);
    }

    fn set_keep_alive(&mut self, alive: bool) {
        self.0.keep_alive.set(alive);
    }
}
