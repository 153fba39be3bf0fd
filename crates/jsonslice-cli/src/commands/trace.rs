//! Trace a time-sliced build for debugging.

use std::sync::Arc;

use jsonslice_lib::engine::{
    Materializer, Outcome, PrintTracer, SystemClock, Verbosity, Window,
};
use jsonslice_lib::{Colors, DomHost};

use super::run_common::{self, Schedule, Target};

pub struct TraceArgs {
    pub target: Target,
    pub verbosity: Verbosity,
    pub no_result: bool,
    pub schedule: Schedule,
    pub color: bool,
}

pub fn run(args: TraceArgs) {
    let json = run_common::open(&args.target).unwrap_or_else(|e| run_common::fail(e));
    let budget = args
        .schedule
        .budget()
        .unwrap_or_else(|e| run_common::fail(e));

    let colors = Colors::new(args.color);
    let mut tracer = PrintTracer::new(args.verbosity, colors);
    let mut materializer =
        Materializer::uncached(Arc::clone(json.document()), json.node_id(), DomHost);

    let clock = SystemClock;
    let outcome = loop {
        let mut window = Window::open(&clock, budget, args.schedule.nodes_per_slice);
        match materializer.resume(&mut window, &mut tracer) {
            Outcome::Suspended => continue,
            outcome => break outcome,
        }
    };
    tracer.print();

    let value = match outcome {
        Outcome::Done(value) => value,
        Outcome::Failed(e) => {
            eprintln!("materialization error: {}", e);
            std::process::exit(2);
        }
        Outcome::Suspended => unreachable!("the loop only exits on completion"),
    };

    if args.no_result {
        return;
    }

    println!("{}---{}", colors.literal, colors.reset);
    println!("{}", value.format(true, colors));
}
