//! Show one level of a node with every child as a handle.

use super::run_common::{self, Target};

pub struct GetArgs {
    pub target: Target,
    pub pretty: bool,
    pub color: bool,
}

pub fn run(args: GetArgs) {
    let json = run_common::open(&args.target).unwrap_or_else(|e| run_common::fail(e));
    let value = json.get().unwrap_or_else(|e| run_common::fail(e));
    run_common::print_value(&value, args.pretty, args.color);
}
