//! Show one level of a node with scalar children inline.

use super::run_common::{self, Target};

pub struct ExpandArgs {
    pub target: Target,
    pub pretty: bool,
    pub color: bool,
}

pub fn run(args: ExpandArgs) {
    let json = run_common::open(&args.target).unwrap_or_else(|e| run_common::fail(e));
    let value = json.expand().unwrap_or_else(|e| run_common::fail(e));
    run_common::print_value(&value, args.pretty, args.color);
}
