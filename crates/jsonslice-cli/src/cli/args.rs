//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` that can be composed into commands,
//! visible or hidden (via `.hide(true)`).

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// JSON document to read, `-` for stdin (positional).
pub fn file_arg() -> Arg {
    Arg::new("file")
        .value_name("FILE")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON file to read (`-` for stdin)")
}

/// JSON Pointer into the document (positional, optional).
pub fn pointer_arg() -> Arg {
    Arg::new("pointer")
        .value_name("PATH")
        .default_value("")
        .hide_default_value(true)
        .help("JSON Pointer of the node (default: the root)")
}

/// JSON Pointer into the document (positional, required).
pub fn required_pointer_arg() -> Arg {
    pointer_arg().required(true)
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Output compact JSON (--compact).
pub fn compact_arg() -> Arg {
    Arg::new("compact")
        .long("compact")
        .action(ArgAction::SetTrue)
        .help("Output compact JSON (default: pretty when stdout is a TTY)")
}

/// Slice budget in milliseconds (--latency).
pub fn latency_arg() -> Arg {
    Arg::new("latency")
        .long("latency")
        .value_name("MS")
        .default_value("5")
        .allow_negative_numbers(true)
        .value_parser(value_parser!(i64))
        .help("Time budget of one slice, in milliseconds")
}

/// Node cap per slice (--nodes-per-slice).
pub fn nodes_per_slice_arg() -> Arg {
    Arg::new("nodes_per_slice")
        .long("nodes-per-slice")
        .value_name("N")
        .value_parser(value_parser!(NonZeroUsize))
        .help("Also end a slice after N nodes")
}

/// Run through the scheduler (--async).
pub fn async_arg() -> Arg {
    Arg::new("async")
        .long("async")
        .action(ArgAction::SetTrue)
        .help("Parse on a worker thread and materialize in time slices")
}

/// Verbosity level (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Verbosity level (-v for every node, -vv for scalar values too)")
}

/// Skip printing the built value (--no-result).
pub fn no_result_arg() -> Arg {
    Arg::new("no_result")
        .long("no-result")
        .action(ArgAction::SetTrue)
        .help("Show the trace only")
}
