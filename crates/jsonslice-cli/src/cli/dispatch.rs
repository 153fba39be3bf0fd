//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! `*Params` mirror the command `*Args` but are populated from clap; hidden
//! flags are parsed and ignored. The `From` impls resolve TTY-dependent
//! defaults (colors, pretty output) once, at the boundary.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::ArgMatches;
use jsonslice_lib::engine::Verbosity;

use super::ColorChoice;
use crate::commands::expand::ExpandArgs;
use crate::commands::get::GetArgs;
use crate::commands::materialize::MaterializeArgs;
use crate::commands::path::PathArgs;
use crate::commands::run_common::{Schedule, Target};
use crate::commands::trace::TraceArgs;

pub struct GetParams {
    pub file: PathBuf,
    pub pointer: String,
    pub compact: bool,
    pub color: ColorChoice,
    // Note: latency, nodes_per_slice are parsed but not extracted
}

impl GetParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            file: parse_file(m),
            pointer: parse_pointer(m),
            compact: m.get_flag("compact"),
            color: parse_color(m),
        }
    }
}

impl From<GetParams> for GetArgs {
    fn from(p: GetParams) -> Self {
        Self {
            target: Target::new(p.file, p.pointer),
            pretty: pretty(p.compact),
            color: p.color.should_colorize(),
        }
    }
}

pub struct ExpandParams {
    pub file: PathBuf,
    pub pointer: String,
    pub compact: bool,
    pub color: ColorChoice,
}

impl ExpandParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            file: parse_file(m),
            pointer: parse_pointer(m),
            compact: m.get_flag("compact"),
            color: parse_color(m),
        }
    }
}

impl From<ExpandParams> for ExpandArgs {
    fn from(p: ExpandParams) -> Self {
        Self {
            target: Target::new(p.file, p.pointer),
            pretty: pretty(p.compact),
            color: p.color.should_colorize(),
        }
    }
}

pub struct MaterializeParams {
    pub file: PathBuf,
    pub pointer: String,
    pub is_async: bool,
    pub latency: i64,
    pub nodes_per_slice: Option<NonZeroUsize>,
    pub compact: bool,
    pub color: ColorChoice,
}

impl MaterializeParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            // Input
            file: parse_file(m),
            pointer: parse_pointer(m),

            // Scheduling
            is_async: m.get_flag("async"),
            latency: parse_latency(m),
            nodes_per_slice: m.get_one::<NonZeroUsize>("nodes_per_slice").copied(),

            // Output
            compact: m.get_flag("compact"),
            color: parse_color(m),
        }
    }
}

impl From<MaterializeParams> for MaterializeArgs {
    fn from(p: MaterializeParams) -> Self {
        Self {
            target: Target::new(p.file, p.pointer),
            is_async: p.is_async,
            schedule: Schedule {
                latency: p.latency,
                nodes_per_slice: p.nodes_per_slice,
            },
            pretty: pretty(p.compact),
            color: p.color.should_colorize(),
        }
    }
}

pub struct TraceParams {
    pub file: PathBuf,
    pub pointer: String,
    pub verbose: u8,
    pub no_result: bool,
    pub latency: i64,
    pub nodes_per_slice: Option<NonZeroUsize>,
    pub color: ColorChoice,
    // Note: compact is parsed but not extracted; traces always end pretty
}

impl TraceParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            file: parse_file(m),
            pointer: parse_pointer(m),
            verbose: m.get_count("verbose"),
            no_result: m.get_flag("no_result"),
            latency: parse_latency(m),
            nodes_per_slice: m.get_one::<NonZeroUsize>("nodes_per_slice").copied(),
            color: parse_color(m),
        }
    }
}

impl From<TraceParams> for TraceArgs {
    fn from(p: TraceParams) -> Self {
        let verbosity = match p.verbose {
            0 => Verbosity::Default,
            1 => Verbosity::Verbose,
            _ => Verbosity::VeryVerbose,
        };

        Self {
            target: Target::new(p.file, p.pointer),
            verbosity,
            no_result: p.no_result,
            schedule: Schedule {
                latency: p.latency,
                nodes_per_slice: p.nodes_per_slice,
            },
            color: p.color.should_colorize(),
        }
    }
}

pub struct PathParams {
    pub file: PathBuf,
    pub pointer: String,
    pub color: ColorChoice,
}

impl PathParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            file: parse_file(m),
            pointer: parse_pointer(m),
            color: parse_color(m),
        }
    }
}

impl From<PathParams> for PathArgs {
    fn from(p: PathParams) -> Self {
        Self {
            target: Target::new(p.file, p.pointer),
            color: p.color.should_colorize(),
        }
    }
}

fn parse_file(m: &ArgMatches) -> PathBuf {
    m.get_one::<PathBuf>("file")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("-"))
}

fn parse_pointer(m: &ArgMatches) -> String {
    m.get_one::<String>("pointer").cloned().unwrap_or_default()
}

fn parse_latency(m: &ArgMatches) -> i64 {
    m.get_one::<i64>("latency").copied().unwrap_or(5)
}

/// Parse --color flag into ColorChoice.
fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Pretty by default when stdout is a TTY, unless --compact is passed.
fn pretty(compact: bool) -> bool {
    !compact && std::io::IsTerminal::is_terminal(&std::io::stdout())
}
