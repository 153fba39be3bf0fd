#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod cli;
mod commands;

use cli::{
    ExpandParams, GetParams, MaterializeParams, PathParams, TraceParams, build_cli,
};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `JSONSLICE_LOG=debug`.
const LOG_ENV: &str = "JSONSLICE_LOG";

fn main() {
    init_logging();
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("get", m)) => {
            let params = GetParams::from_matches(m);
            commands::get::run(params.into());
        }
        Some(("expand", m)) => {
            let params = ExpandParams::from_matches(m);
            commands::expand::run(params.into());
        }
        Some(("materialize", m)) => {
            let params = MaterializeParams::from_matches(m);
            commands::materialize::run(params.into());
        }
        Some(("trace", m)) => {
            let params = TraceParams::from_matches(m);
            commands::trace::run(params.into());
        }
        Some(("path", m)) => {
            let params = PathParams::from_matches(m);
            commands::path::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
