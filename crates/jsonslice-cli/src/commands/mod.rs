pub mod expand;
pub mod get;
pub mod materialize;
pub mod path;
pub mod run_common;
pub mod trace;
