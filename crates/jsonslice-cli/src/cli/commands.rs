//! Command builders for the CLI.
//!
//! Every command accepts the scheduling flags so they can be kept on a
//! command line while switching commands; commands that do not schedule
//! hide them from `--help`.

use clap::Command;

use super::args::*;

/// Add hidden scheduling args (for commands that build one level at most).
fn with_hidden_schedule_args(cmd: Command) -> Command {
    cmd.arg(latency_arg().hide(true))
        .arg(nodes_per_slice_arg().hide(true))
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("jsonslice")
        .about("Lazy, identity-preserving access to large JSON documents")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(get_command())
        .subcommand(expand_command())
        .subcommand(materialize_command())
        .subcommand(trace_command())
        .subcommand(path_command())
}

/// One level of a node, every child as a handle.
pub fn get_command() -> Command {
    let cmd = Command::new("get")
        .about("Show one level of a node, children as handles")
        .after_help(
            r#"EXAMPLES:
  jsonslice get data.json               # root, children as <kind #id>
  jsonslice get data.json /features/0   # a nested node
  cat data.json | jsonslice get - /a    # from stdin"#,
        )
        .arg(file_arg())
        .arg(pointer_arg())
        .arg(compact_arg())
        .arg(color_arg());

    with_hidden_schedule_args(cmd)
}

/// One level of a node, scalar children built in place.
pub fn expand_command() -> Command {
    let cmd = Command::new("expand")
        .about("Show one level of a node, scalar children inline")
        .after_help(
            r#"EXAMPLES:
  jsonslice expand data.json            # root
  jsonslice expand data.json /a/2       # a nested node"#,
        )
        .arg(file_arg())
        .arg(pointer_arg())
        .arg(compact_arg())
        .arg(color_arg());

    with_hidden_schedule_args(cmd)
}

/// Build a whole subtree.
pub fn materialize_command() -> Command {
    Command::new("materialize")
        .about("Build a whole subtree and print it as JSON")
        .after_help(
            r#"EXAMPLES:
  jsonslice materialize data.json                      # blocking
  jsonslice materialize data.json --async              # time-sliced
  jsonslice materialize data.json --async --latency 1  # shorter slices"#,
        )
        .arg(file_arg())
        .arg(pointer_arg())
        .arg(async_arg())
        .arg(latency_arg())
        .arg(nodes_per_slice_arg())
        .arg(compact_arg())
        .arg(color_arg())
}

/// Trace a time-sliced build.
pub fn trace_command() -> Command {
    Command::new("trace")
        .about("Trace a time-sliced build node by node")
        .after_help(
            r#"EXAMPLES:
  jsonslice trace data.json --nodes-per-slice 3 -v   # every node
  jsonslice trace data.json /a -vv --no-result       # with values, no JSON"#,
        )
        .arg(file_arg())
        .arg(pointer_arg())
        .arg(verbose_arg())
        .arg(no_result_arg())
        .arg(latency_arg())
        .arg(nodes_per_slice_arg())
        .arg(compact_arg().hide(true))
        .arg(color_arg())
}

/// Resolve a JSON Pointer.
pub fn path_command() -> Command {
    let cmd = Command::new("path")
        .about("Resolve a JSON Pointer and show the node it names")
        .after_help(
            r#"EXAMPLES:
  jsonslice path data.json /a/2/b
  jsonslice path data.json '/d~1e/~0'   # escaped `/` and `~`"#,
        )
        .arg(file_arg())
        .arg(required_pointer_arg())
        .arg(compact_arg().hide(true))
        .arg(color_arg());

    with_hidden_schedule_args(cmd)
}
