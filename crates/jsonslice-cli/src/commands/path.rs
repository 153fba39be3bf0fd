//! Resolve a JSON Pointer and describe the node.

use jsonslice_lib::{Colors, Json, Kind};

use super::run_common::{self, InputError, Target};

pub struct PathArgs {
    pub target: Target,
    pub color: bool,
}

pub fn run(args: PathArgs) {
    let json = run_common::open(&args.target).unwrap_or_else(|e| run_common::fail(e));
    let line = describe(&json, Colors::new(args.color)).unwrap_or_else(|e| run_common::fail(e));
    println!("{line}");
}

/// `kind #id` followed by the child count of a container or the value of
/// a scalar.
pub fn describe(json: &Json, colors: Colors) -> Result<String, InputError> {
    let kind = json.kind().map_err(jsonslice_lib::Error::from)?;
    let head = format!("{kind} {}{}{}", colors.literal, json.node_id(), colors.reset);
    let tail = match kind {
        Kind::Array | Kind::Object => {
            let size = json
                .document()
                .node(json.node_id())
                .size()
                .map_err(jsonslice_lib::Error::from)?;
            let noun = match (kind, size) {
                (Kind::Array, 1) => "item",
                (Kind::Array, _) => "items",
                (_, 1) => "member",
                _ => "members",
            };
            format!("({size} {noun})")
        }
        _ => json.get()?.format(false, colors),
    };
    Ok(format!("{head} {tail}"))
}
