//! Input loading and output shared by all commands.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use jsonslice_lib::engine::{Budget, SchedulerBuilder};
use jsonslice_lib::{Colors, Json, Value};

/// A document and the node of it a command works on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub file: PathBuf,
    pub pointer: String,
}

impl Target {
    pub fn new(file: PathBuf, pointer: String) -> Self {
        Self { file, pointer }
    }
}

/// Slice configuration from `--latency` and `--nodes-per-slice`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub latency: i64,
    pub nodes_per_slice: Option<NonZeroUsize>,
}

impl Schedule {
    pub fn budget(&self) -> Result<Budget, InputError> {
        Ok(Budget::from_millis(self.latency)?)
    }

    pub fn builder(&self) -> Result<SchedulerBuilder, InputError> {
        let builder = SchedulerBuilder::new().budget(self.budget()?);
        Ok(match self.nodes_per_slice {
            Some(nodes) => builder.nodes_per_slice(nodes),
            None => builder,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Json(#[from] jsonslice_lib::Error),
}

/// Read a file, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<Vec<u8>, InputError> {
    let read_error = |source| InputError::Read {
        path: path.to_owned(),
        source,
    };
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).map_err(read_error)?;
        return Ok(buf);
    }
    fs::read(path).map_err(read_error)
}

/// Parse the target document and resolve its pointer.
pub fn open(target: &Target) -> Result<Json, InputError> {
    let text = read_input(&target.file)?;
    let root = Json::parse(text)?;
    Ok(root.path(&target.pointer)?)
}

pub fn print_value(value: &Value, pretty: bool, color: bool) {
    println!("{}", value.format(pretty, Colors::new(color)));
}

/// Report `error` and exit with status 1.
pub fn fail(error: impl fmt::Display) -> ! {
    eprintln!("error: {}", error);
    std::process::exit(1)
}
