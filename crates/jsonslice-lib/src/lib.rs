#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! jsonslice: lazy, identity-preserving access to large JSON documents.
//!
//! A document is parsed once into an immutable tape. [`Json`] handles
//! reference nodes of it without building anything; values are built on
//! demand, one level at a time (`get`, `expand`) or for a whole subtree
//! (`to_object`). Whole-subtree builds can run in time slices on a
//! [`Scheduler`](engine::Scheduler) so a host loop is never blocked for
//! longer than its budget.
//!
//! # Example
//!
//! ```
//! use jsonslice_lib::Json;
//!
//! let json = Json::parse(r#"{"a":[1,2,{"b":null}],"c":"x"}"#).unwrap();
//! let a = json.path("/a").unwrap();
//! assert!(a.get().unwrap().ptr_eq(&a.get().unwrap()));
//!
//! let value = json.to_object().unwrap();
//! assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":[1,2,{"b":null}],"c":"x"}"#);
//! ```

pub mod engine;
mod error;
mod json;
mod value;

#[cfg(test)]
mod test_utils;

pub use error::{Error, Result};
pub use json::{Json, PinnedHost, WeakJson};
pub use value::{Array, DomHost, Object, Value, WeakValue};

pub use jsonslice_core::{Colors, Document, Kind, NodeId};
