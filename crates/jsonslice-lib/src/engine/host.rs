//! Value construction capability injected by the host.
//!
//! The engine never names a concrete output type. A [`Host`] builds scalars
//! and containers and attaches children; [`Identity`] tells the identity
//! cache how to hold a value without keeping it alive.

use jsonslice_core::{NodeId, Scalar};

/// Position of a child inside its parent container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot<'k> {
    Index(usize),
    Key(&'k str),
}

/// Values that can be referenced weakly.
pub trait Identity: Clone {
    type Weak;

    /// `None` for values without identity (scalars). Those are never cached.
    fn downgrade(&self) -> Option<Self::Weak>;

    fn upgrade(weak: &Self::Weak) -> Option<Self>;
}

/// Output value construction primitives.
pub trait Host {
    type Value: Identity;

    fn scalar(&mut self, scalar: Scalar<'_>) -> Self::Value;

    /// An empty array sized for `len` elements, filled in place by `attach`.
    fn array(&mut self, len: usize) -> Self::Value;

    /// An empty object sized for `len` members, filled in place by `attach`.
    fn object(&mut self, len: usize) -> Self::Value;

    /// Store `child` at `slot` of a container produced by `array`/`object`,
    /// replacing a child already stored there.
    fn attach(&mut self, parent: &Self::Value, slot: Slot<'_>, child: Self::Value);
}

/// Hosts that can wrap a node in a lazy handle instead of building it.
pub trait HandleHost: Host {
    fn handle(&mut self, node: NodeId) -> Self::Value;
}
