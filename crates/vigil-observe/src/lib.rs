//! Observation layer for Vigil schemas.
//!
//! [`observe`] wraps object and array values in [`Observed`] nodes. Every
//! write, delete and sequence operation on a node is validated against the
//! compiled schema; violations are appended to the tree's error sink and
//! announced to its [`Subscriber`]. [`Observed::merge`] reconciles a tree
//! with plain data while keeping node identity.

mod error;
mod item;
mod merge;
mod observed;
mod scope;
mod sequence;
mod subscriber;

pub use error::Error;
pub use item::{Item, Outcome};
pub use merge::merge;
pub use observed::{Observed, observe};
pub use subscriber::{Emitter, Event, HandlerId, Silent, Subscriber};
