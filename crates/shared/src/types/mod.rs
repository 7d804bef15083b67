//! Common types used across the engine.

pub mod actor;
pub mod id;

pub use actor::{Actor, Role};
pub use id::*;
