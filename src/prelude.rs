//! Prelude module for convenient imports.
//!
//! ```rust
//! use fan_snmp_agent::prelude::*;
//! ```
//!
//! This imports the agent, object tree, status handles, error types, and
//! the [`oid!`] macro.

pub use crate::agent::Agent;
pub use crate::error::{Error, Result};
pub use crate::handler::{ManagedObjectTree, ValueProvider};
pub use crate::oid::Oid;
pub use crate::status::{StatusPublisher, StatusReader, StatusSnapshot};

#[doc(no_inline)]
pub use crate::oid;
