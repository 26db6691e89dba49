//! # fan-snmp-agent
//!
//! Minimal SNMPv2c agent that publishes fan controller status.
//!
//! ## Features
//!
//! - Hand-rolled BER codec for the SNMP subset in use
//! - GetRequest and GetNextRequest with numeric OID ordering
//! - Lock-free status snapshots shared with value providers
//! - Async UDP agent built on Tokio
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fan_snmp_agent::{Agent, ManagedObjectTree, mib, status};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fan_snmp_agent::Error> {
//!     let (publisher, reader) = status::channel(Default::default());
//!
//!     let mut tree = ManagedObjectTree::new();
//!     mib::register_fan_objects(&mut tree, &reader, &mib::MibConfig::default());
//!
//!     let agent = Agent::builder().bind("0.0.0.0:161").tree(tree).build().await?;
//!
//!     // The control loop keeps calling publisher.publish(...)
//!     # drop(publisher);
//!     agent.run().await
//! }
//! ```
//!
//! ## Wire behaviour
//!
//! - Only the community `public` is answered; anything else is dropped silently.
//! - Malformed datagrams are logged and dropped.
//! - Unknown OIDs answer NULL under the requested name.
//! - GET-NEXT past the last object answers NULL under the requested name.

pub mod agent;
pub mod ber;
pub mod error;
pub mod handler;
pub mod message;
pub mod mib;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod status;

#[cfg(feature = "cli")]
pub mod cli;

pub use agent::{Agent, AgentBuilder, AgentConfig, Responder};
pub use error::{DecodeErrorKind, EncodeErrorKind, Error, Field, OidErrorKind, Result};
pub use handler::{ManagedObjectTree, OidTable, ValueProvider};
pub use message::{Request, encode_response};
pub use oid::Oid;
pub use pdu::PduType;
pub use status::{StatusPublisher, StatusReader, StatusSnapshot};
