//! CLI support for the `fan-snmp-agent` executable.
//!
//! Argument parsing, tracing setup, and the JSON-lines status feed.
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod status_feed;
