//! Command-line arguments.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::agent::AgentConfig;
use crate::error::{Error, Result};
use crate::mib::MibConfig;
use crate::status::Threshold;

/// SNMP agent for the fan controller.
///
/// Reads status snapshots as JSON lines on stdin and, with `--snmp`, serves
/// them over SNMPv2c (community `public`).
#[derive(Debug, Parser)]
#[command(name = "fan-snmp-agent", version, about)]
pub struct Args {
    /// Start the SNMP agent.
    #[arg(long)]
    pub snmp: bool,

    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:161", value_name = "ADDR")]
    pub bind: String,

    /// City reported as sysName.
    #[arg(long, default_value = "Unknown")]
    pub city: String,

    /// Threshold the fan curve is based on, until the feed says otherwise.
    #[arg(long, default_value = "warning", value_name = "warning|critical")]
    pub usetemp: Threshold,

    /// Kernel receive buffer size for the agent socket.
    #[arg(long, value_name = "BYTES")]
    pub recv_buffer_size: Option<usize>,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Socket settings from the arguments.
    pub fn agent_config(&self) -> Result<AgentConfig> {
        let bind_addr = self.bind.parse().map_err(|_| {
            Error::io(
                None,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid bind address: {}", self.bind),
                ),
            )
        })?;

        Ok(AgentConfig {
            bind_addr,
            recv_buffer_size: self.recv_buffer_size,
            ..AgentConfig::default()
        })
    }

    /// Object registration settings from the arguments.
    pub fn mib_config(&self) -> MibConfig {
        MibConfig {
            city: self.city.clone(),
            ..MibConfig::default()
        }
    }

    /// Install a stderr tracing subscriber.
    ///
    /// `RUST_LOG` wins when set; otherwise `-v` selects debug, else info.
    pub fn init_tracing(&self) {
        let default = if self.verbose {
            "fan_snmp_agent=debug"
        } else {
            "fan_snmp_agent=info"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
