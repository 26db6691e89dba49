//! fan-snmp-agent - serve fan controller status over SNMPv2c.

use std::process::ExitCode;

use clap::Parser;
use tokio::io::BufReader;

use fan_snmp_agent::cli::args::Args;
use fan_snmp_agent::cli::status_feed::run_status_feed;
use fan_snmp_agent::status::{self, StatusSnapshot};
use fan_snmp_agent::{Agent, ManagedObjectTree, mib};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.init_tracing();

    let initial = StatusSnapshot {
        usetemp: args.usetemp,
        ..StatusSnapshot::default()
    };
    let (publisher, reader) = status::channel(initial);
    let stdin = BufReader::new(tokio::io::stdin());

    if !args.snmp {
        return match run_status_feed(stdin, &publisher).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "failed to read status feed");
                ExitCode::FAILURE
            }
        };
    }

    let config = match args.agent_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut tree = ManagedObjectTree::new();
    mib::register_fan_objects(&mut tree, &reader, &args.mib_config());

    let agent = match Agent::builder().config(config).tree(tree).build().await {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // The agent keeps serving the last snapshot after the feed closes.
    tokio::spawn(async move {
        if let Err(e) = run_status_feed(stdin, &publisher).await {
            tracing::error!(error = %e, "failed to read status feed");
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    match agent.run_until(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
