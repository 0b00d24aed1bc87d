//! dnsthing daemon entry point.

use std::path::PathBuf;
use std::process::Command;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dnsthing::{DockerSource, HostsFile, Reconciler, UpdateHook};

/// Publish Docker container addresses as hostnames in a managed
/// hosts-file section.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Log progress (info level).
    #[arg(short, long)]
    verbose: bool,

    /// Log everything (debug level).
    #[arg(long)]
    debug: bool,

    /// DNS domain suffix appended to every entry.
    #[arg(short, long, default_value = "docker")]
    domain: String,

    /// Hosts file to manage. Must already exist.
    #[arg(short = 'H', long, default_value = "./hosts")]
    hostsfile: PathBuf,

    /// Shell command to run after each rewrite (e.g. a dnsmasq reload).
    #[arg(short = 'c', long)]
    update_command: Option<String>,
}

impl Args {
    fn log_filter(&self) -> &'static str {
        if self.debug {
            "dnsthing=debug"
        } else if self.verbose {
            "dnsthing=info"
        } else {
            "warn"
        }
    }
}

/// Wraps an `--update-command` string into a fire-and-forget hook.
///
/// The command runs through `sh -c`; its exit status and output are not
/// consulted.
fn update_command_hook(command: String) -> UpdateHook {
    Box::new(move || {
        tracing::info!(command = %command, "running update command");
        match Command::new("sh").arg("-c").arg(&command).status() {
            Ok(status) => tracing::debug!(status = %status, "update command finished"),
            Err(e) => tracing::warn!(error = %e, "failed to run update command"),
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .init();

    let source = DockerSource::connect().context("configuring Docker connection")?;
    source.ping().await.context("Docker daemon unreachable")?;

    let hosts = HostsFile::new(&args.hostsfile, &args.domain);
    let mut reconciler = Reconciler::new(source, hosts);
    if let Some(command) = args.update_command {
        reconciler = reconciler.with_update_hook(update_command_hook(command));
    }

    tokio::select! {
        result = reconciler.run() => {
            result.context("watching Docker events")?;
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, exiting");
            Ok(())
        }
    }
}
