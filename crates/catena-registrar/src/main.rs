//! Catena Registrar
//!
//! `register` advertises this node's enode in etcd and keeps it alive while
//! the local geth IPC socket answers. `list` prints the enodes currently
//! registered for a cluster, comma-separated.

use anyhow::Context;
use catena_registrar::config::{
    parse_endpoints, ListConfig, RegistrarConfig, StoreConfig, MAX_CHECK_INTERVAL_SECS,
    MAX_LEASE_TTL_SECS,
};
use catena_registrar::observability::{init_tracing, LogFormat, TracingConfig};
use catena_registrar::registration::RenewalExit;
use catena_registrar::{runner, version};
use clap::{Args, Parser, Subcommand};
use std::future::Future;
use std::io::Write;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "catena-registrar")]
#[command(about = "Lease-backed enode registration and discovery for catena chains")]
#[command(version = version::VERSION)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Comma-separated list of etcd nodes
    #[arg(long = "etcd-cluster", env = "ETCD_ENDPOINTS", default_value = "http://127.0.0.1:2379")]
    etcd_cluster: String,

    /// Chain name for identification
    #[arg(long, env = "CLUSTER_NAME", default_value = "catena")]
    name: String,

    /// Deadline for each etcd request, in seconds
    #[arg(long, env = "ETCD_REQUEST_TIMEOUT", default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout: u64,
}

impl StoreArgs {
    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            etcd_endpoints: parse_endpoints(&self.etcd_cluster),
            request_timeout: Duration::from_secs(self.request_timeout),
        }
    }
}

#[derive(Args)]
struct RegisterArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Node IP address
    #[arg(long, env = "NODE_IP", default_value = "127.0.0.1")]
    ip: IpAddr,

    /// Node port
    #[arg(long, env = "NODE_PORT", default_value_t = 30303)]
    port: u16,

    /// Location of nodekey
    #[arg(long, env = "NODEKEY_PATH", default_value = "/root/.ethereum/geth/nodekey")]
    nodekey: PathBuf,

    /// Geth IPC location
    #[arg(long, env = "GETH_IPC", default_value = "/root/.ethereum/geth.ipc")]
    ipc: PathBuf,

    /// TTL for entry in seconds
    #[arg(long, env = "LEASE_TTL", default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..=MAX_LEASE_TTL_SECS))]
    ttl: u64,

    /// Check interval in seconds
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=MAX_CHECK_INTERVAL_SECS))]
    interval: u64,

    /// Node name inside the cluster (default: hostname)
    #[arg(long, env = "NODE_NAME")]
    node_name: Option<String>,

    /// Revoke the lease on SIGINT/SIGTERM instead of letting it expire
    #[arg(long, env = "REVOKE_ON_SHUTDOWN")]
    revoke_on_shutdown: bool,
}

impl RegisterArgs {
    fn into_config(self) -> RegistrarConfig {
        RegistrarConfig {
            store: self.store.store_config(),
            cluster_name: self.store.name,
            node_name: self.node_name,
            ip: self.ip,
            port: self.port,
            nodekey_path: self.nodekey,
            ipc_path: self.ipc,
            lease_ttl: Duration::from_secs(self.ttl),
            check_interval: Duration::from_secs(self.interval),
            revoke_on_shutdown: self.revoke_on_shutdown,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Register this node and keep the registration alive while geth is up
    Register(RegisterArgs),
    /// Print the enodes registered for a cluster, comma-separated
    List(StoreArgs),
    /// Print build information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingConfig {
        log_format: cli.log_format,
    });

    match cli.command {
        Commands::Register(args) => register(args.into_config()).await,
        Commands::List(args) => list(args).await,
        Commands::Version => {
            println!("{}", version::build_info());
            Ok(())
        }
    }
}

async fn register(config: RegistrarConfig) -> anyhow::Result<()> {
    info!(version = %version::full_version(), "Starting catena-registrar");

    let shutdown = CancellationToken::new();
    tokio::spawn(forward_signals(shutdown.clone()));

    match runner::run_register(&config, shutdown).await? {
        RenewalExit::Unhealthy { tick, reason } => {
            warn!(tick = tick, reason = %reason, "Node unhealthy, registration left to expire");
        }
        RenewalExit::Shutdown { ticks } => {
            info!(ticks = ticks, "Shut down");
        }
    }
    Ok(())
}

async fn list(args: StoreArgs) -> anyhow::Result<()> {
    let config = ListConfig {
        store: args.store_config(),
        cluster_name: args.name,
    };
    let rendered = runner::run_list(&config).await?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|_| stdout.flush())
        .context("failed to write peer list")?;
    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn forward_signals(shutdown: CancellationToken) {
    let ctrl_c = signal_or_pending("SIGINT", tokio::signal::ctrl_c());
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}

/// Resolve when `signal` is delivered. A handler that cannot be installed
/// never resolves, so it cannot be mistaken for a shutdown request.
async fn signal_or_pending(name: &str, signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!(signal = name, error = %e, "Failed to install signal handler");
        std::future::pending::<()>().await;
    }
}
