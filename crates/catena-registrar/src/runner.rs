//! Command Runners
//!
//! Wires configuration, identity, store and probe together for the
//! `register` and `list` commands.

use crate::config::{ListConfig, RegistrarConfig};
use crate::directory::{render_peers, DirectoryReader};
use crate::registration::{
    LivenessProbe, RegistrationError, RenewalExit, Registrant, UnixSocketProbe,
};
use crate::store::{EtcdStore, Store};
use anyhow::{Context, Result};
use catena_core::{load_node_id, ClusterName, Enode, NodeName};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What to publish and how to keep it alive
#[derive(Debug, Clone)]
pub struct RegistrationPlan {
    pub cluster: ClusterName,
    pub node: NodeName,
    pub descriptor: String,
    pub lease_ttl: Duration,
    pub check_interval: Duration,
    pub revoke_on_shutdown: bool,
}

/// Register, then renew until the probe fails, a keep-alive fails, or
/// `shutdown` fires. On shutdown the lease is revoked only when the plan
/// asks for it.
pub async fn register_node<S, P>(
    store: S,
    probe: &P,
    plan: &RegistrationPlan,
    request_timeout: Duration,
    shutdown: CancellationToken,
) -> Result<RenewalExit, RegistrationError>
where
    S: Store,
    P: LivenessProbe + ?Sized,
{
    let mut registrant = Registrant::new(store, request_timeout);
    let lease = registrant
        .register(&plan.cluster, &plan.node, &plan.descriptor, plan.lease_ttl)
        .await?;

    let exit = registrant
        .run_renewal(&lease, probe, plan.check_interval, shutdown)
        .await?;

    if matches!(exit, RenewalExit::Shutdown { .. }) && plan.revoke_on_shutdown {
        registrant.revoke(lease).await?;
    }
    Ok(exit)
}

/// Build the plan for this node from configuration and its node key.
pub fn plan_from_config(config: &RegistrarConfig) -> Result<RegistrationPlan> {
    let cluster = config.cluster().context("invalid cluster name")?;
    let node = config.node().context("invalid node name")?;
    let node_id = load_node_id(&config.nodekey_path).context("failed to derive enode id")?;
    let descriptor = Enode::new(node_id, config.ip, config.port).to_string();

    Ok(RegistrationPlan {
        cluster,
        node,
        descriptor,
        lease_ttl: config.lease_ttl,
        check_interval: config.check_interval,
        revoke_on_shutdown: config.revoke_on_shutdown,
    })
}

/// Run the `register` command against etcd.
pub async fn run_register(
    config: &RegistrarConfig,
    shutdown: CancellationToken,
) -> Result<RenewalExit> {
    config.store.validate()?;
    let plan = plan_from_config(config)?;

    if !config.has_renewal_margin() {
        warn!(
            ttl_secs = config.lease_ttl.as_secs(),
            interval_secs = config.check_interval.as_secs(),
            "Check interval leaves no slack before lease expiry"
        );
    }

    info!(
        cluster = %plan.cluster,
        node = %plan.node,
        descriptor = %plan.descriptor,
        "Registering node"
    );

    let store = EtcdStore::connect(&config.store.etcd_endpoints, config.store.request_timeout)
        .await
        .context("failed to connect to etcd")?;
    let probe = UnixSocketProbe::new(&config.ipc_path).with_timeout(config.probe_timeout);

    let exit = register_node(store, &probe, &plan, config.store.request_timeout, shutdown).await?;
    Ok(exit)
}

/// Run the `list` command against etcd and return the rendered peer list.
pub async fn run_list(config: &ListConfig) -> Result<String> {
    config.store.validate()?;
    let cluster = config.cluster().context("invalid cluster name")?;

    let store = EtcdStore::connect(&config.store.etcd_endpoints, config.store.request_timeout)
        .await
        .context("failed to connect to etcd")?;
    let mut reader = DirectoryReader::new(store, config.store.request_timeout);
    let peers = reader
        .list_peers(&cluster)
        .await
        .with_context(|| format!("failed to list peers of cluster {}", cluster))?;

    Ok(render_peers(&peers))
}
