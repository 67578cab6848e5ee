use futures_util::future::join_all;
use tracing::{info, warn};

use crate::runtime::ContainerRuntime;

/// Stops every container and removes every network whose name contains the
/// run identifier.
///
/// Resources are rediscovered from the runtime rather than taken from
/// in-memory handles, so cleanup works even after a partial provisioning
/// failure. Container stops are issued concurrently, then network removals.
/// Best-effort throughout: failures are logged at WARN and never returned,
/// so teardown can never mask the error that led here.
pub async fn remove_run_resources(runtime: &dyn ContainerRuntime, run_id: &str) {
    match runtime.list_containers().await {
        Ok(containers) => {
            let stops = containers
                .iter()
                .filter(|container| container.name.contains(run_id))
                .map(|container| async move {
                    if let Err(err) = runtime.stop_container(&container.id).await {
                        warn!(container = %container.name, error = %err, "failed to stop container");
                    }
                });
            join_all(stops).await;
        }
        Err(err) => warn!(error = %err, "failed to list containers during teardown"),
    }

    match runtime.list_networks().await {
        Ok(networks) => {
            let removals = networks
                .iter()
                .filter(|network| network.name.contains(run_id))
                .map(|network| async move {
                    if let Err(err) = runtime.remove_network(&network.id).await {
                        warn!(network = %network.name, error = %err, "failed to remove network");
                    }
                });
            join_all(removals).await;
        }
        Err(err) => warn!(error = %err, "failed to list networks during teardown"),
    }

    info!(run_id, "teardown finished");
}
