//! The local TCP relay.
//!
//! A detached `socat` container joins the kind Docker network and publishes
//! host port 80, relaying every connection to the product's NodePort on the
//! cluster's control-plane node. That makes the deployment reachable at the
//! access URL without touching the host network configuration.

use crate::{consts, exec};

/// Starts the relay container, replacing any previous instance.
pub async fn start(cluster_name: &str) -> Result<(), exec::Error> {
    stop().await;

    let publish = format!("{}:{}", consts::TUNNEL_HOST_PORT, consts::TUNNEL_HOST_PORT);
    let listen = format!("tcp-listen:{},fork,reuseaddr", consts::TUNNEL_HOST_PORT);
    let connect = format!(
        "tcp-connect:{}:{}",
        consts::k8s::control_plane_node(cluster_name),
        consts::PRODUCT_NODE_PORT
    );

    let _container_id = exec::run(
        "docker",
        &[
            "run",
            "--detach",
            "--name",
            consts::TUNNEL_CONTAINER_NAME,
            "--network",
            consts::KIND_NETWORK,
            "--publish",
            &publish,
            consts::TUNNEL_IMAGE,
            &listen,
            &connect,
        ],
    )
    .await?;

    tracing::info!(
        "Tunnel `{}` relays host port {} to {connect}",
        consts::TUNNEL_CONTAINER_NAME,
        consts::TUNNEL_HOST_PORT
    );
    Ok(())
}

/// Removes the relay container. Absence is not an error; the relay may never
/// have been started.
pub async fn stop() {
    let removed = exec::run_unchecked("docker", &["rm", "--force", consts::TUNNEL_CONTAINER_NAME])
        .await
        .is_some_and(|output| output.status.success());
    if removed {
        tracing::info!("Removed tunnel container `{}`", consts::TUNNEL_CONTAINER_NAME);
    }
}

/// Reports the relay container's runtime state, `None` when it does not
/// exist or Docker is unreachable.
pub async fn status() -> Option<String> {
    let output = exec::run_unchecked(
        "docker",
        &["inspect", "--format", "{{.State.Status}}", consts::TUNNEL_CONTAINER_NAME],
    )
    .await?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|state| !state.is_empty())
}
