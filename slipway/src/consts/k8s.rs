//! Slipway-specific Kubernetes definitions.

pub const KUBE_SYSTEM_NAMESPACE: &str = "kube-system";
pub const COREDNS_CONFIGMAP: &str = "coredns";
pub const COREFILE_KEY: &str = "Corefile";

pub mod labels {
    //! Label selectors for the workloads slipway touches.

    /// Selects the CoreDNS pods in `kube-system`.
    pub const COREDNS_SELECTOR: &str = "k8s-app=kube-dns";

    /// Selects the product's server pods.
    pub const PRODUCT_SELECTOR: &str = "app.kubernetes.io/name=coder";
}

/// The database pod created by the `coder-db` PostgreSQL release.
pub const DB_POD_NAME: &str = "coder-db-postgresql-0";

/// The kind control-plane node container for a given cluster name. kind
/// derives the container name from the cluster name, so the tunnel can dial
/// it directly on the kind Docker network.
#[must_use]
pub fn control_plane_node(cluster_name: &str) -> String { format!("{cluster_name}-control-plane") }

/// In-cluster hostname of the database service.
#[must_use]
pub fn db_service_host(namespace: &str) -> String {
    format!("coder-db-postgresql.{namespace}.svc.cluster.local")
}

/// In-cluster hostname of the product's HTTP service.
#[must_use]
pub fn product_service_host(namespace: &str) -> String {
    format!("coder.{namespace}.svc.cluster.local")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_plane_node_follows_kind_naming() {
        assert_eq!(control_plane_node("coder"), "coder-control-plane");
    }

    #[test]
    fn test_service_hosts_are_namespaced() {
        assert_eq!(db_service_host("dev"), "coder-db-postgresql.dev.svc.cluster.local");
        assert_eq!(product_service_host("dev"), "coder.dev.svc.cluster.local");
    }
}
