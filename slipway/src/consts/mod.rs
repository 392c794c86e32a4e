pub mod k8s;

use std::time::Duration;

/// The default name of the kind cluster the deployment lives on.
pub const DEFAULT_CLUSTER_NAME: &str = "coder";

/// The default namespace the database and the product are installed into.
pub const DEFAULT_NAMESPACE: &str = "coder";

/// The default URL the deployment is reached at through the local tunnel.
pub const DEFAULT_ACCESS_URL: &str = "http://localhost";

/// The default wildcard domain used for workspace applications during local
/// testing. `*.coder.test` resolves to the in-cluster service once the
/// cluster DNS has been patched.
pub const DEFAULT_WILDCARD_DOMAIN: &str = "coder.test";

pub const DB_RELEASE_NAME: &str = "coder-db";
pub const DB_CHART: &str = "bitnami/postgresql";
pub const DB_CHART_REPO_NAME: &str = "bitnami";
pub const DB_CHART_REPO_URL: &str = "https://charts.bitnami.com/bitnami";

/// The secret holding the database connection URL, consumed by the product
/// chart via `secretKeyRef`.
pub const DB_SECRET_NAME: &str = "coder-db-url";
pub const DB_SECRET_KEY: &str = "url";

pub const PRODUCT_RELEASE_NAME: &str = "coder";
pub const PRODUCT_CHART: &str = "coder-v2/coder";
pub const PRODUCT_CHART_REPO_NAME: &str = "coder-v2";
pub const PRODUCT_CHART_REPO_URL: &str = "https://helm.coder.com/v2";

/// The NodePort the product's HTTP service is exposed on inside the kind
/// node. The tunnel container relays host traffic to this port.
pub const PRODUCT_NODE_PORT: u16 = 30080;

pub const TUNNEL_CONTAINER_NAME: &str = "coder-tunnel";
pub const TUNNEL_IMAGE: &str = "docker.io/alpine/socat:1.8.0.3";
pub const TUNNEL_HOST_PORT: u16 = 80;

/// The Docker network kind attaches its node containers to.
pub const KIND_NETWORK: &str = "kind";

/// Bounds of the readiness poll against the product's build-info endpoint.
pub const READINESS_MAX_ATTEMPTS: u32 = 60;
pub const READINESS_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const READINESS_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout for ordinary API requests outside the readiness poll.
pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const DATABASE_READY_TIMEOUT: Duration = Duration::from_secs(300);

/// The Coder CLI keeps its session under this directory name inside the
/// platform configuration directory; sessions written there are picked up by
/// subsequent `coder` invocations.
pub const SESSION_DIR_NAME: &str = "coderv2";
pub const SESSION_TOKEN_FILE: &str = "session";
pub const SESSION_URL_FILE: &str = "url";

/// Field manager recorded by server-side apply operations.
pub const FIELD_MANAGER: &str = "slipway";

/// Name of the starter template pushed at the end of the installation.
pub const STARTER_TEMPLATE_NAME: &str = "kubernetes";
