//! The installation pipeline.
//!
//! `Installer` runs a fixed sequence of named steps, each delegating to an
//! external tool, the Kubernetes API, or the product's HTTP API:
//!
//! 1. Check prerequisites
//! 2. (Re)create the kind cluster
//! 3. Install PostgreSQL and materialize the connection secret
//! 4. Install the product chart
//! 5. Patch cluster DNS for the wildcard domain (best-effort)
//! 6. Start the local tunnel container
//! 7. Bootstrap: poll readiness, create the first account, log in, persist
//!    and verify the session
//! 8. Push the starter template
//! 9. Print connection instructions
//!
//! Re-running the pipeline converges on the same end state: the cluster is
//! recreated from scratch, chart installs use `upgrade --install`, and
//! Kubernetes objects are written with server-side apply.

pub(crate) mod error;
pub(crate) mod manifests;

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod, Secret};
use kube::{
    Api,
    api::{DeleteParams, ListParams, ObjectMeta, Patch, PatchParams},
};
use snafu::ResultExt;

use crate::{
    api,
    config::Config,
    consts::{self, k8s},
    exec,
    ext::ApiPodExt,
    session::SessionStore,
    template, tunnel,
};

pub use self::error::Error;

/// Tools the pipeline shells out to, with installation hints shown when one
/// is missing. Checked before any cluster-mutating action.
const REQUIRED_TOOLS: [(&str, &str); 5] = [
    ("docker", "Install Docker: https://docs.docker.com/get-docker/"),
    ("kind", "Install kind: https://kind.sigs.k8s.io/docs/user/quick-start/#installation"),
    ("kubectl", "Install kubectl: https://kubernetes.io/docs/tasks/tools/"),
    ("helm", "Install Helm: https://helm.sh/docs/intro/install/"),
    ("coder", "Install the Coder CLI: https://coder.com/docs/install"),
];

pub struct Installer {
    config: Config,
}

impl Installer {
    #[must_use]
    pub const fn new(config: Config) -> Self { Self { config } }

    /// Runs the whole pipeline. The first failing step aborts the run; only
    /// the DNS patch is allowed to fail quietly.
    pub async fn run(&self) -> Result<(), Error> {
        self.check_prerequisites().await?;
        self.create_cluster().await?;
        self.install_database().await?;
        self.install_product().await?;
        self.patch_cluster_dns().await;
        self.start_tunnel().await?;
        let admin_username = self.bootstrap().await?;
        self.push_starter_template().await?;
        self.report(&admin_username);
        Ok(())
    }

    async fn check_prerequisites(&self) -> Result<(), Error> {
        tracing::info!("Checking prerequisites");
        for (tool, hint) in REQUIRED_TOOLS {
            if exec::lookup(tool).await {
                tracing::info!("  {tool}: ok");
            } else {
                return Err(Error::PrerequisiteNotFound {
                    tool: tool.to_string(),
                    hint: hint.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Deletes any cluster of the same name, then creates a fresh one and
    /// waits for its node to be schedulable.
    async fn create_cluster(&self) -> Result<(), Error> {
        let cluster_name = &self.config.cluster_name;

        tracing::info!("Deleting existing kind cluster `{cluster_name}` if present");
        let _output =
            exec::run_unchecked("kind", &["delete", "cluster", "--name", cluster_name]).await;

        tracing::info!("Creating kind cluster `{cluster_name}`");
        let _stdout = exec::run_with_stdin(
            "kind",
            &["create", "cluster", "--name", cluster_name, "--config", "-"],
            manifests::KIND_CLUSTER_CONFIG,
        )
        .await?;

        tracing::info!("Waiting for the cluster node to become ready");
        let _stdout = exec::run(
            "kubectl",
            &["wait", "--for=condition=Ready", "nodes", "--all", "--timeout=120s"],
        )
        .await?;

        Ok(())
    }

    async fn install_database(&self) -> Result<(), Error> {
        let namespace = &self.config.namespace;

        tracing::info!("Installing PostgreSQL into namespace `{namespace}`");
        let _stdout = exec::run(
            "helm",
            &[
                "repo",
                "add",
                consts::DB_CHART_REPO_NAME,
                consts::DB_CHART_REPO_URL,
                "--force-update",
            ],
        )
        .await?;

        let client = kube_client().await?;
        self.ensure_namespace(client.clone()).await?;

        let _stdout = exec::run_with_stdin(
            "helm",
            &[
                "upgrade",
                "--install",
                consts::DB_RELEASE_NAME,
                consts::DB_CHART,
                "--namespace",
                namespace,
                "--values",
                "-",
            ],
            &manifests::database_values(),
        )
        .await?;

        tracing::info!("Waiting for the database pod to be running");
        let pods = Api::<Pod>::namespaced(client.clone(), namespace);
        let _pod = pods
            .await_running_status(k8s::DB_POD_NAME, namespace, consts::DATABASE_READY_TIMEOUT)
            .await?;

        self.apply_database_secret(client).await
    }

    async fn ensure_namespace(&self, client: kube::Client) -> Result<(), Error> {
        let namespace = &self.config.namespace;
        let namespaces = Api::<Namespace>::all(client);
        let object = Namespace {
            metadata: ObjectMeta { name: Some(namespace.clone()), ..ObjectMeta::default() },
            ..Namespace::default()
        };
        let _namespace = namespaces
            .patch(namespace, &apply_params(), &Patch::Apply(&object))
            .await
            .with_context(|_| error::EnsureNamespaceSnafu { namespace: namespace.clone() })?;
        Ok(())
    }

    /// Writes the connection secret the product chart reads its database URL
    /// from. Server-side apply overwrites whatever a previous run left.
    async fn apply_database_secret(&self, client: kube::Client) -> Result<(), Error> {
        let namespace = &self.config.namespace;
        let secrets = Api::<Secret>::namespaced(client, namespace);
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(consts::DB_SECRET_NAME.to_string()),
                namespace: Some(namespace.clone()),
                ..ObjectMeta::default()
            },
            string_data: Some(BTreeMap::from([(
                consts::DB_SECRET_KEY.to_string(),
                manifests::database_url(namespace),
            )])),
            ..Secret::default()
        };
        let _secret = secrets
            .patch(consts::DB_SECRET_NAME, &apply_params(), &Patch::Apply(&secret))
            .await
            .with_context(|_| error::ApplySecretSnafu {
                name: consts::DB_SECRET_NAME.to_string(),
                namespace: namespace.clone(),
            })?;
        tracing::info!("Database connection secret `{}` applied", consts::DB_SECRET_NAME);
        Ok(())
    }

    async fn install_product(&self) -> Result<(), Error> {
        let namespace = &self.config.namespace;

        tracing::info!("Installing the product into namespace `{namespace}`");
        let _stdout = exec::run(
            "helm",
            &[
                "repo",
                "add",
                consts::PRODUCT_CHART_REPO_NAME,
                consts::PRODUCT_CHART_REPO_URL,
                "--force-update",
            ],
        )
        .await?;

        let values =
            manifests::product_values(&self.config.access_url, &self.config.wildcard_domain);
        let _stdout = exec::run_with_stdin(
            "helm",
            &[
                "upgrade",
                "--install",
                consts::PRODUCT_RELEASE_NAME,
                consts::PRODUCT_CHART,
                "--namespace",
                namespace,
                "--values",
                "-",
                "--wait",
            ],
            &values,
        )
        .await?;

        Ok(())
    }

    /// Rewrites the wildcard domain to the in-cluster service inside the
    /// cluster's DNS. Workspace traffic stays local to the cluster, so this
    /// is a convenience for template testing; any failure is reported and
    /// swallowed.
    async fn patch_cluster_dns(&self) {
        if let Err(err) = self.try_patch_cluster_dns().await {
            tracing::warn!("Skipping cluster DNS patch: {err}");
        }
    }

    async fn try_patch_cluster_dns(&self) -> Result<(), Error> {
        let client = kube_client().await?;
        let config_maps = Api::<ConfigMap>::namespaced(client.clone(), k8s::KUBE_SYSTEM_NAMESPACE);
        let core_dns = config_maps
            .get(k8s::COREDNS_CONFIGMAP)
            .await
            .context(error::ReadDnsConfigSnafu)?;

        let Some(corefile) = core_dns.data.as_ref().and_then(|data| data.get(k8s::COREFILE_KEY))
        else {
            tracing::warn!("Cluster DNS has no Corefile; leaving it untouched");
            return Ok(());
        };

        let target = k8s::product_service_host(&self.config.namespace);
        match manifests::inject_rewrite(corefile, &self.config.wildcard_domain, &target) {
            None => {
                tracing::info!("Cluster DNS rewrite already in place");
            }
            Some(updated) => {
                let patch = serde_json::json!({ "data": { k8s::COREFILE_KEY: updated } });
                let _config_map = config_maps
                    .patch(k8s::COREDNS_CONFIGMAP, &PatchParams::default(), &Patch::Merge(&patch))
                    .await
                    .context(error::PatchDnsConfigSnafu)?;

                // The DNS pods only pick the new Corefile up on restart.
                let pods = Api::<Pod>::namespaced(client, k8s::KUBE_SYSTEM_NAMESPACE);
                let _deleted = pods
                    .delete_collection(
                        &DeleteParams::default(),
                        &ListParams::default().labels(k8s::labels::COREDNS_SELECTOR),
                    )
                    .await
                    .context(error::RestartDnsSnafu)?;
                tracing::info!(
                    "Cluster DNS now resolves *.{} to {target}",
                    self.config.wildcard_domain
                );
            }
        }
        Ok(())
    }

    async fn start_tunnel(&self) -> Result<(), Error> {
        tracing::info!("Starting the local tunnel");
        tunnel::start(&self.config.cluster_name).await.map_err(Error::from)
    }

    /// Polls the deployment until it answers, creates and verifies the
    /// administrative session, and persists it for the `coder` CLI. Returns
    /// the administrative username for the final report.
    async fn bootstrap(&self) -> Result<String, Error> {
        let client = api::Client::new(&self.config.access_url)?;

        tracing::info!("Waiting for the deployment to become ready");
        let info = client
            .wait_until_ready(consts::READINESS_MAX_ATTEMPTS, consts::READINESS_POLL_INTERVAL)
            .await?;
        tracing::info!("Deployment is up, version {}", info.version);

        let admin = &self.config.admin;
        match client.create_first_user(admin).await {
            Ok(()) => tracing::info!("Administrative account `{}` created", admin.username),
            Err(api::Error::FirstUserExists) => {
                tracing::info!("Administrative account already exists");
            }
            Err(err) => return Err(err.into()),
        }

        let login = client.login(&admin.email, &admin.password).await?;

        let store = SessionStore::discover()?;
        store.write(&login.session_token, &self.config.access_url)?;
        tracing::info!("Session persisted to {}", store.root().display());

        let user = client.current_user(&login.session_token).await?;
        tracing::info!("Session verified, logged in as `{}` ({})", user.username, user.email);

        Ok(user.username)
    }

    async fn push_starter_template(&self) -> Result<(), Error> {
        tracing::info!("Pushing the starter template `{}`", consts::STARTER_TEMPLATE_NAME);
        let dir = tempfile::tempdir().context(error::CreateTemplateDirSnafu)?;
        let _path = template::materialize(dir.path(), &self.config.namespace)
            .with_context(|_| error::WriteTemplateSnafu { path: dir.path().to_path_buf() })?;

        let directory = dir.path().to_string_lossy().to_string();
        exec::run_streamed(
            "coder",
            &[
                "templates",
                "push",
                consts::STARTER_TEMPLATE_NAME,
                "--directory",
                &directory,
                "--yes",
            ],
        )
        .await?;
        Ok(())
    }

    fn report(&self, admin_username: &str) {
        let Config { access_url, wildcard_domain, admin, .. } = &self.config;
        println!();
        println!("Deployment ready at {access_url}");
        println!();
        println!("  Username: {admin_username}");
        println!("  Email:    {}", admin.email);
        println!("  Password: {}", admin.password);
        println!();
        println!("Workspace applications are served under *.{wildcard_domain} inside the");
        println!("cluster. Create a first workspace with:");
        println!();
        println!("  coder create --template {} my-workspace", consts::STARTER_TEMPLATE_NAME);
        println!();
    }
}

async fn kube_client() -> Result<kube::Client, Error> {
    kube::Client::try_default().await.context(error::KubeClientSnafu)
}

fn apply_params() -> PatchParams { PatchParams::apply(consts::FIELD_MANAGER).force() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_tools_cover_the_pipeline() {
        let tools = REQUIRED_TOOLS.map(|(tool, _)| tool);
        for tool in ["docker", "kind", "kubectl", "helm", "coder"] {
            assert!(tools.contains(&tool), "missing prerequisite: {tool}");
        }
    }

    #[test]
    fn test_required_tool_hints_are_actionable() {
        for (tool, hint) in REQUIRED_TOOLS {
            assert!(hint.contains("Install"), "hint for {tool} should explain installation");
        }
    }

    #[test]
    fn test_prerequisite_error_display() {
        let err = Error::PrerequisiteNotFound {
            tool: "kind".to_string(),
            hint: "Install kind".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("kind"));
        assert!(rendered.contains("Install kind"));
    }

    #[test]
    fn test_readiness_budget_is_bounded() {
        // The poll must give up after ceiling * (attempt timeout + delay).
        let ceiling = consts::READINESS_MAX_ATTEMPTS;
        let worst_case = (consts::READINESS_ATTEMPT_TIMEOUT + consts::READINESS_POLL_INTERVAL)
            * ceiling;
        assert!(worst_case <= std::time::Duration::from_secs(300));
    }
}
