//! Read-only reporting on the state of the local deployment.
//!
//! Every probe degrades to a placeholder when its subsystem is absent; a
//! missing cluster, a stopped tunnel, or an unreachable API must never fail
//! the command itself.

use clap::Args;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, api::ListParams};

use crate::{
    api,
    cli::Error,
    config::Config,
    consts::{self, k8s},
    exec,
    install::manifests,
    session::SessionStore,
    tunnel,
};

#[derive(Args, Clone, Default)]
pub struct DiagnosticsCommand {
    #[arg(
        short,
        long,
        help = "Namespace to inspect. Defaults to the namespace the deployment was installed \
                into."
    )]
    pub namespace: Option<String>,
}

struct Probe {
    component: &'static str,
    status: String,
    detail: String,
}

impl Probe {
    fn new(
        component: &'static str,
        status: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self { component, status: status.into(), detail: detail.into() }
    }
}

impl DiagnosticsCommand {
    pub async fn run(self, config: Config) -> Result<(), Error> {
        let Self { namespace } = self;
        let namespace =
            namespace.filter(|s| !s.is_empty()).unwrap_or_else(|| config.namespace.clone());

        let kube_client = kube::Client::try_default().await.ok();

        let mut probes = Vec::new();
        probes.push(probe_tunnel().await);

        let (pod_probe, pod_table) = probe_pods(kube_client.clone(), &namespace).await;
        probes.push(pod_probe);
        probes.push(probe_dns_config(kube_client, &config.wildcard_domain, &namespace).await);
        probes.push(probe_dns_resolution(&config.wildcard_domain).await);
        probes.push(probe_health(&config.access_url).await);

        println!("{}", render_probe_table(&probes));

        if let Some(table) = pod_table {
            println!();
            println!("{table}");
        }

        if let Some(logs) = recent_logs(&namespace).await {
            println!();
            println!("Recent product logs:");
            println!("{logs}");
        }

        Ok(())
    }
}

fn render_probe_table(probes: &[Probe]) -> String {
    let rows = probes
        .iter()
        .map(|Probe { component, status, detail }| {
            [(*component).to_string(), status.clone(), detail.clone()]
        })
        .collect::<Vec<_>>();
    comfy_table::Table::new()
        .load_preset(comfy_table::presets::NOTHING)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .set_header(vec!["COMPONENT", "STATUS", "DETAIL"])
        .add_rows(rows)
        .to_string()
}

async fn probe_tunnel() -> Probe {
    match tunnel::status().await {
        Some(state) => Probe::new("tunnel", state, consts::TUNNEL_CONTAINER_NAME),
        None => Probe::new("tunnel", "not running", consts::TUNNEL_CONTAINER_NAME),
    }
}

async fn probe_pods(
    kube_client: Option<kube::Client>,
    namespace: &str,
) -> (Probe, Option<String>) {
    let Some(client) = kube_client else {
        return (Probe::new("pods", "cluster unreachable", namespace.to_string()), None);
    };

    let pods = Api::<Pod>::namespaced(client, namespace);
    match pods.list(&ListParams::default()).await {
        Ok(list) if list.items.is_empty() => {
            (Probe::new("pods", "no pods found", namespace.to_string()), None)
        }
        Ok(list) => {
            let running = list
                .items
                .iter()
                .filter(|pod| {
                    pod.status.as_ref().and_then(|status| status.phase.as_deref())
                        == Some("Running")
                })
                .count();
            let probe = Probe::new(
                "pods",
                format!("{running}/{} running", list.items.len()),
                namespace.to_string(),
            );
            (probe, Some(render_pod_table(&list.items)))
        }
        Err(_) => (Probe::new("pods", "not found", namespace.to_string()), None),
    }
}

fn render_pod_table(pods: &[Pod]) -> String {
    let rows = pods.iter().map(pod_column).collect::<Vec<_>>();
    comfy_table::Table::new()
        .load_preset(comfy_table::presets::NOTHING)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .set_header(vec!["NAME", "IMAGE", "STATUS"])
        .add_rows(rows)
        .to_string()
}

fn pod_column(pod: &Pod) -> [String; 3] {
    [
        pod.metadata.name.clone().unwrap_or_default(),
        pod.spec
            .as_ref()
            .and_then(|s| s.containers.first())
            .map(|c| c.image.clone().unwrap_or_default())
            .unwrap_or_default(),
        pod.status.as_ref().and_then(|s| s.phase.clone()).unwrap_or_else(|| "Unknown".to_string()),
    ]
}

async fn probe_dns_config(
    kube_client: Option<kube::Client>,
    wildcard_domain: &str,
    namespace: &str,
) -> Probe {
    let detail = format!("*.{wildcard_domain}");
    let Some(client) = kube_client else {
        return Probe::new("cluster dns", "cluster unreachable", detail);
    };

    let config_maps = Api::<k8s_openapi::api::core::v1::ConfigMap>::namespaced(
        client,
        k8s::KUBE_SYSTEM_NAMESPACE,
    );
    match config_maps.get(k8s::COREDNS_CONFIGMAP).await {
        Ok(core_dns) => {
            let rule =
                manifests::rewrite_rule(wildcard_domain, &k8s::product_service_host(namespace));
            let patched = core_dns
                .data
                .as_ref()
                .and_then(|data| data.get(k8s::COREFILE_KEY))
                .is_some_and(|corefile| corefile.contains(&rule));
            let status = if patched { "patched" } else { "not patched" };
            Probe::new("cluster dns", status, detail)
        }
        Err(_) => Probe::new("cluster dns", "not found", detail),
    }
}

/// Resolves a name under the wildcard domain from inside the cluster by
/// spinning up a short-lived probe pod.
async fn probe_dns_resolution(wildcard_domain: &str) -> Probe {
    let hostname = format!("probe.{wildcard_domain}");
    let output = exec::run_unchecked(
        "kubectl",
        &[
            "run",
            "slipway-dns-probe",
            "--rm",
            "--attach",
            "--restart=Never",
            "--image=busybox:1.36",
            "--command",
            "--",
            "nslookup",
            &hostname,
        ],
    )
    .await;

    let status = match output {
        Some(output) if output.status.success() => "resolves",
        Some(_) => "not resolving",
        None => "not found",
    };
    Probe::new("dns resolution", status, hostname)
}

async fn probe_health(access_url: &str) -> Probe {
    let token = SessionStore::discover().ok().and_then(|store| store.token().ok());
    let Ok(client) = api::Client::new(access_url) else {
        return Probe::new("health", "unreachable", access_url.to_string());
    };

    match client.health(token.as_deref()).await {
        Ok(report) if report.healthy => Probe::new("health", "healthy", access_url.to_string()),
        Ok(report) => {
            let subsystems = report.unhealthy_subsystems();
            let detail = if subsystems.is_empty() {
                access_url.to_string()
            } else {
                format!("unhealthy: {}", subsystems.join(", "))
            };
            Probe::new("health", "degraded", detail)
        }
        Err(_) => Probe::new("health", "unreachable", access_url.to_string()),
    }
}

async fn recent_logs(namespace: &str) -> Option<String> {
    let output = exec::run_unchecked(
        "kubectl",
        &[
            "logs",
            "--namespace",
            namespace,
            "--selector",
            k8s::labels::PRODUCT_SELECTOR,
            "--tail",
            "20",
        ],
    )
    .await?;

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim_end().to_string())
        .filter(|logs| !logs.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_table_lists_every_component() {
        let probes = vec![
            Probe::new("tunnel", "running", "coder-tunnel"),
            Probe::new("health", "unreachable", "http://localhost"),
        ];
        let rendered = render_probe_table(&probes);
        assert!(rendered.contains("tunnel"));
        assert!(rendered.contains("unreachable"));
        assert!(rendered.contains("COMPONENT"));
    }

    #[test]
    fn test_pod_table_handles_missing_fields() {
        let rendered = render_pod_table(&[Pod::default()]);
        assert!(rendered.contains("Unknown"));
    }
}
