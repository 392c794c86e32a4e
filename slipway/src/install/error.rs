use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Required tool `{tool}` was not found on PATH. {hint}"))]
    PrerequisiteNotFound { tool: String, hint: String },

    #[snafu(display("{source}"))]
    Command { source: crate::exec::Error },

    #[snafu(display("{source}"))]
    Api { source: crate::api::Error },

    #[snafu(display("{source}"))]
    Session { source: crate::session::Error },

    #[snafu(display("Failed to initialize Kubernetes client, error: {source}"))]
    KubeClient { source: kube::Error },

    #[snafu(display("Failed to ensure namespace {namespace}, error: {source}"))]
    EnsureNamespace {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to apply secret {name} in namespace {namespace}, error: {source}"))]
    ApplySecret {
        name: String,
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to wait for pod {pod_name} status in namespace {namespace}"))]
    WaitForPodStatus { namespace: String, pod_name: String },

    #[snafu(display(
        "Failed to wait for pod {pod_name} status in namespace {namespace}, error: {source}"
    ))]
    GetPodStatus {
        namespace: String,
        pod_name: String,
        #[snafu(source(from(kube::runtime::wait::Error, Box::new)))]
        source: Box<kube::runtime::wait::Error>,
    },

    #[snafu(display(
        "Failed to get pod {pod_name} status in namespace {namespace}, error: {source}"
    ))]
    GetPod {
        namespace: String,
        pod_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to read the cluster DNS configuration, error: {source}"))]
    ReadDnsConfig {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to patch the cluster DNS configuration, error: {source}"))]
    PatchDnsConfig {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to restart the cluster DNS pods, error: {source}"))]
    RestartDns {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to create a directory for the starter template, error: {source}"))]
    CreateTemplateDir { source: std::io::Error },

    #[snafu(display("Failed to write the starter template into {}, error: {source}", path.display()))]
    WriteTemplate { path: PathBuf, source: std::io::Error },
}

impl From<crate::exec::Error> for Error {
    fn from(source: crate::exec::Error) -> Self { Self::Command { source } }
}

impl From<crate::api::Error> for Error {
    fn from(source: crate::api::Error) -> Self { Self::Api { source } }
}

impl From<crate::session::Error> for Error {
    fn from(source: crate::session::Error) -> Self { Self::Session { source } }
}
