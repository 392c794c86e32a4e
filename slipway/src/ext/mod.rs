//! Extensions on `kube` API handles used by the installation pipeline.

mod api_pod;

pub use self::api_pod::ApiPodExt;
