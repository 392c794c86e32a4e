//! The starter workspace template.
//!
//! A fixed infrastructure-as-code payload defining a workspace agent, a web
//! application entry, a persistent home volume, and the deployment running
//! the workspace container. The only parameter is the namespace workspaces
//! are created in; given the same namespace the rendered payload is
//! byte-identical on every run, so pushing it repeatedly converges.

use std::path::{Path, PathBuf};

pub const TEMPLATE_FILE_NAME: &str = "main.tf";

const NAMESPACE_PLACEHOLDER: &str = "%NAMESPACE%";

const STARTER_TEMPLATE: &str = r#"terraform {
  required_providers {
    coder = {
      source = "coder/coder"
    }
    kubernetes = {
      source = "hashicorp/kubernetes"
    }
  }
}

provider "kubernetes" {}

variable "namespace" {
  type    = string
  default = "%NAMESPACE%"
}

data "coder_workspace" "me" {}

resource "coder_agent" "main" {
  os             = "linux"
  arch           = "amd64"
  startup_script = <<-EOT
    set -e
    code-server --auth none --port 13337 >/tmp/code-server.log 2>&1 &
  EOT
}

resource "coder_app" "code_server" {
  agent_id     = coder_agent.main.id
  slug         = "code-server"
  display_name = "code-server"
  url          = "http://localhost:13337/?folder=/home/coder"
  icon         = "/icon/code.svg"
  share        = "owner"
  subdomain    = false
}

resource "kubernetes_persistent_volume_claim" "home" {
  metadata {
    name      = "coder-${data.coder_workspace.me.id}-home"
    namespace = var.namespace
  }
  wait_until_bound = false
  spec {
    access_modes = ["ReadWriteOnce"]
    resources {
      requests = {
        storage = "1Gi"
      }
    }
  }
}

resource "kubernetes_deployment" "main" {
  count = data.coder_workspace.me.start_count
  metadata {
    name      = "coder-${data.coder_workspace.me.id}"
    namespace = var.namespace
  }
  spec {
    replicas = 1
    selector {
      match_labels = {
        "coder.workspace" = data.coder_workspace.me.id
      }
    }
    template {
      metadata {
        labels = {
          "coder.workspace" = data.coder_workspace.me.id
        }
      }
      spec {
        container {
          name    = "dev"
          image   = "codercom/enterprise-base:ubuntu"
          command = ["sh", "-c", coder_agent.main.init_script]
          env {
            name  = "CODER_AGENT_TOKEN"
            value = coder_agent.main.token
          }
          volume_mount {
            mount_path = "/home/coder"
            name       = "home"
          }
        }
        volume {
          name = "home"
          persistent_volume_claim {
            claim_name = kubernetes_persistent_volume_claim.home.metadata.0.name
          }
        }
      }
    }
  }
}
"#;

/// Renders the starter template for the given namespace.
#[must_use]
pub fn starter_template(namespace: &str) -> String {
    STARTER_TEMPLATE.replace(NAMESPACE_PLACEHOLDER, namespace)
}

/// Writes the rendered template into `dir` and returns the file path.
pub fn materialize(dir: &Path, namespace: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(TEMPLATE_FILE_NAME);
    std::fs::write(&path, starter_template(namespace))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_is_deterministic() {
        assert_eq!(starter_template("coder"), starter_template("coder"));
    }

    #[test]
    fn test_namespace_is_substituted_everywhere() {
        let rendered = starter_template("sandbox");
        assert!(rendered.contains(r#"default = "sandbox""#));
        assert!(!rendered.contains(NAMESPACE_PLACEHOLDER));
    }

    #[test]
    fn test_template_defines_expected_resources() {
        let rendered = starter_template("coder");
        assert!(rendered.contains(r#"resource "coder_agent" "main""#));
        assert!(rendered.contains(r#"resource "coder_app" "code_server""#));
        assert!(rendered.contains(r#"resource "kubernetes_persistent_volume_claim" "home""#));
        assert!(rendered.contains(r#"resource "kubernetes_deployment" "main""#));
    }

    #[test]
    fn test_materialize_writes_main_tf() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = materialize(dir.path(), "coder").expect("Should write template");

        assert_eq!(path.file_name().and_then(|name| name.to_str()), Some(TEMPLATE_FILE_NAME));
        let contents = std::fs::read_to_string(&path).expect("Should read back template");
        assert_eq!(contents, starter_template("coder"));
    }
}
