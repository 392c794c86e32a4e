mod admin;
mod error;
mod log;

use std::path::{Path, PathBuf};

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::consts;

pub use self::{
    admin::AdminCredentials,
    error::Error,
    log::LogConfig,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Name of the kind cluster the deployment lives on.
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,

    /// Namespace the database and the product are installed into.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// URL the deployment is reached at through the local tunnel. Written to
    /// the session artifact and used as the product's access URL.
    #[serde(default = "default_access_url")]
    pub access_url: String,

    /// Wildcard domain workspace applications are served under.
    #[serde(default = "default_wildcard_domain")]
    pub wildcard_domain: String,

    #[serde(default = "AdminCredentials::default")]
    pub admin: AdminCredentials,

    #[serde(default = "LogConfig::default")]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster_name: default_cluster_name(),
            namespace: default_namespace(),
            access_url: default_access_url(),
            wildcard_domain: default_wildcard_domain(),
            admin: AdminCredentials::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    pub fn search_config_file_path() -> PathBuf {
        let paths = vec![Self::default_path()]
            .into_iter()
            .chain(crate::fallback_project_config_directories().into_iter().map(|mut path| {
                path.push(crate::CLI_CONFIG_NAME);
                path
            }))
            .collect::<Vec<_>>();
        for path in paths {
            let Ok(exists) = path.try_exists() else {
                continue;
            };
            if exists {
                return path;
            }
        }
        Self::default_path()
    }

    #[inline]
    pub fn default_path() -> PathBuf {
        [crate::PROJECT_CONFIG_DIR.to_path_buf(), PathBuf::from(crate::CLI_CONFIG_NAME)]
            .into_iter()
            .collect()
    }

    /// Loads the configuration from `path`, falling back to the defaults
    /// when no file exists there. The configuration file is optional; a
    /// bare `slipway install` on a fresh machine must work without one.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let resolved =
            path.as_ref().try_resolve().map(|path| path.to_path_buf()).with_context(|_| {
                error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() }
            })?;
        if resolved.try_exists().unwrap_or(false) { Self::load(resolved) } else { Ok(Self::default()) }
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut config: Self = {
            let path =
                path.as_ref().try_resolve().map(|path| path.to_path_buf()).with_context(|_| {
                    error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() }
                })?;
            let data =
                std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
            serde_yaml::from_slice(&data).context(error::ParseConfigSnafu { filename: path })?
        };

        config.log.file_path = match config.log.file_path.map(|path| {
            path.try_resolve()
                .map(|path| path.to_path_buf())
                .with_context(|_| error::ResolveFilePathSnafu { file_path: path.clone() })
        }) {
            Some(Ok(path)) => Some(path),
            Some(Err(err)) => return Err(err),
            None => None,
        };

        Ok(config)
    }
}

fn default_cluster_name() -> String { consts::DEFAULT_CLUSTER_NAME.to_string() }

fn default_namespace() -> String { consts::DEFAULT_NAMESPACE.to_string() }

fn default_access_url() -> String { consts::DEFAULT_ACCESS_URL.to_string() }

fn default_wildcard_domain() -> String { consts::DEFAULT_WILDCARD_DOMAIN.to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cluster_name, "coder");
        assert_eq!(config.namespace, "coder");
        assert_eq!(config.access_url, "http://localhost");
        assert_eq!(config.wildcard_domain, "coder.test");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let yaml = "clusterName: sandbox\n";
        let config: Config = serde_yaml::from_str(yaml).expect("Should parse partial config");
        assert_eq!(config.cluster_name, "sandbox");
        assert_eq!(config.namespace, "coder");
        assert_eq!(config.admin.username, AdminCredentials::default().username);
    }

    #[test]
    fn test_config_round_trips_through_yaml() {
        let config = Config::default();
        let rendered = serde_yaml::to_string(&config).expect("Should serialize");
        let parsed: Config = serde_yaml::from_str(&rendered).expect("Should parse");
        assert_eq!(parsed.cluster_name, config.cluster_name);
        assert_eq!(parsed.wildcard_domain, config.wildcard_domain);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let config = Config::load_or_default(dir.path().join("missing.yaml"))
            .expect("Should fall back to defaults");
        assert_eq!(config.namespace, "coder");
    }

    #[test]
    fn test_load_rejects_invalid_yaml() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "clusterName: [unterminated").expect("Should write file");
        let result = Config::load(&path);
        assert!(matches!(result, Err(Error::ParseConfig { .. })));
    }
}
