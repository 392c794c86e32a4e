use serde::{Deserialize, Serialize};

/// Environment variables overriding the administrative account credentials.
pub const ADMIN_EMAIL_ENV: &str = "SLIPWAY_ADMIN_EMAIL";
pub const ADMIN_USERNAME_ENV: &str = "SLIPWAY_ADMIN_USERNAME";
pub const ADMIN_PASSWORD_ENV: &str = "SLIPWAY_ADMIN_PASSWORD";

/// Credentials for the first administrative account created during
/// bootstrap. These are local-development credentials; the defaults exist so
/// a bare `slipway install` works without any configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredentials {
    #[serde(default = "default_email")]
    pub email: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            email: default_email(),
            username: default_username(),
            password: default_password(),
        }
    }
}

impl AdminCredentials {
    /// Applies the override chain: explicit CLI argument, then environment
    /// variable, then whatever the configuration file (or default) holds.
    #[must_use]
    pub fn resolved(
        self,
        email: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        let Self { email: cfg_email, username: cfg_username, password: cfg_password } = self;
        Self {
            email: email.or_else(|| env_override(ADMIN_EMAIL_ENV)).unwrap_or(cfg_email),
            username: username.or_else(|| env_override(ADMIN_USERNAME_ENV)).unwrap_or(cfg_username),
            password: password.or_else(|| env_override(ADMIN_PASSWORD_ENV)).unwrap_or(cfg_password),
        }
    }
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn default_email() -> String { "admin@coder.test".to_string() }

fn default_username() -> String { "admin".to_string() }

fn default_password() -> String { "LocalAdmin123!".to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_non_empty() {
        let admin = AdminCredentials::default();
        assert!(!admin.email.is_empty());
        assert!(!admin.username.is_empty());
        assert!(!admin.password.is_empty());
    }

    #[test]
    fn test_resolved_prefers_explicit_arguments() {
        let admin = AdminCredentials::default().resolved(
            Some("dev@example.com".to_string()),
            Some("dev".to_string()),
            None,
        );
        assert_eq!(admin.email, "dev@example.com");
        assert_eq!(admin.username, "dev");
        assert_eq!(admin.password, AdminCredentials::default().password);
    }

    #[test]
    fn test_resolved_keeps_config_values_without_overrides() {
        let configured = AdminCredentials {
            email: "ops@example.com".to_string(),
            username: "ops".to_string(),
            password: "hunter2hunter2".to_string(),
        };
        let admin = configured.clone().resolved(None, None, None);
        assert_eq!(admin.email, configured.email);
        assert_eq!(admin.username, configured.username);
        assert_eq!(admin.password, configured.password);
    }
}
