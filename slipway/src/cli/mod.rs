//! The `slipway` command-line interface.
//!
//! One command with a handful of subcommands around a local Coder
//! deployment on kind: `install` (the default) runs the full pipeline,
//! `cleanup` tears everything down, `diagnostics` reports the current state
//! of every involved subsystem, and `tunnel` restarts the local relay.
//!
//! # Examples
//!
//! ```bash
//! # Stand up the whole deployment
//! slipway install
//!
//! # Inspect a deployment that misbehaves
//! slipway diagnostics
//!
//! # Restart the relay container after a reboot
//! slipway tunnel
//!
//! # Tear everything down again
//! slipway cleanup
//! ```

mod cleanup;
mod diagnostics;
pub mod error;
mod install;
mod tunnel;

use std::{io::Write, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use snafu::ResultExt;
use tokio::runtime::Runtime;

pub use self::error::Error;
use self::{
    cleanup::CleanupCommand, diagnostics::DiagnosticsCommand, install::InstallCommand,
    tunnel::TunnelCommand,
};
use crate::{CLI_PROGRAM_NAME, api, config::Config, session::SessionStore};

#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version = crate::PROJECT_VERSION,
    about = "Slipway: stand up a local Coder deployment on a kind Kubernetes cluster.",
    long_about = "Slipway automates deploying the Coder workspace-orchestration product onto a \
                  local single-node kind cluster for development and template authoring: it \
                  creates the cluster, installs PostgreSQL and Coder from their charts, wires \
                  up local DNS and a host tunnel, bootstraps the first administrative account, \
                  and pushes a starter workspace template.",
    color = clap::ColorChoice::Always
)]
pub struct Cli {
    /// The subcommand to execute; running without one performs `install`.
    #[clap(subcommand)]
    commands: Option<Commands>,

    /// Path to the configuration file.
    #[clap(
        long = "config",
        short = 'c',
        env = "SLIPWAY_CONFIG_FILE_PATH",
        help = "Specify a configuration file. Defaults to ~/.config/slipway/config.yaml or \
                SLIPWAY_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    /// Sets the logging level for the application.
    #[clap(
        long = "log-level",
        env = "SLIPWAY_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Runs the full installation pipeline. This is the default when no
    /// subcommand is given.
    #[command(about = "Deploy Coder onto a fresh local kind cluster (the default)")]
    Install(InstallCommand),

    /// Tears down everything a previous `install` created.
    #[command(about = "Remove the tunnel container, the kind cluster, and the local session")]
    Cleanup(CleanupCommand),

    /// Reports the current state of every involved subsystem.
    #[command(alias = "diag", about = "Report the state of the tunnel, pods, DNS, and health")]
    Diagnostics(DiagnosticsCommand),

    /// (Re)starts the local relay container.
    #[command(about = "Restart the local tunnel relaying host port 80 into the cluster")]
    Tunnel(TunnelCommand),

    /// Displays client and deployment version information.
    #[command(about = "Display client and deployment version information")]
    Version {
        #[clap(long = "client", help = "If true, shows client version only (no deployment required).")]
        client: bool,
    },

    /// Generates a shell completion script for the specified shell.
    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    /// Outputs the default configuration in YAML format to standard output.
    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    fn load_config(&self) -> Result<Config, Error> {
        let mut config = match self.config_file.clone() {
            Some(path) => Config::load(path)?,
            None => Config::load_or_default(Config::search_config_file_path())?,
        };

        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }

        Ok(config)
    }

    /// Dispatches the parsed command.
    ///
    /// The synchronous subcommands (completions, default configuration, the
    /// client-only version) are answered before a runtime or configuration
    /// is set up; everything else runs on a fresh Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an `Error` if configuration loading, runtime initialization,
    /// or the dispatched subcommand fails.
    ///
    /// # Panics
    ///
    /// This method `expect`s on `std::io::stdout().write_all()` operations.
    /// In a typical CLI environment, writing to `stdout` is expected to
    /// succeed.
    pub fn run(self) -> Result<i32, Error> {
        let client_version = Self::command().get_version().unwrap_or_default().to_string();
        match self.commands {
            Some(Commands::Version { client }) if client => {
                std::io::stdout()
                    .write_all(format!("Client Version: {client_version}\n").as_bytes())
                    .expect("Failed to write to stdout");

                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                let rendered = serde_yaml::to_string(&Config::default())
                    .expect("the default configuration serializes");
                std::io::stdout()
                    .write_all(rendered.as_bytes())
                    .expect("Failed to write to stdout");
                return Ok(0);
            }
            _ => {}
        }

        let config = self.load_config()?;
        config.log.registry();

        let fut = async move {
            match self.commands {
                Some(Commands::Version { .. }) => {
                    let server_version = match SessionStore::discover()
                        .ok()
                        .and_then(|store| store.url().ok())
                    {
                        Some(url) => match api::Client::new(url) {
                            Ok(client) => client.build_info().await.map_or_else(
                                |_| "unknown".to_string(),
                                |info| info.version,
                            ),
                            Err(_) => "unknown".to_string(),
                        },
                        None => "unknown (no active session)".to_string(),
                    };
                    std::io::stdout()
                        .write_all(
                            format!(
                                "Client Version: {client_version}\nServer Version: \
                                 {server_version}\n"
                            )
                            .as_bytes(),
                        )
                        .expect("Failed to write to stdout");
                }
                Some(Commands::Install(cmd)) => cmd.run(config).await?,
                Some(Commands::Cleanup(cmd)) => cmd.run(config).await?,
                Some(Commands::Diagnostics(cmd)) => cmd.run(config).await?,
                Some(Commands::Tunnel(cmd)) => cmd.run(config).await?,
                // Running bare `slipway` performs a full install.
                None => InstallCommand::default().run(config).await?,
                Some(Commands::Completions { .. } | Commands::DefaultConfig) => {}
            }

            Ok(0)
        };

        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(fut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_diag_alias_resolves_to_diagnostics() {
        let cli = Cli::try_parse_from(["slipway", "diag"]).expect("Should parse alias");
        assert!(matches!(cli.commands, Some(Commands::Diagnostics(_))));
    }

    #[test]
    fn test_no_subcommand_defaults_to_install() {
        let cli = Cli::try_parse_from(["slipway"]).expect("Should parse bare invocation");
        assert!(cli.commands.is_none());
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        let result = Cli::try_parse_from(["slipway", "bogus"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_install_accepts_credential_overrides() {
        let cli = Cli::try_parse_from([
            "slipway",
            "install",
            "--admin-email",
            "dev@example.com",
            "--admin-username",
            "dev",
        ])
        .expect("Should parse install flags");

        match cli.commands {
            Some(Commands::Install(cmd)) => {
                assert_eq!(cmd.admin_email.as_deref(), Some("dev@example.com"));
                assert_eq!(cmd.admin_username.as_deref(), Some("dev"));
                assert!(cmd.admin_password.is_none());
            }
            _ => panic!("expected the install subcommand"),
        }
    }
}
