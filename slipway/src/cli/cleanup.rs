use clap::Args;

use crate::{cli::Error, config::Config, exec, session::SessionStore, tunnel};

/// Unconditional teardown of everything `install` created: the relay
/// container, the kind cluster, and the local session directory. Steps are
/// best-effort so a partially installed environment still cleans up.
#[derive(Args, Clone)]
pub struct CleanupCommand {}

impl CleanupCommand {
    pub async fn run(self, config: Config) -> Result<(), Error> {
        let Self {} = self;

        tunnel::stop().await;

        let cluster_name = &config.cluster_name;
        match exec::run("kind", &["delete", "cluster", "--name", cluster_name]).await {
            Ok(_stdout) => tracing::info!("Deleted kind cluster `{cluster_name}`"),
            Err(err) => tracing::warn!("Could not delete kind cluster `{cluster_name}`: {err}"),
        }

        let store = SessionStore::discover()?;
        store.clear()?;
        tracing::info!("Removed session directory {}", store.root().display());

        Ok(())
    }
}
