use clap::Args;

use crate::{cli::Error, config::Config, tunnel};

/// (Re)starts the local relay container without touching the rest of the
/// deployment; useful after a reboot, when the cluster is still running but
/// the tunnel is gone.
#[derive(Args, Clone)]
pub struct TunnelCommand {}

impl TunnelCommand {
    pub async fn run(self, config: Config) -> Result<(), Error> {
        let Self {} = self;

        tunnel::start(&config.cluster_name).await?;
        println!("Tunnel running; the deployment is reachable at {}", config.access_url);
        Ok(())
    }
}
