use clap::Args;

use crate::{cli::Error, config::Config, install::Installer};

/// Arguments for the `install` subcommand. The credential flags follow the
/// same override chain as the environment variables: explicit flag, then
/// `SLIPWAY_ADMIN_*`, then the configuration file.
#[derive(Args, Clone, Default)]
pub struct InstallCommand {
    #[arg(long = "admin-email", help = "Override the administrative account email.")]
    pub admin_email: Option<String>,

    #[arg(long = "admin-username", help = "Override the administrative account username.")]
    pub admin_username: Option<String>,

    #[arg(long = "admin-password", help = "Override the administrative account password.")]
    pub admin_password: Option<String>,
}

impl InstallCommand {
    pub async fn run(self, mut config: Config) -> Result<(), Error> {
        let Self { admin_email, admin_username, admin_password } = self;
        config.admin = config.admin.resolved(admin_email, admin_username, admin_password);

        Installer::new(config).run().await.map_err(Error::from)
    }
}
