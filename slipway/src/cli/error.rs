use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Install { source: crate::install::Error },

    #[snafu(display("{source}"))]
    Session { source: crate::session::Error },

    #[snafu(display("{source}"))]
    Command { source: crate::exec::Error },

    #[snafu(display("Could not create tokio runtime, error: {source}"))]
    InitializeTokioRuntime { source: std::io::Error },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<crate::install::Error> for Error {
    fn from(source: crate::install::Error) -> Self { Self::Install { source } }
}

impl From<crate::session::Error> for Error {
    fn from(source: crate::session::Error) -> Self { Self::Session { source } }
}

impl From<crate::exec::Error> for Error {
    fn from(source: crate::exec::Error) -> Self { Self::Command { source } }
}
