use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Could not determine the platform configuration directory"))]
    NoConfigDirectory,

    #[snafu(display("Failed to create session directory {}, error: {source}", path.display()))]
    CreateDirectory { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to write {}, error: {source}", path.display()))]
    WriteFile { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to read {}, error: {source}", path.display()))]
    ReadFile { path: PathBuf, source: std::io::Error },

    #[snafu(display("Session file {} is empty; run `slipway install` first", path.display()))]
    EmptySession { path: PathBuf },

    #[snafu(display("Failed to remove session directory {}, error: {source}", path.display()))]
    RemoveDirectory { path: PathBuf, source: std::io::Error },
}
