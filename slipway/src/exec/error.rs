use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to spawn `{command}`, error: {source}"))]
    Spawn { command: String, source: std::io::Error },

    #[snafu(display("Failed to write to stdin of `{command}`, error: {source}"))]
    WriteStdin { command: String, source: std::io::Error },

    #[snafu(display("Failed to read output of `{command}`, error: {source}"))]
    ReadOutput { command: String, source: std::io::Error },

    #[snafu(display("Command `{command}` failed: {stderr}"))]
    CommandFailed { command: String, stderr: String },
}
