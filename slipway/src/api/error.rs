use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to build HTTP client, error: {source}"))]
    BuildClient { source: reqwest::Error },

    #[snafu(display("Failed to request {url}, error: {source}"))]
    Request { url: String, source: reqwest::Error },

    #[snafu(display("{url} answered with status {status}: {body}"))]
    Status { url: String, status: reqwest::StatusCode, body: String },

    #[snafu(display("Failed to decode response from {url}, error: {source}"))]
    Decode { url: String, source: reqwest::Error },

    #[snafu(display(
        "Deployment did not become ready after {attempts} attempts; \
         check `slipway diagnostics` for the current state"
    ))]
    NeverBecameReady { attempts: u32 },

    #[snafu(display("The first administrative account already exists"))]
    FirstUserExists,
}
