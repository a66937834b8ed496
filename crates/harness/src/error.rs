// Error type shared by the whole harness.
//
// There is no recovery anywhere in the lab: every variant propagates out of
// the failing test via `?`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Chromium could not be started with the assembled configuration.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// Any failure surfaced by the DevTools protocol layer.
    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    /// Protocol parameters could not be assembled.
    #[error("invalid protocol parameters: {0}")]
    Params(String),

    #[error("navigation to '{url}' failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A locator or watcher did not produce a match in time.
    #[error("timed out after {timeout_ms}ms waiting for {subject}")]
    WaitTimeout { subject: String, timeout_ms: u64 },

    /// An `expect(...)` condition never held within its timeout.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// Script evaluated in the page threw.
    #[error("page script failed: {0}")]
    Script(String),

    /// A URL glob or text regex did not parse.
    #[error("invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// An intercepted body could not be decoded.
    #[error("failed to decode intercepted body: {0}")]
    Decode(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The REST API answered with a status the caller did not expect.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
