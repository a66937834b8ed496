// uilab: thin browser-automation layer for the lab's end-to-end suites.
//
// Wraps chromiumoxide with the locator / expectation / route surface the
// test suites consume. Waiting is one shared polling model; nothing here
// retries beyond it.

pub mod api;
pub mod assertions;
pub mod config;
pub mod error;
pub mod locator;
pub mod page;
pub mod route;
pub mod session;
pub mod storage;

/// Default timeout in milliseconds for locator resolution and navigation.
///
/// Assertions use their own, shorter default (see [`assertions`]).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub use api::{ApiClient, ArticleDraft};
pub use assertions::{Expectation, expect};
pub use config::LabConfig;
pub use error::{Error, Result};
pub use locator::{Locator, SelectOption};
pub use page::{DialogWatcher, Page, ResponseCapture, Role};
pub use session::BrowserSession;
pub use storage::{LocalStorageEntry, OriginState, StorageState};

/// Installs the fmt subscriber with `RUST_LOG` filtering, once per process.
///
/// Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
