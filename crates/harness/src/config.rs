// Runtime knobs for the lab, read from `UILAB_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::DEFAULT_TIMEOUT_MS;

/// Configuration consumed by [`crate::BrowserSession`] and [`crate::ApiClient`].
///
/// Every field has a compiled default so suites run with no environment at
/// all; variables only override.
#[derive(Debug, Clone)]
pub struct LabConfig {
    /// Run Chromium headless. `UILAB_HEADLESS=0` opens a visible window.
    pub headless: bool,
    /// Explicit browser binary (`UILAB_CHROME`); otherwise chromiumoxide
    /// falls back to its own detection.
    pub chrome: Option<PathBuf>,
    /// Login used by the authentication setup (`UILAB_EMAIL`).
    pub email: String,
    /// Password used by the authentication setup (`UILAB_PASSWORD`).
    pub password: String,
    /// Where the storage-state snapshot is written (`UILAB_STATE_FILE`).
    pub state_file: PathBuf,
    /// Locator and navigation timeout (`UILAB_TIMEOUT_MS`).
    pub timeout: Duration,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome: None,
            email: "lab@example.com".into(),
            password: "Welcome1".into(),
            state_file: PathBuf::from(".auth/user.json"),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl LabConfig {
    /// Builds the config from the environment, falling back to the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("UILAB_HEADLESS") {
            cfg.headless = v != "0" && !v.eq_ignore_ascii_case("false");
        }
        if let Ok(v) = env::var("UILAB_CHROME") {
            if !v.is_empty() {
                cfg.chrome = Some(PathBuf::from(v));
            }
        }
        if let Ok(v) = env::var("UILAB_EMAIL") {
            cfg.email = v;
        }
        if let Ok(v) = env::var("UILAB_PASSWORD") {
            cfg.password = v;
        }
        if let Ok(v) = env::var("UILAB_STATE_FILE") {
            cfg.state_file = PathBuf::from(v);
        }
        if let Ok(v) = env::var("UILAB_TIMEOUT_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                cfg.timeout = Duration::from_millis(ms);
            }
        }
        cfg
    }
}
