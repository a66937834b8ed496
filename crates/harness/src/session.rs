// Browser session lifecycle: launch Chromium, pump the CDP event loop on a
// background task, hand out pages.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::LabConfig;
use crate::error::{Error, Result};
use crate::page::Page;
use crate::storage::StorageState;

/// A launched Chromium plus the task driving its event handler.
///
/// Dropping the session tears the temporary profile directory down; call
/// [`BrowserSession::close`] first so the browser exits cleanly.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    storage_state: Option<StorageState>,
    // Owns the throwaway user-data dir for the lifetime of the browser.
    _profile: tempfile::TempDir,
}

impl BrowserSession {
    /// Launches a browser with no pre-seeded session state.
    pub async fn launch(config: &LabConfig) -> Result<Self> {
        Self::launch_with_state(config, None).await
    }

    /// Launches a browser that applies `state` to every new document before
    /// page scripts run. This is how the authentication snapshot written by
    /// the setup step is consumed at context creation.
    pub async fn launch_with_state(
        config: &LabConfig,
        state: Option<StorageState>,
    ) -> Result<Self> {
        let profile = tempfile::tempdir()?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1280, 720)
            .user_data_dir(profile.path())
            .request_timeout(config.timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");
        if config.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        if let Some(chrome) = &config.chrome {
            builder = builder.chrome_executable(chrome);
        }
        let browser_config = builder.build().map_err(Error::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(error) = event {
                    warn!(target: "uilab.session", %error, "event loop stopped");
                    break;
                }
            }
        });
        info!(target: "uilab.session", headless = config.headless, "browser launched");

        Ok(Self {
            browser,
            handler_task,
            storage_state: state,
            _profile: profile,
        })
    }

    /// Opens a tab, seeds storage state when the session carries one, and
    /// navigates to `url`.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        let cdp_page = self.browser.new_page("about:blank").await?;
        if let Some(state) = &self.storage_state {
            let params = AddScriptToEvaluateOnNewDocumentParams::builder()
                .source(state.seed_script())
                .build()
                .map_err(Error::Params)?;
            cdp_page.execute(params).await?;
            debug!(target: "uilab.session", "storage state armed for new documents");
        }
        let page = Page::new(cdp_page);
        page.goto(url).await?;
        Ok(page)
    }

    /// Closes the browser and stops the event-loop task.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        self.handler_task.abort();
        debug!(target: "uilab.session", "browser closed");
        Ok(())
    }
}
