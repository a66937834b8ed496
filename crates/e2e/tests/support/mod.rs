#![allow(dead_code)]

// Per-test fixture: one in-process testbed and one browser session. Nothing
// is shared between tests; the token file flow is exercised explicitly by
// the auth suite.

use testbed::ServerHandle;
use uilab::{ApiClient, BrowserSession, LabConfig, Page, StorageState};

pub struct Lab {
    pub server: ServerHandle,
    pub session: BrowserSession,
    pub config: LabConfig,
}

impl Lab {
    /// Spawns the testbed and launches an unauthenticated browser.
    pub async fn start() -> Self {
        uilab::init_tracing();
        let server = testbed::spawn().await.expect("Failed to spawn testbed");
        let config = LabConfig::from_env();
        let session = BrowserSession::launch(&config)
            .await
            .expect("Failed to launch browser");
        Self {
            server,
            session,
            config,
        }
    }

    /// Logs in over the REST API first, then launches a browser whose new
    /// documents carry the session token in local storage. Returns the lab
    /// and the token.
    pub async fn start_authenticated() -> (Self, String) {
        uilab::init_tracing();
        let server = testbed::spawn().await.expect("Failed to spawn testbed");
        let config = LabConfig::from_env();
        let api = ApiClient::new(server.url());
        let token = api
            .login(&config.email, &config.password)
            .await
            .expect("Failed to log in via API");
        let state = StorageState::single_origin(server.url(), "jwtToken", &token);
        let session = BrowserSession::launch_with_state(&config, Some(state))
            .await
            .expect("Failed to launch browser");
        (
            Self {
                server,
                session,
                config,
            },
            token,
        )
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    pub fn app_url(&self) -> String {
        format!("{}/app", self.server.url())
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.server.url())
    }

    /// Opens a tab on the component playground.
    pub async fn playground(&self) -> Page {
        self.session
            .new_page(&self.url())
            .await
            .expect("Failed to open the playground")
    }

    /// Opens a tab on the article app.
    pub async fn article_app(&self) -> Page {
        self.session
            .new_page(&self.app_url())
            .await
            .expect("Failed to open the article app")
    }

    pub async fn finish(self) {
        self.session
            .close()
            .await
            .expect("Failed to close the browser");
        self.server.shutdown();
    }
}
