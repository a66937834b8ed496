// One browser tab: navigation, locator construction, dialog and network
// watchers, route installation, screenshots.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chromiumoxide::Page as CdpPage;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
    ReloadParams,
};
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::locator::Locator;
use crate::route::{RouteAction, RouteTable, UrlPattern};

const WATCHER_POLL: Duration = Duration::from_millis(100);

/// A tab. Cheap to clone; clones share the underlying CDP target and any
/// installed routes.
#[derive(Clone)]
pub struct Page {
    pub(crate) inner: CdpPage,
    routes: Arc<RouteTable>,
}

impl Page {
    pub(crate) fn new(inner: CdpPage) -> Self {
        Self {
            inner,
            routes: Arc::new(RouteTable::new()),
        }
    }

    /// Navigates and waits for the load to settle.
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!(target: "uilab", url, "goto");
        self.inner.goto(url).await.map_err(|e| Error::Navigation {
            url: url.into(),
            reason: e.to_string(),
        })?;
        self.inner
            .wait_for_navigation()
            .await
            .map_err(|e| Error::Navigation {
                url: url.into(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    pub async fn reload(&self) -> Result<()> {
        self.inner.execute(ReloadParams::default()).await?;
        self.inner.wait_for_navigation().await?;
        Ok(())
    }

    pub async fn title(&self) -> Result<String> {
        Ok(self.inner.get_title().await?.unwrap_or_default())
    }

    pub async fn url(&self) -> Result<String> {
        Ok(self.inner.url().await?.unwrap_or_default())
    }

    /// Deferred reference to the elements matching a CSS selector.
    pub fn locator(&self, selector: impl Into<String>) -> Locator {
        Locator::new(self.clone(), selector.into())
    }

    /// Element carrying `data-testid="id"`.
    pub fn get_by_test_id(&self, id: &str) -> Locator {
        self.locator(format!("[data-testid=\"{id}\"]"))
    }

    pub fn get_by_placeholder(&self, text: &str) -> Locator {
        self.locator(format!("[placeholder=\"{text}\"]"))
    }

    pub fn get_by_title(&self, text: &str) -> Locator {
        self.locator(format!("[title=\"{text}\"]"))
    }

    /// Role-based lookup; `name` filters by the element's visible text.
    pub fn get_by_role(&self, role: Role, name: Option<&str>) -> Locator {
        let locator = self.locator(role.css());
        match name {
            Some(text) => locator.filter_text(text),
            None => locator,
        }
    }

    /// Evaluates a script and deserializes its completion value.
    pub async fn evaluate<T: DeserializeOwned>(&self, script: impl Into<String>) -> Result<T> {
        Ok(self.inner.evaluate(script.into()).await?.into_value::<T>()?)
    }

    /// Evaluates a script for its effect only.
    pub async fn evaluate_unit(&self, script: impl Into<String>) -> Result<()> {
        self.inner.evaluate(script.into()).await?;
        Ok(())
    }

    /// Starts answering JavaScript dialogs (`accept` picks OK vs Cancel) and
    /// recording their messages. Install before triggering the dialog.
    pub async fn watch_dialogs(&self, accept: bool) -> Result<DialogWatcher> {
        let mut events = self
            .inner
            .event_listener::<EventJavascriptDialogOpening>()
            .await?;
        let cdp = self.inner.clone();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let task = tokio::spawn(async move {
            while let Some(dialog) = events.next().await {
                debug!(target: "uilab", message = %dialog.message, accept, "javascript dialog");
                sink.lock().push(dialog.message.clone());
                let params = HandleJavaScriptDialogParams {
                    accept,
                    prompt_text: None,
                };
                if let Err(error) = cdp.execute(params).await {
                    warn!(target: "uilab", %error, "failed to answer dialog");
                }
            }
        });
        Ok(DialogWatcher { messages, task })
    }

    /// Begins watching for a response whose URL matches the glob `pattern`,
    /// capturing its status and JSON body. Install before the triggering
    /// action, then [`ResponseCapture::wait`] for the result.
    pub async fn capture_response(&self, pattern: &str) -> Result<ResponseCapture> {
        let pattern = UrlPattern::new(pattern)?;
        self.inner.execute(network::EnableParams::default()).await?;
        let mut events = self.inner.event_listener::<EventResponseReceived>().await?;
        let cdp = self.inner.clone();
        let slot: Arc<Mutex<Option<CapturedResponse>>> = Arc::new(Mutex::new(None));
        let out = Arc::clone(&slot);
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if !pattern.matches(&event.response.url) {
                    continue;
                }
                // The body becomes fetchable only once loading finishes.
                let mut body = None;
                for _ in 0..100 {
                    let params = network::GetResponseBodyParams {
                        request_id: event.request_id.clone(),
                    };
                    match cdp.execute(params).await {
                        Ok(resp) => {
                            body = if resp.result.base64_encoded {
                                BASE64
                                    .decode(&resp.result.body)
                                    .ok()
                                    .and_then(|raw| serde_json::from_slice::<Value>(&raw).ok())
                            } else {
                                serde_json::from_str::<Value>(&resp.result.body).ok()
                            };
                            break;
                        }
                        Err(_) => tokio::time::sleep(Duration::from_millis(50)).await,
                    }
                }
                let Some(body) = body else { continue };
                debug!(target: "uilab", url = %event.response.url, status = event.response.status, "response captured");
                *out.lock() = Some(CapturedResponse {
                    url: event.response.url.clone(),
                    status: event.response.status,
                    body,
                });
                break;
            }
        });
        Ok(ResponseCapture { slot, task })
    }

    /// Intercepts requests matching the glob `pattern` and fulfills them with
    /// `body` (HTTP 200, `application/json`). The request never reaches the
    /// network.
    pub async fn route_json(&self, pattern: &str, body: Value) -> Result<()> {
        self.routes
            .add(UrlPattern::new(pattern)?, RouteAction::fulfill(200, body));
        self.routes.arm(&self.inner).await
    }

    /// Same as [`Page::route_json`] with an explicit status code.
    pub async fn route_fulfill(&self, pattern: &str, status: i64, body: Value) -> Result<()> {
        self.routes
            .add(UrlPattern::new(pattern)?, RouteAction::fulfill(status, body));
        self.routes.arm(&self.inner).await
    }

    /// Lets matching requests hit the network, then substitutes the response
    /// body with `transform(original)` before the page observes it.
    pub async fn route_transform<F>(&self, pattern: &str, transform: F) -> Result<()>
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.routes
            .add(UrlPattern::new(pattern)?, RouteAction::transform(transform));
        self.routes.arm(&self.inner).await
    }

    /// Writes a PNG of the page to `path`, creating parent directories.
    pub async fn screenshot_to(&self, path: impl AsRef<Path>, full_page: bool) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        let bytes = self.inner.screenshot(params).await?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub(crate) async fn mouse_move(&self, x: f64, y: f64, dragging: bool) -> Result<()> {
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(x)
            .y(y);
        if dragging {
            builder = builder.button(MouseButton::Left);
        }
        let params = builder.build().map_err(Error::Params)?;
        self.inner.execute(params).await?;
        Ok(())
    }

    pub(crate) async fn mouse_press(&self, x: f64, y: f64) -> Result<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MousePressed)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(Error::Params)?;
        self.inner.execute(params).await?;
        Ok(())
    }

    pub(crate) async fn mouse_release(&self, x: f64, y: f64) -> Result<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseReleased)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(Error::Params)?;
        self.inner.execute(params).await?;
        Ok(())
    }
}

/// ARIA-flavored roles mapped onto plain CSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Button,
    Checkbox,
    Link,
    List,
    ListItem,
    Radio,
    Row,
    Textbox,
}

impl Role {
    fn css(self) -> &'static str {
        match self {
            Role::Button => "button, [role=\"button\"]",
            Role::Checkbox => "input[type=\"checkbox\"]",
            Role::Link => "a[href], [role=\"link\"]",
            Role::List => "ul, ol, [role=\"list\"]",
            Role::ListItem => "li, [role=\"listitem\"]",
            Role::Radio => "input[type=\"radio\"]",
            Role::Row => "tr, [role=\"row\"]",
            Role::Textbox => "input:not([type]), input[type=\"text\"], input[type=\"email\"], input[type=\"password\"], textarea",
        }
    }
}

/// Records dialog messages while auto-answering them.
pub struct DialogWatcher {
    messages: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl DialogWatcher {
    /// Messages observed so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Waits until at least one dialog has been answered and returns its
    /// message.
    pub async fn wait_for_message(&self, timeout: Duration) -> Result<String> {
        let start = Instant::now();
        loop {
            if let Some(message) = self.messages.lock().first().cloned() {
                return Ok(message);
            }
            if start.elapsed() >= timeout {
                return Err(Error::WaitTimeout {
                    subject: "a javascript dialog".into(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(WATCHER_POLL).await;
        }
    }
}

impl Drop for DialogWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Handle to a pending [`Page::capture_response`].
pub struct ResponseCapture {
    slot: Arc<Mutex<Option<CapturedResponse>>>,
    task: JoinHandle<()>,
}

/// A captured response: final URL, status, parsed JSON body.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub url: String,
    pub status: i64,
    pub body: Value,
}

impl ResponseCapture {
    pub async fn wait(&self, timeout: Duration) -> Result<CapturedResponse> {
        let start = Instant::now();
        loop {
            if let Some(captured) = self.slot.lock().clone() {
                return Ok(captured);
            }
            if start.elapsed() >= timeout {
                return Err(Error::WaitTimeout {
                    subject: "a matching response".into(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(WATCHER_POLL).await;
        }
    }
}

impl Drop for ResponseCapture {
    fn drop(&mut self) {
        self.task.abort();
    }
}
