// Route interception over the CDP fetch domain.
//
// Two rule kinds: fulfill a matching request with a caller-supplied JSON
// body before it leaves the browser, or let it hit the network and rewrite
// the response body before the page sees it. Everything else is continued
// untouched.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chromiumoxide::Page as CdpPage;
use chromiumoxide::cdp::browser_protocol::fetch::{
    self, ContinueRequestParams, ContinueResponseParams, EventRequestPaused,
    FulfillRequestParams, HeaderEntry, RequestId, RequestPattern, RequestStage,
};
use futures::StreamExt;
use glob::Pattern;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// URL glob. `*` matches any run of characters (separators included), so
/// `**/api/tags` matches that path on any origin and `**/api/articles*`
/// also covers query strings.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    raw: String,
    pattern: Pattern,
}

impl UrlPattern {
    pub fn new(raw: &str) -> Result<Self> {
        let pattern = Pattern::new(raw).map_err(|e| Error::Pattern {
            pattern: raw.into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: raw.into(),
            pattern,
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        self.pattern.matches(url)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// What to do with a matched request.
#[derive(Clone)]
pub(crate) enum RouteAction {
    Fulfill { status: i64, body: Value },
    Transform(TransformFn),
}

impl RouteAction {
    pub(crate) fn fulfill(status: i64, body: Value) -> Self {
        Self::Fulfill { status, body }
    }

    pub(crate) fn transform<F>(transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::Transform(Arc::new(transform))
    }
}

struct Rule {
    pattern: UrlPattern,
    action: RouteAction,
}

/// Per-page rule table; armed lazily when the first rule is installed.
pub(crate) struct RouteTable {
    rules: Mutex<Vec<Rule>>,
    armed: Mutex<bool>,
}

impl RouteTable {
    pub(crate) fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            armed: Mutex::new(false),
        }
    }

    pub(crate) fn add(&self, pattern: UrlPattern, action: RouteAction) {
        debug!(target: "uilab.route", pattern = pattern.as_str(), "route installed");
        self.rules.lock().push(Rule { pattern, action });
    }

    /// Enables fetch interception for the page and spawns the dispatcher.
    /// Idempotent; later rule additions reuse the running dispatcher.
    pub(crate) async fn arm(self: &Arc<Self>, page: &CdpPage) -> Result<()> {
        if *self.armed.lock() {
            return Ok(());
        }

        // Subscribe before enabling so no paused request slips past the
        // dispatcher; an unanswered pause stalls the page load.
        let mut events = page.event_listener::<EventRequestPaused>().await?;
        let patterns = vec![
            RequestPattern {
                url_pattern: Some("*".into()),
                resource_type: None,
                request_stage: Some(RequestStage::Request),
            },
            RequestPattern {
                url_pattern: Some("*".into()),
                resource_type: None,
                request_stage: Some(RequestStage::Response),
            },
        ];
        page.execute(fetch::EnableParams {
            patterns: Some(patterns),
            handle_auth_requests: None,
        })
        .await?;
        // Marked only once interception is live; a failed enable leaves the
        // table disarmed so the next install retries.
        *self.armed.lock() = true;

        let table = Arc::clone(self);
        let cdp = page.clone();
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(error) = table.dispatch(&cdp, &event).await {
                    warn!(
                        target: "uilab.route",
                        %error,
                        url = %event.request.url,
                        "interception failed"
                    );
                }
            }
        });
        Ok(())
    }

    async fn dispatch(&self, cdp: &CdpPage, event: &EventRequestPaused) -> Result<()> {
        // Requests pause once before the network and once with the response
        // attached; the status code tells the stages apart.
        let at_response = event.response_status_code.is_some();
        let action = {
            let rules = self.rules.lock();
            rules
                .iter()
                .find(|rule| rule.pattern.matches(&event.request.url))
                .map(|rule| rule.action.clone())
        };

        match (action, at_response) {
            (Some(RouteAction::Fulfill { status, body }), false) => {
                debug!(target: "uilab.route", url = %event.request.url, status, "fulfilling");
                self.fulfill(cdp, &event.request_id, status, &body).await
            }
            (Some(RouteAction::Transform(transform)), true) => {
                let params = fetch::GetResponseBodyParams {
                    request_id: event.request_id.clone(),
                };
                let resp = cdp.execute(params).await?;
                let raw: Vec<u8> = if resp.result.base64_encoded {
                    BASE64
                        .decode(&resp.result.body)
                        .map_err(|e| Error::Decode(e.to_string()))?
                } else {
                    resp.result.body.clone().into_bytes()
                };
                let original: Value = serde_json::from_slice(&raw)?;
                let replaced = transform(original);
                let status = event.response_status_code.unwrap_or(200);
                debug!(target: "uilab.route", url = %event.request.url, status, "rewriting response");
                self.fulfill(cdp, &event.request_id, status, &replaced).await
            }
            (_, true) => {
                let params = ContinueResponseParams::builder()
                    .request_id(event.request_id.clone())
                    .build()
                    .map_err(Error::Params)?;
                cdp.execute(params).await?;
                Ok(())
            }
            (_, false) => {
                let params = ContinueRequestParams::builder()
                    .request_id(event.request_id.clone())
                    .build()
                    .map_err(Error::Params)?;
                cdp.execute(params).await?;
                Ok(())
            }
        }
    }

    async fn fulfill(
        &self,
        cdp: &CdpPage,
        request_id: &RequestId,
        status: i64,
        body: &Value,
    ) -> Result<()> {
        let encoded = BASE64.encode(serde_json::to_vec(body)?);
        let params = FulfillRequestParams::builder()
            .request_id(request_id.clone())
            .response_code(status)
            .response_headers(vec![HeaderEntry {
                name: "content-type".into(),
                value: "application/json".into(),
            }])
            .body(encoded)
            .build()
            .map_err(Error::Params)?;
        cdp.execute(params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_any_origin_prefix() {
        let pattern = UrlPattern::new("**/api/tags").expect("valid pattern");
        assert!(pattern.matches("http://127.0.0.1:4200/api/tags"));
        assert!(pattern.matches("https://demo.example/api/tags"));
        assert!(!pattern.matches("http://127.0.0.1:4200/api/articles"));
    }

    #[test]
    fn trailing_star_covers_query_strings() {
        let pattern = UrlPattern::new("**/api/articles*").expect("valid pattern");
        assert!(pattern.matches("http://127.0.0.1:4200/api/articles"));
        assert!(pattern.matches("http://127.0.0.1:4200/api/articles?limit=10&offset=0"));
        assert!(pattern.matches("http://127.0.0.1:4200/api/articles/some-slug"));
        assert!(!pattern.matches("http://127.0.0.1:4200/api/tags"));
    }

    #[test]
    fn exact_pattern_requires_exact_url() {
        let pattern = UrlPattern::new("http://127.0.0.1:4200/api/tags").expect("valid pattern");
        assert!(pattern.matches("http://127.0.0.1:4200/api/tags"));
        assert!(!pattern.matches("http://127.0.0.1:4200/api/tags?x=1"));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = UrlPattern::new("**/api/[tags").expect_err("unclosed class");
        assert!(matches!(err, Error::Pattern { .. }));
    }

    #[test]
    fn a_fresh_table_starts_disarmed() {
        let table = RouteTable::new();
        assert!(!*table.armed.lock());
        table.add(
            UrlPattern::new("**/api/tags").expect("valid"),
            RouteAction::fulfill(200, serde_json::json!({"tags": []})),
        );
        // Installing rules alone must not flip the flag; only a successful
        // enable does.
        assert!(!*table.armed.lock());
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = RouteTable::new();
        table.add(
            UrlPattern::new("**/api/tags").expect("valid"),
            RouteAction::fulfill(200, serde_json::json!({"tags": ["first"]})),
        );
        table.add(
            UrlPattern::new("**/api/*").expect("valid"),
            RouteAction::fulfill(200, serde_json::json!({"tags": ["second"]})),
        );
        let rules = table.rules.lock();
        let hit = rules
            .iter()
            .find(|rule| rule.pattern.matches("http://x/api/tags"))
            .expect("a rule matches");
        match &hit.action {
            RouteAction::Fulfill { body, .. } => {
                assert_eq!(body["tags"][0], "first");
            }
            RouteAction::Transform(_) => panic!("expected fulfill rule"),
        }
    }
}
