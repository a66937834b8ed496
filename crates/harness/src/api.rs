// Direct REST access to the article API, next to (not through) the browser.
//
// The setup step logs in here and persists the token; the mocking suite uses
// the same client to create and delete articles around its UI steps.

use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Fields of a new article, serialized as the API's `{"article": {...}}`
/// envelope by [`ApiClient::create_article`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
}

impl ArticleDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        body: impl Into<String>,
        tags: &[&str],
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            body: body.into(),
            tag_list: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

/// Thin client over the demo REST API.
///
/// Every method is one request; an unexpected status is an error, nothing
/// retries.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the API origin without a trailing slash, e.g.
    /// `http://127.0.0.1:4200`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Logs in and returns the session token from the response body.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let url = format!("{}/api/users/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "user": { "email": email, "password": password } }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        let body: Value = response.json().await?;
        let token = body["user"]["token"]
            .as_str()
            .ok_or_else(|| Error::Decode("login response carries no user.token".into()))?
            .to_string();
        info!(target: "uilab", email, "logged in via API");
        Ok(token)
    }

    /// `GET /api/tags`, returned as the raw `{"tags": [...]}` body.
    pub async fn tags(&self) -> Result<Value> {
        self.get_json(format!("{}/api/tags", self.base_url)).await
    }

    /// `GET /api/articles?limit=N&offset=N`.
    pub async fn articles(&self, limit: usize, offset: usize) -> Result<Value> {
        self.get_json(format!(
            "{}/api/articles?limit={limit}&offset={offset}",
            self.base_url
        ))
        .await
    }

    /// Creates an article; anything but HTTP 201 is an error. Returns the
    /// slug the server minted for it.
    pub async fn create_article(&self, token: &str, draft: &ArticleDraft) -> Result<String> {
        let url = format!("{}/api/articles", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {token}"))
            .json(&json!({ "article": draft }))
            .send()
            .await?;
        let status = response.status();
        if status.as_u16() != 201 {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        let body: Value = response.json().await?;
        let slug = body["article"]["slug"]
            .as_str()
            .ok_or_else(|| Error::Decode("created article carries no slug".into()))?
            .to_string();
        debug!(target: "uilab", slug, "article created via API");
        Ok(slug)
    }

    /// Deletes an article by slug; anything but HTTP 204 is an error.
    pub async fn delete_article(&self, token: &str, slug: &str) -> Result<()> {
        let url = format!("{}/api/articles/{slug}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("Token {token}"))
            .send()
            .await?;
        let status = response.status();
        if status.as_u16() != 204 {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        debug!(target: "uilab", slug, "article deleted via API");
        Ok(())
    }

    async fn get_json(&self, url: String) -> Result<Value> {
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }
}
