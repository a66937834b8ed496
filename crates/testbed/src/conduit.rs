// The article app: a conduit-style front end at `/app` rendered client-side
// against the REST API under `/api`. Records live in memory only; every
// router() call starts from the same seed.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

const APP_HTML: &str = include_str!("assets/conduit.html");

const SEED_EMAIL: &str = "lab@example.com";
const SEED_PASSWORD: &str = "Welcome1";
const SEED_USERNAME: &str = "labuser";

#[derive(Debug, Clone)]
struct Article {
    slug: String,
    title: String,
    description: String,
    body: String,
    tag_list: Vec<String>,
    created_at: DateTime<Utc>,
    author: String,
}

impl Article {
    fn to_json(&self) -> Value {
        json!({
            "slug": self.slug,
            "title": self.title,
            "description": self.description,
            "body": self.body,
            "tagList": self.tag_list,
            "createdAt": self.created_at.to_rfc3339(),
            "updatedAt": self.created_at.to_rfc3339(),
            "favorited": false,
            "favoritesCount": 0,
            "author": {
                "username": self.author,
                "bio": Value::Null,
                "image": "",
                "following": false
            }
        })
    }
}

struct Store {
    articles: Vec<Article>,
    tags: Vec<String>,
    // token -> username, minted per login
    sessions: Vec<(String, String)>,
    next_token: u64,
}

impl Store {
    fn seeded() -> Self {
        let now = Utc::now();
        let articles = vec![
            Article {
                slug: "getting-started-with-browser-automation".into(),
                title: "Getting started with browser automation".into(),
                description: "Locators, waits and why flakiness happens".into(),
                body: "Resolve late, assert with retries.".into(),
                tag_list: vec!["automation".into(), "testing".into()],
                created_at: now,
                author: SEED_USERNAME.into(),
            },
            Article {
                slug: "page-objects-in-practice".into(),
                title: "Page objects in practice".into(),
                description: "One handle, named locators, fixed sequences".into(),
                body: "Keep the test body about intent.".into(),
                tag_list: vec!["patterns".into()],
                created_at: now,
                author: SEED_USERNAME.into(),
            },
            Article {
                slug: "mocking-the-network-layer".into(),
                title: "Mocking the network layer".into(),
                description: "Fulfill or rewrite, nothing in between".into(),
                body: "Intercept at the request stage.".into(),
                tag_list: vec!["mocking".into(), "automation".into()],
                created_at: now,
                author: SEED_USERNAME.into(),
            },
        ];
        Self {
            articles,
            tags: vec![
                "automation".into(),
                "testing".into(),
                "patterns".into(),
                "mocking".into(),
            ],
            sessions: Vec::new(),
            next_token: 1,
        }
    }

    fn mint_token(&mut self, username: &str) -> String {
        let token = format!("lab-token-{}", self.next_token);
        self.next_token += 1;
        self.sessions.push((token.clone(), username.to_string()));
        token
    }

    fn username_for(&self, token: &str) -> Option<&str> {
        self.sessions
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, u)| u.as_str())
    }

    fn unique_slug(&self, title: &str) -> String {
        let base = slugify(title);
        if !self.articles.iter().any(|a| a.slug == base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if !self.articles.iter().any(|a| a.slug == candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Lowercased title with every non-alphanumeric run collapsed to a dash.
fn slugify(title: &str) -> String {
    // The pattern is a literal; compilation cannot fail.
    let separators = Regex::new("[^a-z0-9]+").unwrap();
    let lowered = title.to_lowercase();
    separators
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

type AppState = Arc<Mutex<Store>>;

pub fn router() -> Router {
    let state: AppState = Arc::new(Mutex::new(Store::seeded()));
    Router::new()
        .route("/app", get(app_page))
        .route("/api/users/login", post(login))
        .route("/api/user", get(current_user))
        .route("/api/tags", get(tags))
        .route("/api/articles", get(list_articles).post(create_article))
        .route(
            "/api/articles/{slug}",
            get(get_article).delete(delete_article),
        )
        .with_state(state)
}

async fn app_page() -> Html<&'static str> {
    Html(APP_HTML)
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    user: LoginUser,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    email: String,
    password: String,
}

async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Response {
    if request.user.email != SEED_EMAIL || request.user.password != SEED_PASSWORD {
        debug!(target: "testbed", email = %request.user.email, "rejected login");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "errors": { "email or password": ["is invalid"] } })),
        )
            .into_response();
    }
    let token = state.lock().mint_token(SEED_USERNAME);
    info!(target: "testbed", email = %request.user.email, "login");
    Json(json!({
        "user": {
            "email": SEED_EMAIL,
            "token": token,
            "username": SEED_USERNAME,
            "bio": Value::Null,
            "image": ""
        }
    }))
    .into_response()
}

async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let store = state.lock();
    match bearer(&headers).and_then(|token| store.username_for(token)) {
        Some(username) => Json(json!({
            "user": {
                "email": SEED_EMAIL,
                "username": username,
                "bio": Value::Null,
                "image": ""
            }
        }))
        .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn tags(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "tags": state.lock().tags }))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn list_articles(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Json<Value> {
    let store = state.lock();
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);
    let page: Vec<Value> = store
        .articles
        .iter()
        .skip(offset)
        .take(limit)
        .map(Article::to_json)
        .collect();
    Json(json!({ "articles": page, "articlesCount": store.articles.len() }))
}

async fn get_article(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let store = state.lock();
    match store.articles.iter().find(|a| a.slug == slug) {
        Some(article) => Json(json!({ "article": article.to_json() })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    article: CreateArticle,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateArticle {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    tag_list: Vec<String>,
}

async fn create_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateRequest>,
) -> Response {
    let mut store = state.lock();
    let Some(author) = bearer(&headers)
        .and_then(|token| store.username_for(token))
        .map(str::to_string)
    else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let article = Article {
        slug: store.unique_slug(&request.article.title),
        title: request.article.title,
        description: request.article.description,
        body: request.article.body,
        tag_list: request.article.tag_list,
        created_at: Utc::now(),
        author,
    };
    let payload = article.to_json();
    info!(target: "testbed", slug = %article.slug, "article created");
    store.articles.insert(0, article);
    (StatusCode::CREATED, Json(json!({ "article": payload }))).into_response()
}

async fn delete_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Response {
    let mut store = state.lock();
    if bearer(&headers)
        .and_then(|token| store.username_for(token))
        .is_none()
    {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let before = store.articles.len();
    store.articles.retain(|a| a.slug != slug);
    if store.articles.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    info!(target: "testbed", %slug, "article deleted");
    StatusCode::NO_CONTENT.into_response()
}

/// Extracts the token from an `Authorization: Token <value>` header.
fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Token "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separator_runs() {
        assert_eq!(slugify("Browser automation is fun"), "browser-automation-is-fun");
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("Rust 2024"), "rust-2024");
    }

    #[test]
    fn unique_slug_appends_a_counter_on_collision() {
        let mut store = Store::seeded();
        let first = store.unique_slug("Page objects in practice");
        assert_eq!(first, "page-objects-in-practice-2");
        store.articles.push(Article {
            slug: first.clone(),
            title: "Page objects in practice".into(),
            description: String::new(),
            body: String::new(),
            tag_list: Vec::new(),
            created_at: Utc::now(),
            author: SEED_USERNAME.into(),
        });
        assert_eq!(
            store.unique_slug("Page objects in practice"),
            "page-objects-in-practice-3"
        );
    }

    #[test]
    fn tokens_are_minted_per_login_and_resolve_back() {
        let mut store = Store::seeded();
        let a = store.mint_token(SEED_USERNAME);
        let b = store.mint_token(SEED_USERNAME);
        assert_ne!(a, b);
        assert_eq!(store.username_for(&a), Some(SEED_USERNAME));
        assert_eq!(store.username_for("lab-token-999"), None);
    }

    #[test]
    fn article_json_uses_camel_case_fields() {
        let store = Store::seeded();
        let json = store.articles[0].to_json();
        assert!(json.get("tagList").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["favoritesCount"], 0);
        assert_eq!(json["author"]["username"], SEED_USERNAME);
    }
}
