// The component playground: one static page with the sidebar menu, form
// layouts, datepickers, toastr, tooltips, the smart table and the dashboard
// widgets. All behavior is inline script; the server only hands the page out.

use axum::Router;
use axum::response::Html;
use axum::routing::get;

const PAGE: &str = include_str!("assets/playground.html");

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(PAGE)
}
