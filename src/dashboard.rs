//! Embedded operator dashboard. A single static page that drives the JSON API.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("dashboard/index.html");

/// `GET /`: serve the dashboard.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
