//! The bundled single-page UI.

use axum::response::Html;
use axum::{Router, routing::get};

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// GET /
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Returns the router serving the web page.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}
