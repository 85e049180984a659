use axum::response::{Html, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
    timestamp: String,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

const DOCS_PAGE: &str = include_str!("docs.html");

/// Stoplight Elements pointed at `/openapi.json`.
pub async fn docs() -> Html<&'static str> {
    Html(DOCS_PAGE)
}
