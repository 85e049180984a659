//! RFC 9457 problem details, served as `application/problem+json`.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const CONTENT_TYPE: &str = "application/problem+json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(description = "RFC 9457 problem details")]
pub struct Problem {
    /// URI naming the kind of problem.
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    /// Path of the request that failed.
    pub instance: String,
    /// Stable machine-readable code, e.g. `REAL_ESTATES_NOT_FOUND`.
    pub code: String,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".into(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
        }
    }

    /// Set `code` and derive `type` from it under `type_base`.
    pub fn with_code(mut self, type_base: &str, code: impl Into<String>) -> Self {
        self.code = code.into();
        self.type_url = format!("{type_base}/{}", self.code.to_lowercase());
        self
    }

    pub fn at(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut resp = (status, axum::Json(self)).into_response();
        resp.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_carries_status_and_problem_content_type() {
        let resp = Problem::new(StatusCode::CONFLICT, "Conflict", "cnpj taken").into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], CONTENT_TYPE);
    }

    #[test]
    fn code_sets_type_and_fields_use_rfc_names() {
        let p = Problem::new(StatusCode::NOT_FOUND, "Not found", "missing")
            .with_code("https://imobprime.org/errors", "REAL_ESTATES_NOT_FOUND")
            .at("/api/real-estates/9");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "https://imobprime.org/errors/real_estates_not_found");
        assert_eq!(json["status"], 404);
        assert_eq!(json["code"], "REAL_ESTATES_NOT_FOUND");
        assert_eq!(json["instance"], "/api/real-estates/9");
        assert!(json.get("type_url").is_none());
    }

    #[test]
    fn out_of_range_status_becomes_500() {
        let mut p = Problem::new(StatusCode::BAD_REQUEST, "Bad request", "x");
        p.status = 1000;
        assert_eq!(p.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
