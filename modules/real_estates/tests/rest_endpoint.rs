use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use real_estates::contract::{
    client::RealEstateService,
    error::RealEstatesError,
    model::{FilterCriteria, RealEstate},
};

/// Canned answers plus a journal of what the handlers asked for.
#[derive(Default)]
struct MockService {
    rows: Vec<RealEstate>,
    change_flag: bool,
    fail_with: Option<RealEstatesError>,
    criteria: Mutex<Vec<FilterCriteria>>,
    saved: Mutex<Vec<RealEstate>>,
}

impl MockService {
    fn check(&self) -> Result<(), RealEstatesError> {
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RealEstateService for MockService {
    async fn find_all(&self) -> Result<Vec<RealEstate>, RealEstatesError> {
        self.check()?;
        Ok(self.rows.clone())
    }

    async fn find_all_by(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<RealEstate>, RealEstatesError> {
        self.check()?;
        self.criteria.lock().push(criteria.clone());
        Ok(self.rows.clone())
    }

    async fn find_by_id(&self, id: i32) -> Result<RealEstate, RealEstatesError> {
        self.check()?;
        self.rows
            .iter()
            .find(|r| r.id == Some(id))
            .cloned()
            .ok_or_else(|| RealEstatesError::not_found(id))
    }

    async fn save(&self, real_estate: RealEstate) -> Result<RealEstate, RealEstatesError> {
        self.check()?;
        self.saved.lock().push(real_estate.clone());
        Ok(RealEstate {
            id: Some(7),
            ..real_estate
        })
    }

    async fn update(&self, _real_estate: RealEstate) -> Result<bool, RealEstatesError> {
        self.check()?;
        Ok(self.change_flag)
    }

    async fn delete_by_id(&self, _id: i32) -> Result<bool, RealEstatesError> {
        self.check()?;
        Ok(self.change_flag)
    }
}

struct NoopRegistry;

impl modkit::api::OpenApiRegistry for NoopRegistry {
    fn add_operation(&self, _op: &modkit::api::OperationSpec) {}

    fn add_schemas(&self, root: &str, _schemas: modkit::api::SchemaList) -> String {
        root.to_string()
    }
}

fn router_for(service: Arc<MockService>) -> Router {
    real_estates::api::rest::routes::register_routes(
        Router::new(),
        &NoopRegistry,
        service,
        "http://localhost:3000",
    )
    .unwrap()
}

fn sample(id: i32) -> RealEstate {
    RealEstate {
        id: Some(id),
        name: format!("Agency {id}"),
        cnpj: format!("{id:02}.000"),
        state_id: Some(5),
        city_id: None,
        address_zip_code: Some("01001-000".into()),
    }
}

async fn call(router: Router, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, body.to_vec())
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn list_all_returns_no_content_when_empty() {
    let router = router_for(Arc::new(MockService::default()));
    let (status, _, body) = call(router, request(Method::GET, "/api/real-estates", None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn list_all_returns_every_row() {
    let service = Arc::new(MockService {
        rows: vec![sample(1), sample(2)],
        ..Default::default()
    });
    let (status, _, body) = call(
        router_for(service),
        request(Method::GET, "/api/real-estates", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["cnpj"], "01.000");
    assert_eq!(list[1]["addressZipCode"], "01001-000");
    assert!(list[0].get("cityId").is_none());
}

#[tokio::test]
async fn filter_passes_all_four_keys_to_the_service() {
    let service = Arc::new(MockService::default());
    let router = router_for(service.clone());

    let (status, _, _) = call(
        router.clone(),
        request(Method::GET, "/api/real-estates/filter?name=acme&cnpj=", None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = call(
        router,
        request(
            Method::GET,
            "/api/real-estates/filter?name=&cnpj=12&stateId=5&cityId=",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let seen = service.criteria.lock();
    assert_eq!(seen.len(), 2);

    assert_eq!(seen[0].len(), 4);
    assert_eq!(seen[0].get("name"), Some("acme"));
    assert_eq!(seen[0].get("cnpj"), Some(""));
    assert_eq!(seen[0].get("stateId"), Some(""));
    assert_eq!(seen[0].get("cityId"), Some(""));

    assert_eq!(seen[1].get("cnpj"), Some("12"));
    assert_eq!(seen[1].get("stateId"), Some("5"));
    assert_eq!(seen[1].get("cityId"), Some(""));
}

#[tokio::test]
async fn filter_returns_rows_with_ok() {
    let service = Arc::new(MockService {
        rows: vec![sample(3)],
        ..Default::default()
    });
    let (status, _, body) = call(
        router_for(service),
        request(Method::GET, "/api/real-estates/filter?name=&cnpj=", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(list[0]["id"], 3);
}

#[tokio::test]
async fn get_by_id_found_and_missing() {
    let service = Arc::new(MockService {
        rows: vec![sample(4)],
        ..Default::default()
    });
    let router = router_for(service);

    let (status, _, body) = call(
        router.clone(),
        request(Method::GET, "/api/real-estates/4", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let found: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(found["name"], "Agency 4");

    let (status, content_type, body) =
        call(router, request(Method::GET, "/api/real-estates/5", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(content_type.as_deref(), Some("application/problem+json"));
    let problem: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(problem["status"], 404);
    assert_eq!(problem["code"], "REAL_ESTATES_NOT_FOUND");
}

#[tokio::test]
async fn get_by_id_rejects_non_numeric_id() {
    let router = router_for(Arc::new(MockService::default()));
    let (status, _, _) = call(router, request(Method::GET, "/api/real-estates/abc", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_masks_zip_code_and_returns_ok() {
    let service = Arc::new(MockService::default());
    let (status, _, body) = call(
        router_for(service.clone()),
        request(
            Method::POST,
            "/api/real-estates",
            Some(json!({ "name": "Acme", "cnpj": "123", "addressZipCode": "99999" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(created["id"], 7);
    assert!(created["addressZipCode"].is_null());

    // The service still received the zip code.
    let saved = service.saved.lock();
    assert_eq!(saved[0].address_zip_code.as_deref(), Some("99999"));
}

#[tokio::test]
async fn create_response_body_is_exact() {
    let (status, _, body) = call(
        router_for(Arc::new(MockService::default())),
        request(
            Method::POST,
            "/api/real-estates",
            Some(json!({ "name": "Acme", "cnpj": "123", "addressZipCode": "99999" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        r#"{"id":7,"name":"Acme","cnpj":"123","addressZipCode":null}"#
    );
}

#[tokio::test]
async fn update_and_delete_answer_no_content_whatever_the_flag() {
    for change_flag in [true, false] {
        let service = Arc::new(MockService {
            change_flag,
            ..Default::default()
        });
        let router = router_for(service);

        let (status, _, body) = call(
            router.clone(),
            request(
                Method::PUT,
                "/api/real-estates",
                Some(json!({ "id": 1, "name": "Acme", "cnpj": "123" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _, _) = call(router, request(Method::DELETE, "/api/real-estates/1", None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn service_errors_become_problems() {
    let cases = [
        (RealEstatesError::validation("Name must not be empty"), StatusCode::BAD_REQUEST),
        (RealEstatesError::conflict("123"), StatusCode::CONFLICT),
        (RealEstatesError::internal(), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (error, expected) in cases {
        let service = Arc::new(MockService {
            fail_with: Some(error),
            ..Default::default()
        });
        let (status, content_type, _) = call(
            router_for(service),
            request(
                Method::POST,
                "/api/real-estates",
                Some(json!({ "name": "", "cnpj": "123" })),
            ),
        )
        .await;
        assert_eq!(status, expected);
        assert_eq!(content_type.as_deref(), Some("application/problem+json"));
    }
}

#[tokio::test]
async fn malformed_json_body_is_rejected() {
    let router = router_for(Arc::new(MockService::default()));
    let bad = Request::builder()
        .method(Method::POST)
        .uri("/api/real-estates")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, _, _) = call(router, bad).await;
    assert!(status.is_client_error());
}
