//! Route registration paired with its OpenAPI description.
//!
//! An [`OperationBuilder`] collects the documentation of one HTTP operation
//! together with its axum handler. `register` only exists once both a handler
//! and a response are known, so nothing reaches the router undocumented.

use std::marker::PhantomData;

use axum::{handler::Handler, routing::MethodRouter, Router};
use http::Method;
use utoipa::openapi::{schema::Schema, RefOr};
use utoipa::PartialSchema;

use crate::api::problem::Problem;

/// Named component schemas, root first.
pub type SchemaList = Vec<(String, RefOr<Schema>)>;

pub mod state {
    /// The builder still lacks this part.
    #[derive(Debug, Clone, Copy)]
    pub struct Missing;

    /// The builder has this part.
    #[derive(Debug, Clone, Copy)]
    pub struct Present;
}

pub use state::{Missing, Present};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Integer,
    String,
}

impl ParamKind {
    pub fn json_type(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String => "string",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
}

/// Required JSON request body.
#[derive(Clone, Debug)]
pub struct BodySpec {
    pub schema: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseBody {
    Empty,
    /// `schema: None` documents an untyped JSON object.
    Json { schema: Option<String>, array: bool },
    Problem { schema: String },
}

#[derive(Clone, Debug)]
pub struct ResponseSpec {
    pub status: u16,
    pub description: String,
    pub body: ResponseBody,
}

#[derive(Clone, Debug, Default)]
pub struct OperationDoc {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct OperationSpec {
    pub method: Method,
    pub path: String,
    /// Lowercase method and flattened path, e.g. `get:_api_real-estates__id_`.
    pub handler_id: String,
    pub doc: OperationDoc,
    pub params: Vec<ParamSpec>,
    pub body: Option<BodySpec>,
    pub responses: Vec<ResponseSpec>,
}

impl OperationSpec {
    fn new(method: Method, path: String) -> Self {
        let flat = path.replace(['/', '{', '}'], "_");
        Self {
            handler_id: format!("{}:{flat}", method.as_str().to_lowercase()),
            method,
            path,
            doc: OperationDoc::default(),
            params: Vec::new(),
            body: None,
            responses: Vec::new(),
        }
    }
}

/// Collects operation descriptions and component schemas. The REST host
/// implements it; modules only see `&dyn OpenApiRegistry`.
pub trait OpenApiRegistry {
    fn add_operation(&self, op: &OperationSpec);

    /// Store `schemas` as components; returns the name to reference `root` by.
    fn add_schemas(&self, root: &str, schemas: SchemaList) -> String;
}

/// Register `T` and every schema it references.
pub fn ensure_schema<T: utoipa::ToSchema + 'static>(registry: &dyn OpenApiRegistry) -> String {
    let root = T::name().into_owned();
    // Own schema first so the component is the object itself.
    let mut schemas = vec![(root.clone(), <T as PartialSchema>::schema())];
    T::schemas(&mut schemas);
    registry.add_schemas(&root, schemas)
}

/// `H` and `R` track whether a handler and a response were given.
pub struct OperationBuilder<H, R, S = ()> {
    spec: OperationSpec,
    route: Option<MethodRouter<S>>,
    _parts: PhantomData<(H, R)>,
}

impl<S> OperationBuilder<Missing, Missing, S> {
    fn at(method: Method, path: impl Into<String>) -> Self {
        Self {
            spec: OperationSpec::new(method, path.into()),
            route: None,
            _parts: PhantomData,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::at(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::at(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::at(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::at(Method::DELETE, path)
    }
}

impl<H, R, S> OperationBuilder<H, R, S> {
    pub fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    fn edit(mut self, f: impl FnOnce(&mut OperationSpec)) -> Self {
        f(&mut self.spec);
        self
    }

    pub fn operation_id(self, id: impl Into<String>) -> Self {
        self.edit(|s| s.doc.id = Some(id.into()))
    }

    pub fn summary(self, text: impl Into<String>) -> Self {
        self.edit(|s| s.doc.summary = Some(text.into()))
    }

    pub fn description(self, text: impl Into<String>) -> Self {
        self.edit(|s| s.doc.description = Some(text.into()))
    }

    pub fn tag(self, tag: impl Into<String>) -> Self {
        self.edit(|s| s.doc.tags.push(tag.into()))
    }

    pub fn path_param(self, name: impl Into<String>, kind: ParamKind, about: impl Into<String>) -> Self {
        self.edit(|s| {
            s.params.push(ParamSpec {
                name: name.into(),
                location: ParamLocation::Path,
                kind,
                required: true,
                description: about.into(),
            })
        })
    }

    pub fn query_param(
        self,
        name: impl Into<String>,
        kind: ParamKind,
        required: bool,
        about: impl Into<String>,
    ) -> Self {
        self.edit(|s| {
            s.params.push(ParamSpec {
                name: name.into(),
                location: ParamLocation::Query,
                kind,
                required,
                description: about.into(),
            })
        })
    }

    pub fn json_request<T: utoipa::ToSchema + 'static>(
        self,
        registry: &dyn OpenApiRegistry,
        about: impl Into<String>,
    ) -> Self {
        let schema = ensure_schema::<T>(registry);
        self.edit(|s| {
            s.body = Some(BodySpec {
                schema,
                description: about.into(),
            })
        })
    }

    fn respond(
        mut self,
        status: u16,
        about: impl Into<String>,
        body: ResponseBody,
    ) -> OperationBuilder<H, Present, S> {
        self.spec.responses.push(ResponseSpec {
            status,
            description: about.into(),
            body,
        });
        OperationBuilder {
            spec: self.spec,
            route: self.route,
            _parts: PhantomData,
        }
    }

    /// No body, e.g. 204.
    pub fn empty_response(self, status: u16, about: impl Into<String>) -> OperationBuilder<H, Present, S> {
        self.respond(status, about, ResponseBody::Empty)
    }

    pub fn json_response(self, status: u16, about: impl Into<String>) -> OperationBuilder<H, Present, S> {
        self.respond(status, about, ResponseBody::Json { schema: None, array: false })
    }

    pub fn json_response_with_schema<T: utoipa::ToSchema + 'static>(
        self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        about: impl Into<String>,
    ) -> OperationBuilder<H, Present, S> {
        let schema = Some(ensure_schema::<T>(registry));
        self.respond(status, about, ResponseBody::Json { schema, array: false })
    }

    pub fn json_array_response<T: utoipa::ToSchema + 'static>(
        self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        about: impl Into<String>,
    ) -> OperationBuilder<H, Present, S> {
        let schema = Some(ensure_schema::<T>(registry));
        self.respond(status, about, ResponseBody::Json { schema, array: true })
    }

    /// `application/problem+json` body.
    pub fn problem_response(
        self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        about: impl Into<String>,
    ) -> OperationBuilder<H, Present, S> {
        let schema = ensure_schema::<Problem>(registry);
        self.respond(status, about, ResponseBody::Problem { schema })
    }
}

impl<R, S> OperationBuilder<Missing, R, S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn handler<F, T>(self, h: F) -> OperationBuilder<Present, R, S>
    where
        F: Handler<T, S>,
        T: 'static,
    {
        let route = match self.spec.method {
            Method::GET => axum::routing::get(h),
            Method::POST => axum::routing::post(h),
            Method::PUT => axum::routing::put(h),
            Method::DELETE => axum::routing::delete(h),
            _ => axum::routing::any(h),
        };
        OperationBuilder {
            spec: self.spec,
            route: Some(route),
            _parts: PhantomData,
        }
    }
}

impl<S> OperationBuilder<Present, Present, S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Describe the operation in `openapi` and mount it on `router`.
    pub fn register(self, router: Router<S>, openapi: &dyn OpenApiRegistry) -> Router<S> {
        openapi.add_operation(&self.spec);
        match self.route {
            Some(route) => router.route(&self.spec.path, route),
            None => router,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct Recorder {
        ops: Mutex<Vec<OperationSpec>>,
        roots: Mutex<Vec<String>>,
    }

    impl OpenApiRegistry for Recorder {
        fn add_operation(&self, op: &OperationSpec) {
            self.ops.lock().unwrap().push(op.clone());
        }

        fn add_schemas(&self, root: &str, _schemas: SchemaList) -> String {
            self.roots.lock().unwrap().push(root.to_string());
            root.to_string()
        }
    }

    #[derive(utoipa::ToSchema)]
    #[allow(dead_code)]
    struct Listing {
        id: i32,
    }

    async fn pong() -> &'static str {
        "pong"
    }

    #[test]
    fn params_and_docs_land_in_the_spec() {
        let b = OperationBuilder::<Missing, Missing, ()>::get("/api/real-estates/{id}")
            .operation_id("real_estates.get_by_id")
            .summary("Get one")
            .tag("RealEstates")
            .path_param("id", ParamKind::Integer, "Real estate id")
            .query_param("name", ParamKind::String, false, "Name fragment");

        let spec = b.spec();
        assert_eq!(spec.handler_id, "get:_api_real-estates__id_");
        assert_eq!(spec.doc.id.as_deref(), Some("real_estates.get_by_id"));
        assert_eq!(spec.doc.tags, ["RealEstates"]);
        assert_eq!(spec.params[0].location, ParamLocation::Path);
        assert!(spec.params[0].required);
        assert_eq!(spec.params[0].kind.json_type(), "integer");
        assert_eq!(spec.params[1].location, ParamLocation::Query);
        assert!(!spec.params[1].required);
    }

    #[test]
    fn responses_keep_their_body_shape() {
        let reg = Recorder::default();
        let b = OperationBuilder::<Missing, Missing, ()>::put("/listings")
            .json_request::<Listing>(&reg, "Listing")
            .handler(pong)
            .empty_response(204, "Updated")
            .problem_response(&reg, 409, "Conflict")
            .json_array_response::<Listing>(&reg, 200, "All");

        let spec = b.spec();
        assert_eq!(spec.body.as_ref().map(|b| b.schema.as_str()), Some("Listing"));
        assert_eq!(spec.responses[0].body, ResponseBody::Empty);
        assert_eq!(
            spec.responses[1].body,
            ResponseBody::Problem { schema: "Problem".into() }
        );
        assert_eq!(
            spec.responses[2].body,
            ResponseBody::Json { schema: Some("Listing".into()), array: true }
        );
        assert_eq!(*reg.roots.lock().unwrap(), ["Listing", "Problem", "Listing"]);
    }

    #[tokio::test]
    async fn register_routes_and_records() {
        let reg = Recorder::default();
        let router = OperationBuilder::<Missing, Missing, ()>::get("/ping")
            .handler(pong)
            .json_response(200, "Pong")
            .register(Router::new(), &reg);

        assert_eq!(reg.ops.lock().unwrap()[0].path, "/ping");
        let res = router
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), http::StatusCode::OK);
    }
}
