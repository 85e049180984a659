use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{HeaderValue, Method},
    Extension, Router,
};
use modkit::api::{OpenApiRegistry, OperationBuilder, ParamKind};
use tower_http::cors::{AllowHeaders, CorsLayer};

use crate::api::rest::{dto::RealEstateDto, handlers};
use crate::contract::client::RealEstateService;

const TAG: &str = "RealEstates";

/// Register the `/api/real-estates` endpoint group. CORS applies to this
/// group only and admits exactly one origin.
pub fn register_routes(
    router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<dyn RealEstateService>,
    cors_origin: &str,
) -> anyhow::Result<Router> {
    let origin = HeaderValue::from_str(cors_origin)
        .with_context(|| format!("invalid CORS origin '{cors_origin}'"))?;

    let group: Router = Router::new();

    // GET /api/real-estates
    let group = OperationBuilder::get("/api/real-estates")
        .operation_id("real_estates.list_all")
        .summary("List real estates")
        .description("All real estates; 204 when there are none")
        .tag(TAG)
        .handler(handlers::list_all)
        .json_array_response::<RealEstateDto>(openapi, 200, "Real estates")
        .empty_response(204, "No real estates")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(group, openapi);

    // GET /api/real-estates/filter
    let group = OperationBuilder::get("/api/real-estates/filter")
        .operation_id("real_estates.filter")
        .summary("Filter real estates")
        .description("Empty name/cnpj and absent ids impose no constraint")
        .tag(TAG)
        .query_param("name", ParamKind::String, true, "Case-insensitive name fragment")
        .query_param("cnpj", ParamKind::String, true, "Cnpj fragment")
        .query_param("stateId", ParamKind::Integer, false, "State id")
        .query_param("cityId", ParamKind::Integer, false, "City id")
        .handler(handlers::filter)
        .json_array_response::<RealEstateDto>(openapi, 200, "Matching real estates")
        .empty_response(204, "No matching real estates")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(group, openapi);

    // GET /api/real-estates/{id}
    let group = OperationBuilder::get("/api/real-estates/{id}")
        .operation_id("real_estates.get_by_id")
        .summary("Get real estate by id")
        .tag(TAG)
        .path_param("id", ParamKind::Integer, "Real estate id")
        .handler(handlers::get_by_id)
        .json_response_with_schema::<RealEstateDto>(openapi, 200, "Real estate")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(group, openapi);

    // POST /api/real-estates
    let group = OperationBuilder::post("/api/real-estates")
        .operation_id("real_estates.create")
        .summary("Create real estate")
        .description("Responds 200 with the stored record; addressZipCode is always null")
        .tag(TAG)
        .json_request::<RealEstateDto>(openapi, "Real estate to create")
        .handler(handlers::create)
        .json_response_with_schema::<RealEstateDto>(openapi, 200, "Created real estate")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 409, "Conflict")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(group, openapi);

    // PUT /api/real-estates
    let group = OperationBuilder::put("/api/real-estates")
        .operation_id("real_estates.update")
        .summary("Update real estate")
        .tag(TAG)
        .json_request::<RealEstateDto>(openapi, "Real estate with its id")
        .handler(handlers::update)
        .empty_response(204, "Updated")
        .problem_response(openapi, 400, "Bad Request")
        .problem_response(openapi, 409, "Conflict")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(group, openapi);

    // DELETE /api/real-estates/{id}
    let group = OperationBuilder::delete("/api/real-estates/{id}")
        .operation_id("real_estates.delete")
        .summary("Delete real estate")
        .tag(TAG)
        .path_param("id", ParamKind::Integer, "Real estate id")
        .handler(handlers::delete)
        .empty_response(204, "Deleted")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(group, openapi);

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        // Any request header the browser asks for, x-request-id included.
        .allow_headers(AllowHeaders::mirror_request());

    let group = group.layer(Extension(service)).layer(cors);
    Ok(router.merge(group))
}
