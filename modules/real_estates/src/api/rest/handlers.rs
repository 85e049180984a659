use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Extension,
};
use modkit::api::problem::Problem;
use tracing::{error, info};

use crate::api::rest::dto::{FilterQuery, RealEstateDto};
use crate::api::rest::error::map_service_error;
use crate::contract::client::RealEstateService;
use crate::contract::model::{FilterCriteria, RealEstate};

/// 204 without a body for an empty result, 200 with the array otherwise.
fn list_response(real_estates: Vec<RealEstate>) -> Response {
    if real_estates.is_empty() {
        info!("There is no real estates in database.");
        return StatusCode::NO_CONTENT.into_response();
    }
    info!(count = real_estates.len(), "Real estates fetched with success.");
    let body: Vec<RealEstateDto> = real_estates.into_iter().map(RealEstateDto::from).collect();
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn list_all(
    Extension(svc): Extension<Arc<dyn RealEstateService>>,
    uri: Uri,
) -> Result<Response, Problem> {
    info!("Fetching all real estates.");

    match svc.find_all().await {
        Ok(real_estates) => Ok(list_response(real_estates)),
        Err(e) => {
            error!("Failed to list real estates: {}", e);
            Err(map_service_error(&e, uri.path()))
        }
    }
}

pub async fn filter(
    Extension(svc): Extension<Arc<dyn RealEstateService>>,
    Query(query): Query<FilterQuery>,
    uri: Uri,
) -> Result<Response, Problem> {
    info!("Fetching real estates using filter parameters.");

    let criteria =
        FilterCriteria::from_params(query.name, query.cnpj, query.state_id, query.city_id);

    match svc.find_all_by(&criteria).await {
        Ok(real_estates) => Ok(list_response(real_estates)),
        Err(e) => {
            error!("Failed to filter real estates: {}", e);
            Err(map_service_error(&e, uri.path()))
        }
    }
}

pub async fn get_by_id(
    Extension(svc): Extension<Arc<dyn RealEstateService>>,
    Path(id): Path<i32>,
    uri: Uri,
) -> Result<Json<RealEstateDto>, Problem> {
    info!("Fetching the real estate by id.");

    match svc.find_by_id(id).await {
        Ok(real_estate) => {
            info!(id, "Real estate fetched with success.");
            Ok(Json(RealEstateDto::from(real_estate)))
        }
        Err(e) => {
            error!("Failed to get real estate {}: {}", id, e);
            Err(map_service_error(&e, uri.path()))
        }
    }
}

/// Responds 200 (not 201); `addressZipCode` is never echoed back.
pub async fn create(
    uri: Uri,
    Extension(svc): Extension<Arc<dyn RealEstateService>>,
    Json(req_body): Json<RealEstateDto>,
) -> Result<Json<RealEstateDto>, Problem> {
    info!("Saving the real estate.");

    match svc.save(req_body.into()).await {
        Ok(saved) => {
            info!(id = ?saved.id, "Real estate saved with success.");
            let mut dto = RealEstateDto::from(saved);
            dto.address_zip_code = None;
            Ok(Json(dto))
        }
        Err(e) => {
            error!("Failed to save real estate: {}", e);
            Err(map_service_error(&e, uri.path()))
        }
    }
}

pub async fn update(
    uri: Uri,
    Extension(svc): Extension<Arc<dyn RealEstateService>>,
    Json(req_body): Json<RealEstateDto>,
) -> Result<StatusCode, Problem> {
    info!("Updating the real estate.");

    match svc.update(req_body.into()).await {
        Ok(changed) => {
            info!(changed, "Real estate updated with success.");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            error!("Failed to update real estate: {}", e);
            Err(map_service_error(&e, uri.path()))
        }
    }
}

pub async fn delete(
    Extension(svc): Extension<Arc<dyn RealEstateService>>,
    Path(id): Path<i32>,
    uri: Uri,
) -> Result<StatusCode, Problem> {
    info!("Deleting the real estate by id.");

    match svc.delete_by_id(id).await {
        Ok(deleted) => {
            info!(id, deleted, "Real estate deleted with success.");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            error!("Failed to delete real estate {}: {}", id, e);
            Err(map_service_error(&e, uri.path()))
        }
    }
}
