use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::contract::model::RealEstate;

/// REST DTO for a real estate record. `id` and `addressZipCode` are always
/// serialized (`null` when absent); `stateId`/`cityId` are omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = RealEstate)]
pub struct RealEstateDto {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cnpj: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_id: Option<i32>,
    #[serde(default)]
    pub address_zip_code: Option<String>,
}

/// Query for `GET /api/real-estates/filter`. `name` and `cnpj` must be
/// present (possibly empty); `stateId=` with no value counts as absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    pub name: String,
    pub cnpj: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub state_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub city_id: Option<i32>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl From<RealEstate> for RealEstateDto {
    fn from(r: RealEstate) -> Self {
        Self {
            id: r.id,
            name: r.name,
            cnpj: r.cnpj,
            state_id: r.state_id,
            city_id: r.city_id,
            address_zip_code: r.address_zip_code,
        }
    }
}

impl From<RealEstateDto> for RealEstate {
    fn from(d: RealEstateDto) -> Self {
        Self {
            id: d.id,
            name: d.name,
            cnpj: d.cnpj,
            state_id: d.state_id,
            city_id: d.city_id,
            address_zip_code: d.address_zip_code,
        }
    }
}
