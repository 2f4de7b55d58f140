use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    error::AppResult,
    models::{City, District, Province, Village},
    response::ApiResponse,
    routes::params::{CityQuery, DistrictQuery, VillageQuery},
    services::wilayah_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/provinces", get(list_provinces))
        .route("/cities", get(list_cities))
        .route("/districts", get(list_districts))
        .route("/villages", get(list_villages))
}

#[utoipa::path(
    get,
    path = "/wilayah/provinces",
    responses(
        (status = 200, description = "All provinces", body = ApiResponse<Vec<Province>>),
    ),
    tag = "Wilayah"
)]
pub async fn list_provinces(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Province>>>> {
    let resp = wilayah_service::list_provinces(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/wilayah/cities",
    params(CityQuery),
    responses(
        (status = 200, description = "Cities and regencies, optionally of one province", body = ApiResponse<Vec<City>>),
    ),
    tag = "Wilayah"
)]
pub async fn list_cities(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> AppResult<Json<ApiResponse<Vec<City>>>> {
    let resp = wilayah_service::list_cities(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/wilayah/districts",
    params(DistrictQuery),
    responses(
        (status = 200, description = "Districts of a city", body = ApiResponse<Vec<District>>),
        (status = 400, description = "city_id missing"),
    ),
    tag = "Wilayah"
)]
pub async fn list_districts(
    State(state): State<AppState>,
    Query(query): Query<DistrictQuery>,
) -> AppResult<Json<ApiResponse<Vec<District>>>> {
    let resp = wilayah_service::list_districts(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/wilayah/villages",
    params(VillageQuery),
    responses(
        (status = 200, description = "Villages of a district", body = ApiResponse<Vec<Village>>),
        (status = 400, description = "district_id missing"),
    ),
    tag = "Wilayah"
)]
pub async fn list_villages(
    State(state): State<AppState>,
    Query(query): Query<VillageQuery>,
) -> AppResult<Json<ApiResponse<Vec<Village>>>> {
    let resp = wilayah_service::list_villages(&state, query).await?;
    Ok(Json(resp))
}
