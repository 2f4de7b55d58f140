use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    entity::{
        cities::{Column as CityCol, Entity as Cities},
        districts::{Column as DistrictCol, Entity as Districts},
        provinces::{Column as ProvinceCol, Entity as Provinces},
        villages::{Column as VillageCol, Entity as Villages},
    },
    error::{AppError, AppResult},
    models::{City, District, Province, Village},
    response::{ApiResponse, Meta},
    routes::params::{CityQuery, DistrictQuery, VillageQuery},
    state::AppState,
};

pub async fn list_provinces(state: &AppState) -> AppResult<ApiResponse<Vec<Province>>> {
    let items: Vec<Province> = Provinces::find()
        .order_by_asc(ProvinceCol::Id)
        .all(state.db())
        .await?
        .into_iter()
        .map(Province::from)
        .collect();

    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Provinces", items, Some(meta)))
}

pub async fn list_cities(
    state: &AppState,
    query: CityQuery,
) -> AppResult<ApiResponse<Vec<City>>> {
    let mut finder = Cities::find();
    if let Some(province_id) = non_blank(query.province_id) {
        finder = finder.filter(CityCol::ProvinceId.eq(province_id));
    }

    let items: Vec<City> = finder
        .order_by_asc(CityCol::Id)
        .all(state.db())
        .await?
        .into_iter()
        .map(City::from)
        .collect();

    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Cities", items, Some(meta)))
}

pub async fn list_districts(
    state: &AppState,
    query: DistrictQuery,
) -> AppResult<ApiResponse<Vec<District>>> {
    let city_id = non_blank(query.city_id)
        .ok_or_else(|| AppError::BadRequest("city_id is required".into()))?;

    let items: Vec<District> = Districts::find()
        .filter(DistrictCol::CityId.eq(city_id))
        .order_by_asc(DistrictCol::Id)
        .all(state.db())
        .await?
        .into_iter()
        .map(District::from)
        .collect();

    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Districts", items, Some(meta)))
}

pub async fn list_villages(
    state: &AppState,
    query: VillageQuery,
) -> AppResult<ApiResponse<Vec<Village>>> {
    let district_id = non_blank(query.district_id)
        .ok_or_else(|| AppError::BadRequest("district_id is required".into()))?;

    let items: Vec<Village> = Villages::find()
        .filter(VillageCol::DistrictId.eq(district_id))
        .order_by_asc(VillageCol::Id)
        .all(state.db())
        .await?
        .into_iter()
        .map(Village::from)
        .collect();

    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Villages", items, Some(meta)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
