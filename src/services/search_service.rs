use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    dto::search::{SearchMode, TutorSearchHit, TutorSearchQuery, TutorSearchResult},
    entity::{
        profiles::{Column as ProfileCol, Entity as Profiles, Model as ProfileModel},
        tutor_profiles::{Column as TutorCol, Entity as TutorProfiles, Model as TutorModel},
    },
    error::{AppError, AppResult},
    geo::Coordinates,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Slack for floating point error so a tutor exactly on the radius stays in.
const DISTANCE_EPSILON_KM: f64 = 1e-9;

/// A validated search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    Gps {
        subject: String,
        origin: Coordinates,
        max_distance_km: f64,
    },
    Manual {
        subject: String,
        village_id: String,
        district_id: Option<String>,
    },
}

impl SearchRequest {
    pub fn from_query(query: TutorSearchQuery, default_max_km: f64) -> AppResult<Self> {
        let subject = non_blank(query.subject)
            .ok_or_else(|| AppError::BadRequest("subject is required".into()))?;

        match (query.lat, query.lng) {
            (Some(lat), Some(lng)) => {
                if !lat.is_finite() || !lng.is_finite() {
                    return Err(AppError::BadRequest("lat and lng must be numbers".into()));
                }
                let max_distance_km = match query.max_distance {
                    Some(max) if max.is_finite() && max > 0.0 => max,
                    Some(_) => {
                        return Err(AppError::BadRequest(
                            "max_distance must be a positive number".into(),
                        ));
                    }
                    None => default_max_km,
                };
                Ok(SearchRequest::Gps {
                    subject,
                    origin: Coordinates::new(lat, lng),
                    max_distance_km,
                })
            }
            (Some(_), None) | (None, Some(_)) => Err(AppError::BadRequest(
                "lat and lng must be provided together".into(),
            )),
            (None, None) => {
                let village_id = non_blank(query.village_id).ok_or_else(|| {
                    AppError::BadRequest("village_id or lat/lng is required".into())
                })?;
                Ok(SearchRequest::Manual {
                    subject,
                    village_id,
                    district_id: non_blank(query.district_id),
                })
            }
        }
    }
}

pub async fn search_tutors(
    state: &AppState,
    query: TutorSearchQuery,
) -> AppResult<ApiResponse<TutorSearchResult>> {
    let request = SearchRequest::from_query(query, state.config.search.max_distance_km)?;
    let result = resolve(state, request).await?;
    let meta = Meta::all(result.tutors.len());
    Ok(ApiResponse::success("Tutors", result, Some(meta)))
}

pub async fn resolve(state: &AppState, request: SearchRequest) -> AppResult<TutorSearchResult> {
    match request {
        SearchRequest::Gps {
            subject,
            origin,
            max_distance_km,
        } => {
            let candidates = active_tutors_teaching(&subject)
                .order_by_desc(TutorCol::Rating)
                .order_by_asc(TutorCol::Id)
                .all(state.db())
                .await?;
            let ranked = rank_by_distance(candidates, origin, max_distance_km);
            tracing::debug!(subject = %subject, found = ranked.len(), max_distance_km, "gps search");

            let names = load_profiles(state, ranked.iter().map(|(t, _)| t.user_id)).await?;
            let tutors = ranked
                .into_iter()
                .map(|(tutor, distance)| to_hit(tutor, &names, Some(distance), false))
                .collect();

            Ok(TutorSearchResult {
                subject,
                mode: SearchMode::Gps,
                used_gps: true,
                expanded: false,
                max_distance_km: Some(max_distance_km),
                tutors,
            })
        }
        SearchRequest::Manual {
            subject,
            village_id,
            district_id,
        } => {
            let in_village = active_tutors_teaching(&subject)
                .filter(TutorCol::VillageId.eq(village_id.clone()))
                .order_by_desc(TutorCol::Rating)
                .order_by_asc(TutorCol::Id)
                .all(state.db())
                .await?;

            let (mode, expanded, found) = match district_id {
                Some(district_id) if in_village.is_empty() => {
                    let in_district = active_tutors_teaching(&subject)
                        .filter(TutorCol::DistrictId.eq(district_id.clone()))
                        .order_by_desc(TutorCol::Rating)
                        .order_by_asc(TutorCol::Id)
                        .all(state.db())
                        .await?;
                    tracing::debug!(
                        subject = %subject,
                        village_id = %village_id,
                        district_id = %district_id,
                        found = in_district.len(),
                        "no tutors in village, expanded to district"
                    );
                    (SearchMode::District, true, in_district)
                }
                _ => (SearchMode::Village, false, in_village),
            };

            let names = load_profiles(state, found.iter().map(|t| t.user_id)).await?;
            let tutors = found
                .into_iter()
                .map(|tutor| to_hit(tutor, &names, None, expanded))
                .collect();

            Ok(TutorSearchResult {
                subject,
                mode,
                used_gps: false,
                expanded,
                max_distance_km: None,
                tutors,
            })
        }
    }
}

/// Drop tutors without coordinates or beyond `max_distance_km` (inclusive), nearest first.
pub fn rank_by_distance(
    tutors: Vec<TutorModel>,
    origin: Coordinates,
    max_distance_km: f64,
) -> Vec<(TutorModel, f64)> {
    let mut ranked: Vec<(TutorModel, f64)> = tutors
        .into_iter()
        .filter_map(|tutor| {
            let (lat, lng) = tutor.coordinates()?;
            let distance = origin.distance_to(&Coordinates::new(lat, lng));
            (distance <= max_distance_km + DISTANCE_EPSILON_KM).then_some((tutor, distance))
        })
        .collect();

    ranked.sort_by(|(a, da), (b, db)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)));
    ranked
}

fn active_tutors_teaching(subject: &str) -> Select<TutorProfiles> {
    TutorProfiles::find()
        .filter(TutorCol::IsActive.eq(true))
        .filter(TutorCol::IsOnboarded.eq(true))
        .filter(Expr::cust_with_values(
            "$1 = ANY(\"tutor_profiles\".\"subjects\")",
            [subject.to_owned()],
        ))
}

async fn load_profiles(
    state: &AppState,
    user_ids: impl Iterator<Item = Uuid>,
) -> AppResult<HashMap<Uuid, ProfileModel>> {
    let ids: Vec<Uuid> = user_ids.collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let profiles = Profiles::find()
        .filter(ProfileCol::Id.is_in(ids))
        .all(state.db())
        .await?;
    Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
}

fn to_hit(
    tutor: TutorModel,
    profiles: &HashMap<Uuid, ProfileModel>,
    distance_km: Option<f64>,
    expanded_search: bool,
) -> TutorSearchHit {
    let profile = profiles.get(&tutor.user_id);
    TutorSearchHit {
        user_id: tutor.user_id,
        profile_id: tutor.id,
        full_name: profile.map(|p| p.full_name.clone()).unwrap_or_default(),
        avatar_url: profile.and_then(|p| p.avatar_url.clone()),
        subjects: tutor.subjects,
        hourly_rate: tutor.hourly_rate,
        rating: tutor.rating,
        review_count: tutor.review_count,
        village_id: tutor.village_id,
        district_id: tutor.district_id,
        distance_km,
        expanded_search,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
