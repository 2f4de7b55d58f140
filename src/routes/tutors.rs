use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        search::{TutorSearchQuery, TutorSearchResult},
        tutors::{OnboardingRequest, PublicTutorDetail, TutorMe},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{TutorProfile, TutorWallet},
    response::ApiResponse,
    services::{search_service, tutor_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_tutors))
        .route("/me", get(get_me))
        .route("/me/onboarding", post(submit_onboarding))
        .route("/me/wallet", get(get_wallet))
        .route("/{id}", get(get_tutor))
}

#[utoipa::path(
    get,
    path = "/tutors/search",
    params(TutorSearchQuery),
    responses(
        (status = 200, description = "Active tutors matching the subject near a point or in an area", body = ApiResponse<TutorSearchResult>),
        (status = 400, description = "Missing subject or location"),
    ),
    tag = "Tutors"
)]
pub async fn search_tutors(
    State(state): State<AppState>,
    Query(query): Query<TutorSearchQuery>,
) -> AppResult<Json<ApiResponse<TutorSearchResult>>> {
    let resp = search_service::search_tutors(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/tutors/{id}",
    params(("id" = Uuid, Path, description = "Tutor user id")),
    responses(
        (status = 200, description = "Public profile of an active tutor", body = ApiResponse<PublicTutorDetail>),
        (status = 404, description = "Tutor not found or not active"),
    ),
    tag = "Tutors"
)]
pub async fn get_tutor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PublicTutorDetail>>> {
    let resp = tutor_service::get_public_tutor(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/tutors/me",
    responses(
        (status = 200, description = "Own tutor profile", body = ApiResponse<TutorMe>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a tutor"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tutors"
)]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<TutorMe>>> {
    let resp = tutor_service::get_me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/tutors/me/onboarding",
    request_body = OnboardingRequest,
    responses(
        (status = 200, description = "Profile submitted for review", body = ApiResponse<TutorProfile>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Profile already submitted"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tutors"
)]
pub async fn submit_onboarding(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<OnboardingRequest>,
) -> AppResult<Json<ApiResponse<TutorProfile>>> {
    let resp = tutor_service::submit_onboarding(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/tutors/me/wallet",
    responses(
        (status = 200, description = "Wallet of an approved tutor", body = ApiResponse<TutorWallet>),
        (status = 404, description = "No wallet yet"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tutors"
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<TutorWallet>>> {
    let resp = tutor_service::get_wallet(&state, &user).await?;
    Ok(Json(resp))
}
