use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::admin::{ApproveTutorRequest, DispatchReport, PendingTutorList, RejectTutorRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Notification, TutorProfile},
    response::ApiResponse,
    routes::params::{NotificationListQuery, Pagination},
    services::{approval_service, notification_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tutors/pending", get(list_pending_tutors))
        .route("/tutors/{id}/approve", post(approve_tutor))
        .route("/tutors/{id}/reject", post(reject_tutor))
        .route("/notifications", get(list_notifications))
        .route("/notifications/dispatch", post(dispatch_notifications))
}

#[utoipa::path(
    get,
    path = "/admin/tutors/pending",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Tutor profiles waiting for review", body = ApiResponse<PendingTutorList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_pending_tutors(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PendingTutorList>>> {
    let resp = approval_service::list_pending(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/tutors/{id}/approve",
    params(("id" = Uuid, Path, description = "Tutor profile id")),
    request_body = ApproveTutorRequest,
    responses(
        (status = 200, description = "Tutor approved", body = ApiResponse<TutorProfile>),
        (status = 404, description = "Profile not found"),
        (status = 409, description = "Profile not pending or changed concurrently"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_tutor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<ApproveTutorRequest>>,
) -> AppResult<Json<ApiResponse<TutorProfile>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = approval_service::approve(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/tutors/{id}/reject",
    params(("id" = Uuid, Path, description = "Tutor profile id")),
    request_body = RejectTutorRequest,
    responses(
        (status = 200, description = "Tutor sent back to onboarding", body = ApiResponse<TutorProfile>),
        (status = 400, description = "Rejection not confirmed"),
        (status = 404, description = "Profile not found"),
        (status = 409, description = "Profile not pending or changed concurrently"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_tutor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectTutorRequest>,
) -> AppResult<Json<ApiResponse<TutorProfile>>> {
    let resp = approval_service::reject(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/admin/notifications",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Outbox rows, newest first", body = ApiResponse<Vec<Notification>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Notification>>>> {
    let resp = notification_service::list_notifications(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/admin/notifications/dispatch",
    responses(
        (status = 200, description = "Deliver due notifications now", body = ApiResponse<DispatchReport>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dispatch_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DispatchReport>>> {
    let resp = notification_service::dispatch_now(&state, &user).await?;
    Ok(Json(resp))
}
