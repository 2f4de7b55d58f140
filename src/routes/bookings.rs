use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::bookings::{
        BookingDetail, BookingList, CreateBookingRequest, CreateReviewRequest, MarkPaidRequest,
        UpdateBookingStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Booking, Review},
    response::ApiResponse,
    routes::params::BookingListQuery,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/mark-paid", post(mark_paid))
        .route("/{id}", get(get_booking))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/review", post(create_review))
}

#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Booking created, awaiting payment", body = ApiResponse<Booking>),
        (status = 400, description = "Validation error or tutor unavailable"),
        (status = 409, description = "Slot already taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::create_booking(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Bookings of the caller", body = ApiResponse<BookingList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::list_bookings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking with payments and review", body = ApiResponse<BookingDetail>),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookingDetail>>> {
    let resp = booking_service::get_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/bookings/{id}/status",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = UpdateBookingStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Booking>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Transition not allowed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/review",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Review saved", body = ApiResponse<Review>),
        (status = 409, description = "Booking not completed or already reviewed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = booking_service::create_review(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/bookings/mark-paid",
    request_body = MarkPaidRequest,
    responses(
        (status = 200, description = "Booking paid; repeated calls return it unchanged", body = ApiResponse<Booking>),
        (status = 403, description = "Manual payment disabled"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MarkPaidRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::mark_paid(&state, &user, payload).await?;
    Ok(Json(resp))
}
