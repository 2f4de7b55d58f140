use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payments::{CheckoutResponse, CreatePaymentRequest, GatewayNotification, WebhookAck},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_payment))
        .route("/webhook", post(payment_webhook))
}

#[utoipa::path(
    post,
    path = "/payments/create",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Hosted checkout token", body = ApiResponse<CheckoutResponse>),
        (status = 409, description = "Booking not awaiting payment"),
        (status = 502, description = "Payment failed, please try again"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    let resp = payment_service::create_payment(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/payments/webhook",
    request_body = GatewayNotification,
    responses(
        (status = 200, description = "Notification applied", body = ApiResponse<WebhookAck>),
        (status = 403, description = "Signature mismatch"),
        (status = 404, description = "Unknown order id"),
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(notification): Json<GatewayNotification>,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let resp = payment_service::handle_webhook(&state, notification).await?;
    Ok(Json(resp))
}
