use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::payments::{CheckoutResponse, CreatePaymentRequest, GatewayNotification, WebhookAck},
    entity::{
        bookings::{BookingStatus, Entity as Bookings},
        payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments, PaymentStatus,
        },
        profiles::{Entity as Profiles, Role},
    },
    error::{AppError, AppResult},
    integrations::midtrans::{
        CustomerDetails, ItemDetails, SnapRequest, TransactionDetails, verify_notification,
    },
    middleware::auth::{AuthUser, ensure_role},
    models::Payment,
    response::ApiResponse,
    services::{booking_service, notification_service},
    state::AppState,
};

/// `LESGO-<first 8 hex of the booking id>-<unix millis>`, unique per attempt.
pub fn new_order_id(booking_id: Uuid) -> String {
    let simple = booking_id.simple().to_string();
    format!(
        "LESGO-{}-{}",
        &simple[..8].to_uppercase(),
        Utc::now().timestamp_millis()
    )
}

/// Local status for a gateway notification. A captured card payment held for fraud review stays pending.
pub fn status_for_notification(notification: &GatewayNotification) -> PaymentStatus {
    let challenged = notification.transaction_status == "capture"
        && notification.fraud_status.as_deref() == Some("challenge");
    if challenged {
        PaymentStatus::Pending
    } else {
        PaymentStatus::from_gateway(&notification.transaction_status)
    }
}

/// Whether a stored payment may take a status reported later by the gateway.
/// Settled and closed payments ignore out-of-order notifications, except a refund after success.
pub fn accepts_transition(current: PaymentStatus, next: PaymentStatus) -> bool {
    use PaymentStatus::*;
    match current {
        Pending => next != Pending,
        Success => next == Refunded,
        Failed | Expired | Refunded => false,
    }
}

/// Start a hosted checkout for a booking awaiting payment.
pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    ensure_role(user, Role::Parent)?;

    let booking = Bookings::find_by_id(payload.booking_id)
        .one(state.db())
        .await?
        .filter(|b| b.parent_id == user.user_id)
        .ok_or(AppError::NotFound)?;
    if booking.status != BookingStatus::PendingPayment {
        return Err(AppError::Conflict(format!(
            "Booking is {} and not awaiting payment",
            booking.status.as_str()
        )));
    }

    let open = Payments::find()
        .filter(PaymentCol::BookingId.eq(booking.id))
        .filter(PaymentCol::Status.eq(PaymentStatus::Pending))
        .order_by_desc(PaymentCol::CreatedAt)
        .one(state.db())
        .await?;
    if let Some(payment) = open {
        if let (Some(token), Some(redirect_url)) =
            (payment.snap_token.clone(), payment.redirect_url.clone())
        {
            return Ok(ApiResponse::ok(
                "Checkout resumed",
                CheckoutResponse {
                    payment: Payment::from(payment),
                    token,
                    redirect_url,
                },
            ));
        }
    }

    let customer = Profiles::find_by_id(user.user_id)
        .one(state.db())
        .await?
        .ok_or(AppError::NotFound)?;

    let order_id = new_order_id(booking.id);
    let request = SnapRequest {
        transaction_details: TransactionDetails {
            order_id: order_id.clone(),
            gross_amount: booking.total_amount,
        },
        customer_details: CustomerDetails {
            first_name: customer.full_name,
            email: customer.email,
            phone: customer.phone,
        },
        item_details: vec![ItemDetails::new(
            booking.id.to_string(),
            booking.hourly_rate,
            booking.duration_hours,
            &format!("Les {}", booking.subject),
        )],
    };

    let transaction = state
        .gateway
        .create_transaction(&request)
        .await
        .map_err(|err| AppError::Payment(err.to_string()))?;

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking.id),
        order_id: Set(order_id),
        amount: Set(booking.total_amount),
        status: Set(PaymentStatus::Pending),
        payment_type: Set(None),
        snap_token: Set(Some(transaction.token.clone())),
        redirect_url: Set(Some(transaction.redirect_url.clone())),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(state.db())
    .await?;

    tracing::info!(booking_id = %booking.id, order_id = %payment.order_id, "checkout started");
    if let Err(err) = log_audit(
        state.db(),
        Some(user.user_id),
        "payment_create",
        Some("payments"),
        Some(serde_json::json!({ "booking_id": booking.id, "order_id": payment.order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Checkout created",
        CheckoutResponse {
            payment: Payment::from(payment),
            token: transaction.token,
            redirect_url: transaction.redirect_url,
        },
    ))
}

/// Apply a gateway notification. Redelivery of an already applied status changes nothing.
pub async fn handle_webhook(
    state: &AppState,
    notification: GatewayNotification,
) -> AppResult<ApiResponse<WebhookAck>> {
    let midtrans = &state.config.midtrans;
    if (midtrans.require_signature || notification.signature_key.is_some())
        && !verify_notification(&notification, &midtrans.server_key)
    {
        tracing::warn!(order_id = %notification.order_id, "rejected notification with bad signature");
        return Err(AppError::Forbidden);
    }

    let next = status_for_notification(&notification);

    let txn = state.db().begin().await?;
    // Booking row first, then payment: the same order mark_paid takes its locks in.
    let booking_id = Payments::find()
        .filter(PaymentCol::OrderId.eq(notification.order_id.clone()))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?
        .booking_id;
    let booking = Bookings::find_by_id(booking_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(notification.order_id.clone()))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !accepts_transition(payment.status, next) {
        tracing::debug!(
            order_id = %payment.order_id,
            current = payment.status.as_str(),
            reported = notification.transaction_status.as_str(),
            "notification ignored"
        );
        return Ok(ApiResponse::ok(
            "Notification already applied",
            WebhookAck {
                order_id: payment.order_id,
                payment_status: payment.status,
                booking_status: booking.status,
            },
        ));
    }

    let now = Utc::now().fixed_offset();
    let order_id = payment.order_id.clone();
    let payment_type = notification.payment_type.clone().or(payment.payment_type.clone());
    let mut active: PaymentActive = payment.into();
    active.status = Set(next);
    active.payment_type = Set(payment_type);
    if next == PaymentStatus::Success {
        active.paid_at = Set(Some(now));
    }
    active.updated_at = Set(now);
    let payment = active.update(&txn).await?;

    let (booking, notification_id) =
        if next == PaymentStatus::Success && booking.status == BookingStatus::PendingPayment {
            booking_service::settle_booking(&txn, booking).await?
        } else {
            (booking, None)
        };

    txn.commit().await?;
    notification_service::dispatch_after_commit(state, notification_id.into_iter().collect());

    tracing::info!(
        order_id = %order_id,
        payment_status = payment.status.as_str(),
        booking_status = booking.status.as_str(),
        "payment notification applied"
    );
    if let Err(err) = log_audit(
        state.db(),
        None,
        "payment_notification",
        Some("payments"),
        Some(serde_json::json!({
            "order_id": order_id,
            "transaction_status": notification.transaction_status,
            "payment_status": payment.status,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Notification applied",
        WebhookAck {
            order_id,
            payment_status: payment.status,
            booking_status: booking.status,
        },
    ))
}
