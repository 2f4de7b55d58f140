use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{bookings::BookingStatus, payments::PaymentStatus},
    models::Payment,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    #[serde(alias = "bookingId")]
    pub booking_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub payment: Payment,
    pub token: String,
    pub redirect_url: String,
}

/// HTTP notification body posted by the gateway.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct GatewayNotification {
    pub order_id: String,
    pub transaction_status: String,
    pub payment_type: Option<String>,
    pub status_code: Option<String>,
    pub gross_amount: Option<String>,
    pub signature_key: Option<String>,
    pub fraud_status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub order_id: String,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
}
