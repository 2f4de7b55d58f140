use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entity::bookings::BookingStatus,
    models::{Booking, Payment, Review},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub tutor_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    pub session_date: NaiveDate,
    #[schema(value_type = String, example = "15:00:00")]
    pub session_time: NaiveTime,
    #[validate(range(min = 1, max = 8))]
    pub duration_hours: i32,
    #[validate(length(min = 5, max = 500))]
    pub address: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkPaidRequest {
    #[serde(alias = "bookingId")]
    pub booking_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetail {
    pub booking: Booking,
    pub payments: Vec<Payment>,
    pub review: Option<Review>,
}
