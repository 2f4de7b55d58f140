use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    bookings::{self, BookingStatus},
    cities::{self, CityType},
    districts,
    notification_outbox::{self, OutboxStatus},
    payments::{self, PaymentStatus},
    provinces, reviews, tutor_availability,
    tutor_profiles::{self, TutorStatus},
    tutor_wallets,
    villages::{self, VillageType},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Province {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct City {
    pub id: String,
    pub province_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub city_type: CityType,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct District {
    pub id: String,
    pub city_id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Village {
    pub id: String,
    pub district_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub village_type: VillageType,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailabilitySlot {
    pub day_of_week: i16,
    #[schema(value_type = String, example = "15:30:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "15:30:00")]
    pub end_time: NaiveTime,
}

/// Full tutor profile as the owner or an admin sees it.
#[derive(Debug, Serialize, ToSchema)]
pub struct TutorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: TutorStatus,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_onboarded: bool,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub nik: Option<String>,
    pub bio: Option<String>,
    pub id_card_path: Option<String>,
    pub selfie_path: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub province_id: Option<String>,
    pub city_id: Option<String>,
    pub district_id: Option<String>,
    pub village_id: Option<String>,
    pub education_level: Option<String>,
    pub institution: Option<String>,
    pub major: Option<String>,
    pub subjects: Vec<String>,
    pub hourly_rate: i64,
    pub rating: f64,
    pub review_count: i32,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub version: i32,
    pub availability: Vec<AvailabilitySlot>,
}

impl TutorProfile {
    pub fn from_entity(
        model: tutor_profiles::Model,
        availability: Vec<tutor_availability::Model>,
    ) -> Self {
        Self {
            status: model.status(),
            id: model.id,
            user_id: model.user_id,
            is_verified: model.is_verified,
            is_active: model.is_active,
            is_onboarded: model.is_onboarded,
            date_of_birth: model.date_of_birth,
            gender: model.gender,
            nik: model.nik,
            bio: model.bio,
            id_card_path: model.id_card_path,
            selfie_path: model.selfie_path,
            whatsapp: model.whatsapp,
            address: model.address,
            latitude: model.latitude,
            longitude: model.longitude,
            province_id: model.province_id,
            city_id: model.city_id,
            district_id: model.district_id,
            village_id: model.village_id,
            education_level: model.education_level,
            institution: model.institution,
            major: model.major,
            subjects: model.subjects,
            hourly_rate: model.hourly_rate,
            rating: model.rating,
            review_count: model.review_count,
            submitted_at: model.submitted_at.map(|dt| dt.with_timezone(&Utc)),
            approved_at: model.approved_at.map(|dt| dt.with_timezone(&Utc)),
            approved_by: model.approved_by,
            rejection_reason: model.rejection_reason,
            version: model.version,
            availability: availability.into_iter().map(AvailabilitySlot::from).collect(),
        }
    }
}

/// What parents see of an active tutor.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicTutor {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub education_level: Option<String>,
    pub institution: Option<String>,
    pub subjects: Vec<String>,
    pub hourly_rate: i64,
    pub rating: f64,
    pub review_count: i32,
    pub province_id: Option<String>,
    pub city_id: Option<String>,
    pub district_id: Option<String>,
    pub village_id: Option<String>,
    pub availability: Vec<AvailabilitySlot>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TutorWallet {
    pub tutor_id: Uuid,
    pub balance: i64,
    pub total_earned: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub tutor_id: Uuid,
    pub subject: String,
    pub session_date: NaiveDate,
    #[schema(value_type = String, example = "15:30:00")]
    pub session_time: NaiveTime,
    pub duration_hours: i32,
    pub address: String,
    pub hourly_rate: i64,
    pub total_amount: i64,
    pub commission: i64,
    pub tutor_earnings: i64,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub order_id: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub payment_type: Option<String>,
    pub snap_token: Option<String>,
    pub redirect_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub tutor_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub kind: String,
    pub recipient: String,
    pub subject: String,
    pub status: OutboxStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl From<provinces::Model> for Province {
    fn from(model: provinces::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<cities::Model> for City {
    fn from(model: cities::Model) -> Self {
        Self {
            id: model.id,
            province_id: model.province_id,
            name: model.name,
            city_type: model.city_type,
        }
    }
}

impl From<districts::Model> for District {
    fn from(model: districts::Model) -> Self {
        Self {
            id: model.id,
            city_id: model.city_id,
            name: model.name,
        }
    }
}

impl From<villages::Model> for Village {
    fn from(model: villages::Model) -> Self {
        Self {
            id: model.id,
            district_id: model.district_id,
            name: model.name,
            village_type: model.village_type,
        }
    }
}

impl From<tutor_availability::Model> for AvailabilitySlot {
    fn from(model: tutor_availability::Model) -> Self {
        Self {
            day_of_week: model.day_of_week,
            start_time: model.start_time,
            end_time: model.end_time,
        }
    }
}

impl From<tutor_wallets::Model> for TutorWallet {
    fn from(model: tutor_wallets::Model) -> Self {
        Self {
            tutor_id: model.tutor_id,
            balance: model.balance,
            total_earned: model.total_earned,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<bookings::Model> for Booking {
    fn from(model: bookings::Model) -> Self {
        Self {
            id: model.id,
            parent_id: model.parent_id,
            tutor_id: model.tutor_id,
            subject: model.subject,
            session_date: model.session_date,
            session_time: model.session_time,
            duration_hours: model.duration_hours,
            address: model.address,
            hourly_rate: model.hourly_rate,
            total_amount: model.total_amount,
            commission: model.commission,
            tutor_earnings: model.tutor_earnings,
            notes: model.notes,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<payments::Model> for Payment {
    fn from(model: payments::Model) -> Self {
        Self {
            id: model.id,
            booking_id: model.booking_id,
            order_id: model.order_id,
            amount: model.amount,
            status: model.status,
            payment_type: model.payment_type,
            snap_token: model.snap_token,
            redirect_url: model.redirect_url,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            booking_id: model.booking_id,
            tutor_id: model.tutor_id,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<notification_outbox::Model> for Notification {
    fn from(model: notification_outbox::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            recipient: model.recipient,
            subject: model.subject,
            status: model.status,
            attempts: model.attempts,
            last_error: model.last_error,
            created_at: model.created_at.with_timezone(&Utc),
            sent_at: model.sent_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
