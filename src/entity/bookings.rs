use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending_payment")]
    PendingPayment,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "declined")]
    Declined,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "pending_payment",
            BookingStatus::Paid => "paid",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Declined => "declined",
        }
    }

    /// Statuses that still hold the tutor's time slot.
    pub fn holding_slot() -> [BookingStatus; 4] {
        [
            BookingStatus::PendingPayment,
            BookingStatus::Paid,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
        ]
    }

    /// Moves a tutor may make on a booking assigned to them.
    pub fn tutor_can_move_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Paid, Confirmed)
                | (Paid, Declined)
                | (Confirmed, InProgress)
                | (Confirmed, Completed)
                | (InProgress, Completed)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub parent_id: Uuid,
    pub tutor_id: Uuid,
    pub subject: String,
    pub session_date: Date,
    pub session_time: Time,
    pub duration_hours: i32,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    pub hourly_rate: i64,
    pub total_amount: i64,
    pub commission: i64,
    pub tutor_earnings: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.parent_id == user_id || self.tutor_id == user_id
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
