use serde::Serialize;
use utoipa::ToSchema;

/// Platform commission in percent of the booking total.
pub const COMMISSION_PERCENT: i64 = 15;

/// Price breakdown frozen onto a booking at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PriceBreakdown {
    pub hourly_rate: i64,
    pub duration_hours: i32,
    pub total_amount: i64,
    pub commission: i64,
    pub tutor_earnings: i64,
}

impl PriceBreakdown {
    /// Commission is rounded half-up to the nearest rupiah.
    pub fn compute(hourly_rate: i64, duration_hours: i32) -> Self {
        let total_amount = hourly_rate * i64::from(duration_hours);
        let commission = (total_amount * COMMISSION_PERCENT + 50).div_euclid(100);
        Self {
            hourly_rate,
            duration_hours,
            total_amount,
            commission,
            tutor_earnings: total_amount - commission,
        }
    }
}
