use chrono::NaiveDate;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::{PublicTutor, TutorProfile};

/// Everything a tutor submits for review, in one request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OnboardingRequest {
    #[validate(length(min = 3, max = 100))]
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, max = 20))]
    pub gender: String,
    #[validate(length(equal = 16), custom(function = "digits_only"))]
    #[schema(example = "3171234567890001")]
    pub nik: String,
    #[validate(length(min = 20, max = 2000))]
    pub bio: String,

    /// Storage-relative path of the uploaded identity card.
    #[validate(length(min = 1))]
    pub id_card_path: String,
    /// Storage-relative path of the uploaded selfie holding the identity card.
    #[validate(length(min = 1))]
    pub selfie_path: String,

    #[validate(length(min = 9, max = 20), custom(function = "digits_only"))]
    pub whatsapp: String,
    #[validate(length(min = 5, max = 500))]
    pub address: String,
    pub village_id: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[validate(length(min = 1, max = 42), nested)]
    pub availability: Vec<AvailabilityInput>,

    #[validate(length(min = 1, max = 50))]
    pub education_level: String,
    #[validate(length(min = 1, max = 150))]
    pub institution: String,
    #[validate(length(min = 1, max = 150))]
    pub major: String,
    #[validate(length(min = 1, max = 10))]
    pub subjects: Vec<String>,
    #[validate(range(min = 10000, max = 10000000))]
    pub hourly_rate: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "slot_is_ordered"))]
pub struct AvailabilityInput {
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: i16,
    #[schema(value_type = String, example = "15:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "17:00:00")]
    pub end_time: NaiveTime,
}

fn digits_only(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("digits_only"))
    }
}

fn slot_is_ordered(slot: &AvailabilityInput) -> Result<(), ValidationError> {
    if slot.start_time < slot.end_time {
        Ok(())
    } else {
        Err(ValidationError::new("start_before_end"))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TutorMe {
    pub full_name: String,
    pub email: String,
    pub profile: TutorProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicTutorDetail {
    pub tutor: PublicTutor,
}
