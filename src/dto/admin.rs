use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::TutorProfile;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ApproveTutorRequest {
    /// Version the admin saw; a stale version is rejected with 409.
    pub expected_version: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectTutorRequest {
    /// Must be `true`; rejection is destructive for the tutor's submission.
    #[serde(default)]
    pub confirm: bool,
    pub reason: Option<String>,
    pub expected_version: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingTutor {
    pub full_name: String,
    pub email: String,
    pub profile: TutorProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingTutorList {
    pub items: Vec<PendingTutor>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DispatchReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    /// Rows another sender claimed first.
    pub skipped: usize,
}
