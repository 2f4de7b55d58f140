use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TutorSearchQuery {
    /// Subject the tutor must teach.
    pub subject: Option<String>,
    #[serde(alias = "villageId")]
    pub village_id: Option<String>,
    /// Fallback tier used when the village has no tutors.
    #[serde(alias = "districtId")]
    pub district_id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Maximum distance in kilometers for GPS search.
    #[serde(alias = "maxDistance")]
    pub max_distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Gps,
    Village,
    District,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TutorSearchHit {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub subjects: Vec<String>,
    pub hourly_rate: i64,
    pub rating: f64,
    pub review_count: i32,
    pub village_id: Option<String>,
    pub district_id: Option<String>,
    pub distance_km: Option<f64>,
    pub expanded_search: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TutorSearchResult {
    pub subject: String,
    pub mode: SearchMode,
    pub used_gps: bool,
    pub expanded: bool,
    pub max_distance_km: Option<f64>,
    pub tutors: Vec<TutorSearchHit>,
}
