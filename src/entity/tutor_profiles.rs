use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

/// Approval state derived from the onboarded/active flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TutorStatus {
    Incomplete,
    Pending,
    Active,
}

impl TutorStatus {
    pub fn from_flags(is_onboarded: bool, is_active: bool) -> Self {
        match (is_onboarded, is_active) {
            (false, _) => TutorStatus::Incomplete,
            (true, false) => TutorStatus::Pending,
            (true, true) => TutorStatus::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TutorStatus::Incomplete => "incomplete",
            TutorStatus::Pending => "pending",
            TutorStatus::Active => "active",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tutor_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_onboarded: bool,

    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub nik: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    pub id_card_path: Option<String>,
    pub selfie_path: Option<String>,

    pub whatsapp: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
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

    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub approved_by: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,

    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn status(&self) -> TutorStatus {
        TutorStatus::from_flags(self.is_onboarded, self.is_active)
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::UserId",
        to = "super::profiles::Column::Id"
    )]
    Profiles,
    #[sea_orm(has_many = "super::tutor_availability::Entity")]
    TutorAvailability,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl Related<super::tutor_availability::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TutorAvailability.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
