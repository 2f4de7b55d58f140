use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tutor_availability")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tutor_profile_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: i16,
    pub start_time: Time,
    pub end_time: Time,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tutor_profiles::Entity",
        from = "Column::TutorProfileId",
        to = "super::tutor_profiles::Column::Id"
    )]
    TutorProfiles,
}

impl Related<super::tutor_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TutorProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
