use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::tutors::{AvailabilityInput, OnboardingRequest, PublicTutorDetail, TutorMe},
    entity::{
        cities::Entity as Cities,
        districts::Entity as Districts,
        profiles::{ActiveModel as ProfileActive, Entity as Profiles, Role},
        tutor_availability::{
            ActiveModel as AvailabilityActive, Column as AvailabilityCol,
            Entity as TutorAvailability, Model as AvailabilityModel,
        },
        tutor_profiles::{
            ActiveModel as TutorActive, Column as TutorCol, Entity as TutorProfiles,
            Model as TutorModel, TutorStatus,
        },
        tutor_wallets::{Column as WalletCol, Entity as TutorWallets},
        villages::Entity as Villages,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::{AvailabilitySlot, PublicTutor, TutorProfile, TutorWallet},
    response::ApiResponse,
    state::AppState,
};

/// Administrative units resolved from a village id through the stored parent keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub province_id: String,
    pub city_id: String,
    pub district_id: String,
    pub village_id: String,
}

pub async fn get_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<TutorMe>> {
    ensure_role(user, Role::Tutor)?;

    let account = Profiles::find_by_id(user.user_id)
        .one(state.db())
        .await?
        .ok_or(AppError::NotFound)?;
    let tutor = ensure_profile(state.db(), user.user_id).await?;
    let availability = load_availability(state.db(), tutor.id).await?;

    Ok(ApiResponse::ok(
        "Tutor profile",
        TutorMe {
            full_name: account.full_name,
            email: account.email,
            profile: TutorProfile::from_entity(tutor, availability),
        },
    ))
}

/// Move an incomplete profile to pending review.
pub async fn submit_onboarding(
    state: &AppState,
    user: &AuthUser,
    payload: OnboardingRequest,
) -> AppResult<ApiResponse<TutorProfile>> {
    ensure_role(user, Role::Tutor)?;
    payload.validate()?;

    let village_id = payload
        .village_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let coordinates = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "latitude and longitude must be provided together".into(),
            ));
        }
    };
    if village_id.is_none() && coordinates.is_none() {
        return Err(AppError::BadRequest(
            "either village_id or latitude/longitude is required".into(),
        ));
    }

    let subjects = normalize_subjects(&payload.subjects);
    if subjects.is_empty() {
        return Err(AppError::BadRequest("at least one subject is required".into()));
    }

    let txn = state.db().begin().await?;

    let existing = TutorProfiles::find()
        .filter(TutorCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let tutor = match existing {
        Some(tutor) => tutor,
        None => empty_profile(user.user_id).insert(&txn).await?,
    };

    if tutor.status() != TutorStatus::Incomplete {
        return Err(AppError::Conflict(
            "Profile has already been submitted".into(),
        ));
    }

    let location = match &village_id {
        Some(village_id) => Some(resolve_village(&txn, village_id).await?),
        None => None,
    };

    ProfileActive {
        id: Set(user.user_id),
        full_name: Set(payload.full_name.trim().to_string()),
        phone: Set(Some(payload.whatsapp.clone())),
        ..Default::default()
    }
    .update(&txn)
    .await?;

    let now = Utc::now().fixed_offset();
    let version = tutor.version;
    let profile_id = tutor.id;
    let mut active: TutorActive = tutor.into();
    active.date_of_birth = Set(Some(payload.date_of_birth));
    active.gender = Set(Some(payload.gender));
    active.nik = Set(Some(payload.nik));
    active.bio = Set(Some(payload.bio));
    active.id_card_path = Set(Some(payload.id_card_path));
    active.selfie_path = Set(Some(payload.selfie_path));
    active.whatsapp = Set(Some(payload.whatsapp));
    active.address = Set(Some(payload.address));
    active.latitude = Set(coordinates.map(|(lat, _)| lat));
    active.longitude = Set(coordinates.map(|(_, lng)| lng));
    active.province_id = Set(location.as_ref().map(|l| l.province_id.clone()));
    active.city_id = Set(location.as_ref().map(|l| l.city_id.clone()));
    active.district_id = Set(location.as_ref().map(|l| l.district_id.clone()));
    active.village_id = Set(location.as_ref().map(|l| l.village_id.clone()));
    active.education_level = Set(Some(payload.education_level));
    active.institution = Set(Some(payload.institution));
    active.major = Set(Some(payload.major));
    active.subjects = Set(subjects);
    active.hourly_rate = Set(payload.hourly_rate);
    active.is_onboarded = Set(true);
    active.is_active = Set(false);
    active.submitted_at = Set(Some(now));
    active.rejection_reason = Set(None);
    active.version = Set(version + 1);
    active.updated_at = Set(now);
    let tutor = active.update(&txn).await?;

    let availability = replace_availability(&txn, profile_id, &payload.availability).await?;

    txn.commit().await?;
    tracing::info!(tutor_profile_id = %profile_id, user_id = %user.user_id, "tutor submitted onboarding");

    Ok(ApiResponse::ok(
        "Profile submitted for review",
        TutorProfile::from_entity(tutor, availability),
    ))
}

pub async fn get_public_tutor(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<PublicTutorDetail>> {
    let tutor = TutorProfiles::find()
        .filter(TutorCol::UserId.eq(user_id))
        .filter(TutorCol::IsActive.eq(true))
        .filter(TutorCol::IsOnboarded.eq(true))
        .one(state.db())
        .await?
        .ok_or(AppError::NotFound)?;
    let account = Profiles::find_by_id(user_id).one(state.db()).await?;
    let availability = load_availability(state.db(), tutor.id).await?;

    let tutor = PublicTutor {
        user_id: tutor.user_id,
        profile_id: tutor.id,
        full_name: account.as_ref().map(|a| a.full_name.clone()).unwrap_or_default(),
        avatar_url: account.and_then(|a| a.avatar_url),
        bio: tutor.bio,
        education_level: tutor.education_level,
        institution: tutor.institution,
        subjects: tutor.subjects,
        hourly_rate: tutor.hourly_rate,
        rating: tutor.rating,
        review_count: tutor.review_count,
        province_id: tutor.province_id,
        city_id: tutor.city_id,
        district_id: tutor.district_id,
        village_id: tutor.village_id,
        availability: availability.into_iter().map(AvailabilitySlot::from).collect(),
    };

    Ok(ApiResponse::ok("Tutor", PublicTutorDetail { tutor }))
}

pub async fn get_wallet(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<TutorWallet>> {
    ensure_role(user, Role::Tutor)?;
    let wallet = TutorWallets::find()
        .filter(WalletCol::TutorId.eq(user.user_id))
        .one(state.db())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok("Wallet", TutorWallet::from(wallet)))
}

/// Load the tutor's profile, creating the empty one on first access.
pub async fn ensure_profile<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<TutorModel> {
    let existing = TutorProfiles::find()
        .filter(TutorCol::UserId.eq(user_id))
        .one(conn)
        .await?;
    match existing {
        Some(tutor) => Ok(tutor),
        None => Ok(empty_profile(user_id).insert(conn).await?),
    }
}

pub async fn resolve_village<C: ConnectionTrait>(
    conn: &C,
    village_id: &str,
) -> AppResult<ResolvedLocation> {
    let unknown = || AppError::BadRequest(format!("Unknown village {village_id}"));

    let village = Villages::find_by_id(village_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(unknown)?;
    let district = Districts::find_by_id(village.district_id.clone())
        .one(conn)
        .await?
        .ok_or_else(unknown)?;
    let city = Cities::find_by_id(district.city_id.clone())
        .one(conn)
        .await?
        .ok_or_else(unknown)?;

    Ok(ResolvedLocation {
        province_id: city.province_id,
        city_id: city.id,
        district_id: district.id,
        village_id: village.id,
    })
}

pub async fn load_availability<C: ConnectionTrait>(
    conn: &C,
    tutor_profile_id: Uuid,
) -> AppResult<Vec<AvailabilityModel>> {
    Ok(TutorAvailability::find()
        .filter(AvailabilityCol::TutorProfileId.eq(tutor_profile_id))
        .order_by_asc(AvailabilityCol::DayOfWeek)
        .order_by_asc(AvailabilityCol::StartTime)
        .all(conn)
        .await?)
}

/// Trim, drop blanks and duplicates, keep the submitted order.
pub fn normalize_subjects(raw: &[String]) -> Vec<String> {
    let mut subjects: Vec<String> = Vec::with_capacity(raw.len());
    for subject in raw {
        let subject = subject.trim();
        if !subject.is_empty() && !subjects.iter().any(|s| s == subject) {
            subjects.push(subject.to_string());
        }
    }
    subjects
}

async fn replace_availability<C: ConnectionTrait>(
    conn: &C,
    tutor_profile_id: Uuid,
    slots: &[AvailabilityInput],
) -> AppResult<Vec<AvailabilityModel>> {
    TutorAvailability::delete_many()
        .filter(AvailabilityCol::TutorProfileId.eq(tutor_profile_id))
        .exec(conn)
        .await?;

    let rows: Vec<AvailabilityModel> = slots
        .iter()
        .map(|slot| AvailabilityModel {
            id: Uuid::new_v4(),
            tutor_profile_id,
            day_of_week: slot.day_of_week,
            start_time: slot.start_time,
            end_time: slot.end_time,
        })
        .collect();

    let actives = rows.iter().cloned().map(|row| AvailabilityActive {
        id: Set(row.id),
        tutor_profile_id: Set(row.tutor_profile_id),
        day_of_week: Set(row.day_of_week),
        start_time: Set(row.start_time),
        end_time: Set(row.end_time),
    });
    TutorAvailability::insert_many(actives)
        .exec_without_returning(conn)
        .await?;

    Ok(rows)
}

fn empty_profile(user_id: Uuid) -> TutorActive {
    TutorActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        is_verified: Set(false),
        is_active: Set(false),
        is_onboarded: Set(false),
        date_of_birth: Set(None),
        gender: Set(None),
        nik: Set(None),
        bio: Set(None),
        id_card_path: Set(None),
        selfie_path: Set(None),
        whatsapp: Set(None),
        address: Set(None),
        latitude: Set(None),
        longitude: Set(None),
        province_id: Set(None),
        city_id: Set(None),
        district_id: Set(None),
        village_id: Set(None),
        education_level: Set(None),
        institution: Set(None),
        major: Set(None),
        subjects: Set(Vec::new()),
        hourly_rate: Set(0),
        rating: Set(0.0),
        review_count: Set(0),
        submitted_at: Set(None),
        approved_at: Set(None),
        approved_by: Set(None),
        rejection_reason: Set(None),
        version: Set(1),
        created_at: NotSet,
        updated_at: NotSet,
    }
}
