use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::admin::{ApproveTutorRequest, PendingTutor, PendingTutorList, RejectTutorRequest},
    entity::{
        profiles::{Column as ProfileCol, Entity as Profiles},
        tutor_availability::{Column as AvailabilityCol, Entity as TutorAvailability},
        tutor_profiles::{Column as TutorCol, Entity as TutorProfiles, Model as TutorModel, TutorStatus},
        tutor_wallets::{ActiveModel as WalletActive, Column as WalletCol, Entity as TutorWallets},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::TutorProfile,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::notification_service,
    state::AppState,
    templates,
};

/// Submitted profiles waiting for review, oldest submission first.
pub async fn list_pending(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PendingTutorList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = TutorProfiles::find()
        .filter(
            Condition::all()
                .add(TutorCol::IsOnboarded.eq(true))
                .add(TutorCol::IsActive.eq(false)),
        )
        .order_by_asc(TutorCol::SubmittedAt)
        .order_by_asc(TutorCol::Id);

    let total = finder.clone().count(state.db()).await? as i64;
    let tutors = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?;

    if tutors.is_empty() {
        return Ok(ApiResponse::success(
            "Pending tutors",
            PendingTutorList { items: Vec::new() },
            Some(Meta::new(page, limit, total)),
        ));
    }

    let user_ids: Vec<Uuid> = tutors.iter().map(|t| t.user_id).collect();
    let profile_ids: Vec<Uuid> = tutors.iter().map(|t| t.id).collect();

    let accounts: HashMap<Uuid, _> = Profiles::find()
        .filter(ProfileCol::Id.is_in(user_ids))
        .all(state.db())
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut slots: HashMap<Uuid, Vec<_>> = HashMap::new();
    for slot in TutorAvailability::find()
        .filter(AvailabilityCol::TutorProfileId.is_in(profile_ids))
        .order_by_asc(AvailabilityCol::DayOfWeek)
        .order_by_asc(AvailabilityCol::StartTime)
        .all(state.db())
        .await?
    {
        slots.entry(slot.tutor_profile_id).or_default().push(slot);
    }

    let items = tutors
        .into_iter()
        .map(|tutor| {
            let account = accounts.get(&tutor.user_id);
            let availability = slots.remove(&tutor.id).unwrap_or_default();
            PendingTutor {
                full_name: account.map(|a| a.full_name.clone()).unwrap_or_default(),
                email: account.map(|a| a.email.clone()).unwrap_or_default(),
                profile: TutorProfile::from_entity(tutor, availability),
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "Pending tutors",
        PendingTutorList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Pending -> Active. The wallet is seeded and the approval email queued in the same transaction.
pub async fn approve(
    state: &AppState,
    user: &AuthUser,
    profile_id: Uuid,
    payload: ApproveTutorRequest,
) -> AppResult<ApiResponse<TutorProfile>> {
    ensure_admin(user)?;

    let txn = state.db().begin().await?;
    let tutor = load_pending(&txn, profile_id).await?;
    let expected_version = payload.expected_version.unwrap_or(tutor.version);
    let now = Utc::now().fixed_offset();

    let result = TutorProfiles::update_many()
        .col_expr(TutorCol::IsActive, Expr::value(true))
        .col_expr(TutorCol::IsVerified, Expr::value(true))
        .col_expr(TutorCol::ApprovedAt, Expr::value(Some(now)))
        .col_expr(TutorCol::ApprovedBy, Expr::value(Some(user.user_id)))
        .col_expr(TutorCol::RejectionReason, Expr::value(Option::<String>::None))
        .col_expr(TutorCol::Version, Expr::col(TutorCol::Version).add(1))
        .col_expr(TutorCol::UpdatedAt, Expr::value(now))
        .filter(pending_with_version(profile_id, expected_version))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(stale_review());
    }

    let wallet = WalletActive {
        id: Set(Uuid::new_v4()),
        tutor_id: Set(tutor.user_id),
        balance: Set(0),
        total_earned: Set(0),
        ..Default::default()
    };
    TutorWallets::insert(wallet)
        .on_conflict(OnConflict::column(WalletCol::TutorId).do_nothing().to_owned())
        .exec_without_returning(&txn)
        .await?;

    let mut notifications = Vec::new();
    match Profiles::find_by_id(tutor.user_id).one(&txn).await? {
        Some(account) => {
            let draft = templates::tutor_approved(
                &account.full_name,
                &account.email,
                &state.config.base_url,
            )?;
            notifications.push(notification_service::enqueue(&txn, draft).await?);
        }
        None => tracing::warn!(user_id = %tutor.user_id, "approved tutor has no account row"),
    }

    txn.commit().await?;
    notification_service::dispatch_after_commit(state, notifications);
    tracing::info!(tutor_profile_id = %profile_id, admin_id = %user.user_id, "tutor approved");

    let mut approved = tutor;
    approved.is_active = true;
    approved.is_verified = true;
    approved.approved_at = Some(now);
    approved.approved_by = Some(user.user_id);
    approved.rejection_reason = None;
    approved.version = expected_version + 1;
    approved.updated_at = now;

    if let Err(err) = log_audit(
        state.db(),
        Some(user.user_id),
        "tutor_approve",
        Some("tutor_profiles"),
        Some(serde_json::json!({ "tutor_profile_id": profile_id, "user_id": approved.user_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Tutor approved",
        TutorProfile::from_entity(approved, Vec::new()),
    ))
}

/// Pending -> Incomplete so the tutor can fix and resubmit.
pub async fn reject(
    state: &AppState,
    user: &AuthUser,
    profile_id: Uuid,
    payload: RejectTutorRequest,
) -> AppResult<ApiResponse<TutorProfile>> {
    ensure_admin(user)?;
    if !payload.confirm {
        return Err(AppError::BadRequest(
            "Rejection must be confirmed with \"confirm\": true".into(),
        ));
    }
    let reason = payload
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let txn = state.db().begin().await?;
    let tutor = load_pending(&txn, profile_id).await?;
    let expected_version = payload.expected_version.unwrap_or(tutor.version);
    let now = Utc::now().fixed_offset();

    let result = TutorProfiles::update_many()
        .col_expr(TutorCol::IsOnboarded, Expr::value(false))
        .col_expr(TutorCol::IsActive, Expr::value(false))
        .col_expr(TutorCol::RejectionReason, Expr::value(reason.clone()))
        .col_expr(TutorCol::Version, Expr::col(TutorCol::Version).add(1))
        .col_expr(TutorCol::UpdatedAt, Expr::value(now))
        .filter(pending_with_version(profile_id, expected_version))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(stale_review());
    }

    let mut notifications = Vec::new();
    if let Some(account) = Profiles::find_by_id(tutor.user_id).one(&txn).await? {
        let draft =
            templates::tutor_rejected(&account.full_name, &account.email, reason.as_deref())?;
        notifications.push(notification_service::enqueue(&txn, draft).await?);
    }

    txn.commit().await?;
    notification_service::dispatch_after_commit(state, notifications);
    tracing::info!(tutor_profile_id = %profile_id, admin_id = %user.user_id, "tutor rejected");

    let mut rejected = tutor;
    rejected.is_onboarded = false;
    rejected.is_active = false;
    rejected.rejection_reason = reason.clone();
    rejected.version = expected_version + 1;
    rejected.updated_at = now;

    if let Err(err) = log_audit(
        state.db(),
        Some(user.user_id),
        "tutor_reject",
        Some("tutor_profiles"),
        Some(serde_json::json!({ "tutor_profile_id": profile_id, "reason": reason })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(
        "Tutor rejected",
        TutorProfile::from_entity(rejected, Vec::new()),
    ))
}

async fn load_pending(txn: &DatabaseTransaction, profile_id: Uuid) -> AppResult<TutorModel> {
    let tutor = TutorProfiles::find_by_id(profile_id)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if tutor.status() != TutorStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Tutor profile is {} and cannot be reviewed",
            tutor.status().as_str()
        )));
    }
    Ok(tutor)
}

/// Matches only while the row is still pending at the version the reviewer saw.
fn pending_with_version(profile_id: Uuid, version: i32) -> Condition {
    Condition::all()
        .add(TutorCol::Id.eq(profile_id))
        .add(TutorCol::Version.eq(version))
        .add(TutorCol::IsOnboarded.eq(true))
        .add(TutorCol::IsActive.eq(false))
}

fn stale_review() -> AppError {
    AppError::Conflict("Tutor profile was changed by someone else, reload and try again".into())
}
