use chrono::{Duration, Utc};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    dto::admin::DispatchReport,
    entity::notification_outbox::{
        ActiveModel as OutboxActive, Column as OutboxCol, Entity as Outbox, Model as OutboxModel,
        OutboxStatus,
    },
    error::AppResult,
    integrations::mailer::EmailMessage,
    middleware::auth::{AuthUser, ensure_admin},
    models::Notification,
    response::{ApiResponse, Meta},
    routes::params::NotificationListQuery,
    state::AppState,
    templates::NotificationDraft,
};

/// How long a sender may hold a row before another sender can retry it.
const CLAIM_LEASE_SECS: i64 = 120;

/// Persist a notification next to the state change that caused it.
/// Call with the same transaction as the change.
pub async fn enqueue<C: ConnectionTrait>(conn: &C, draft: NotificationDraft) -> AppResult<Uuid> {
    let id = Uuid::new_v4();
    let row = OutboxActive {
        id: Set(id),
        kind: Set(draft.kind.to_string()),
        recipient: Set(draft.recipient),
        subject: Set(draft.subject),
        html: Set(draft.html),
        status: Set(OutboxStatus::Pending),
        attempts: Set(0),
        last_error: Set(None),
        provider_id: Set(None),
        created_at: NotSet,
        sent_at: Set(None),
        claimed_until: Set(None),
    };
    Outbox::insert(row).exec_without_returning(conn).await?;
    tracing::debug!(notification_id = %id, kind = draft.kind, "notification enqueued");
    Ok(id)
}

/// Try to deliver the given notifications in the background once the caller has committed.
pub fn dispatch_after_commit(state: &AppState, ids: Vec<Uuid>) {
    if ids.is_empty() || !state.config.outbox.dispatch_on_commit {
        return;
    }
    let state = state.clone();
    tokio::spawn(async move {
        for id in ids {
            if let Err(err) = dispatch_one(&state, id).await {
                tracing::warn!(error = %err, notification_id = %id, "notification dispatch failed");
            }
        }
    });
}

/// Deliver one notification if it is still pending and unclaimed. Returns whether it was sent.
pub async fn dispatch_one(state: &AppState, id: Uuid) -> AppResult<bool> {
    let row = Outbox::find_by_id(id).one(state.db()).await?;
    match row {
        Some(row) if row.status == OutboxStatus::Pending => {
            if !claim(state, row.id).await? {
                return Ok(false);
            }
            deliver(state, row).await
        }
        _ => Ok(false),
    }
}

/// Deliver a batch of due notifications, oldest first.
pub async fn dispatch_pending(state: &AppState) -> AppResult<DispatchReport> {
    let outbox = &state.config.outbox;
    let now = Utc::now().fixed_offset();
    let due = Outbox::find()
        .filter(
            Condition::all()
                .add(OutboxCol::Status.eq(OutboxStatus::Pending))
                .add(OutboxCol::Attempts.lt(outbox.max_attempts))
                .add(unclaimed_at(now)),
        )
        .order_by_asc(OutboxCol::CreatedAt)
        .limit(outbox.batch_size)
        .all(state.db())
        .await?;

    let mut report = DispatchReport::default();
    for row in due {
        if !claim(state, row.id).await? {
            report.skipped += 1;
            continue;
        }
        report.attempted += 1;
        if deliver(state, row).await? {
            report.sent += 1;
        } else {
            report.failed += 1;
        }
    }

    if report.attempted > 0 || report.skipped > 0 {
        tracing::info!(
            attempted = report.attempted,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "outbox dispatch finished"
        );
    }
    Ok(report)
}

fn unclaimed_at(now: DateTimeWithTimeZone) -> Condition {
    Condition::any()
        .add(OutboxCol::ClaimedUntil.is_null())
        .add(OutboxCol::ClaimedUntil.lt(now))
}

/// Take the delivery lease on a pending row. Only one sender wins; a lease left
/// behind by a crashed sender expires after `CLAIM_LEASE_SECS`.
async fn claim(state: &AppState, id: Uuid) -> AppResult<bool> {
    let now = Utc::now().fixed_offset();
    let claimed = Outbox::update_many()
        .col_expr(
            OutboxCol::ClaimedUntil,
            Expr::value(now + Duration::seconds(CLAIM_LEASE_SECS)),
        )
        .filter(OutboxCol::Id.eq(id))
        .filter(OutboxCol::Status.eq(OutboxStatus::Pending))
        .filter(unclaimed_at(now))
        .exec(state.db())
        .await?;
    Ok(claimed.rows_affected == 1)
}

async fn deliver(state: &AppState, row: OutboxModel) -> AppResult<bool> {
    let message = EmailMessage {
        to: row.recipient.clone(),
        subject: row.subject.clone(),
        html: row.html.clone(),
    };
    let attempts = row.attempts + 1;
    let released = Expr::value(Option::<DateTimeWithTimeZone>::None);

    match state.mailer.send(&message).await {
        Ok(provider_id) => {
            Outbox::update_many()
                .col_expr(OutboxCol::Status, Expr::value(OutboxStatus::Sent))
                .col_expr(OutboxCol::Attempts, Expr::value(attempts))
                .col_expr(OutboxCol::ProviderId, Expr::value(Some(provider_id)))
                .col_expr(OutboxCol::LastError, Expr::value(Option::<String>::None))
                .col_expr(OutboxCol::SentAt, Expr::value(Utc::now().fixed_offset()))
                .col_expr(OutboxCol::ClaimedUntil, released)
                .filter(OutboxCol::Id.eq(row.id))
                .exec(state.db())
                .await?;
            Ok(true)
        }
        Err(err) => {
            let status = if attempts >= state.config.outbox.max_attempts {
                OutboxStatus::Failed
            } else {
                OutboxStatus::Pending
            };
            tracing::warn!(
                error = %err,
                notification_id = %row.id,
                attempts,
                "notification delivery failed"
            );
            Outbox::update_many()
                .col_expr(OutboxCol::Status, Expr::value(status))
                .col_expr(OutboxCol::Attempts, Expr::value(attempts))
                .col_expr(OutboxCol::LastError, Expr::value(Some(err.to_string())))
                .col_expr(OutboxCol::ClaimedUntil, released)
                .filter(OutboxCol::Id.eq(row.id))
                .exec(state.db())
                .await?;
            Ok(false)
        }
    }
}

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    query: NotificationListQuery,
) -> AppResult<ApiResponse<Vec<Notification>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Outbox::find();
    if let Some(status) = query.status {
        finder = finder.filter(OutboxCol::Status.eq(status));
    }
    finder = finder.order_by_desc(OutboxCol::CreatedAt);

    let total = finder.clone().count(state.db()).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?
        .into_iter()
        .map(Notification::from)
        .collect();

    Ok(ApiResponse::success(
        "Notifications",
        items,
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn dispatch_now(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DispatchReport>> {
    ensure_admin(user)?;
    let report = dispatch_pending(state).await?;
    Ok(ApiResponse::ok("Dispatch finished", report))
}
