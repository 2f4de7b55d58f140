use std::collections::HashMap;

use chrono::{FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_audit,
    dto::bookings::{
        BookingDetail, BookingList, CreateBookingRequest, CreateReviewRequest, MarkPaidRequest,
        UpdateBookingStatusRequest,
    },
    entity::{
        bookings::{
            ActiveModel as BookingActive, BookingStatus, Column as BookingCol, Entity as Bookings,
            Model as BookingModel,
        },
        payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments, PaymentStatus,
        },
        profiles::{Column as ProfileCol, Entity as Profiles, Role},
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
        tutor_profiles::{Column as TutorCol, Entity as TutorProfiles},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::{Booking, Payment, Review},
    pricing::PriceBreakdown,
    response::{ApiResponse, Meta},
    routes::params::BookingListQuery,
    services::{notification_service, payment_service},
    state::AppState,
    templates,
};

const MINUTES_PER_DAY: u32 = 24 * 60;
/// Sessions are scheduled in Western Indonesia Time.
const WIB_OFFSET_SECS: i32 = 7 * 3600;
/// Recorded on payments settled through `mark_paid`, replacing whatever the gateway reported.
pub const MANUAL_PAYMENT_TYPE: &str = "manual";

pub async fn create_booking(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    ensure_role(user, Role::Parent)?;
    payload.validate()?;

    let subject = payload.subject.trim().to_string();
    if subject.is_empty() {
        return Err(AppError::BadRequest("subject is required".into()));
    }
    if session_end_minutes(payload.session_time, payload.duration_hours) > MINUTES_PER_DAY {
        return Err(AppError::BadRequest("Session must end before midnight".into()));
    }
    if !starts_in_future(payload.session_date, payload.session_time) {
        return Err(AppError::BadRequest("Session must start in the future".into()));
    }

    let txn = state.db().begin().await?;

    // Locking the tutor row serializes concurrent bookings for the same tutor.
    let tutor = TutorProfiles::find()
        .filter(TutorCol::UserId.eq(payload.tutor_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .filter(|t| t.is_active && t.is_onboarded)
        .ok_or_else(|| AppError::BadRequest("Tutor is not available for booking".into()))?;
    if !tutor.teaches(&subject) {
        return Err(AppError::BadRequest(format!(
            "Tutor does not teach {subject}"
        )));
    }

    let same_day = Bookings::find()
        .filter(BookingCol::TutorId.eq(payload.tutor_id))
        .filter(BookingCol::SessionDate.eq(payload.session_date))
        .filter(BookingCol::Status.is_in(BookingStatus::holding_slot()))
        .all(&txn)
        .await?;
    if same_day.iter().any(|b| {
        sessions_overlap(
            b.session_time,
            b.duration_hours,
            payload.session_time,
            payload.duration_hours,
        )
    }) {
        return Err(AppError::Conflict(
            "Tutor already has a booking at that time".into(),
        ));
    }

    let price = PriceBreakdown::compute(tutor.hourly_rate, payload.duration_hours);
    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        parent_id: Set(user.user_id),
        tutor_id: Set(payload.tutor_id),
        subject: Set(subject),
        session_date: Set(payload.session_date),
        session_time: Set(payload.session_time),
        duration_hours: Set(price.duration_hours),
        address: Set(payload.address.trim().to_string()),
        hourly_rate: Set(price.hourly_rate),
        total_amount: Set(price.total_amount),
        commission: Set(price.commission),
        tutor_earnings: Set(price.tutor_earnings),
        notes: Set(payload.notes.filter(|n| !n.trim().is_empty())),
        status: Set(BookingStatus::PendingPayment),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    tracing::info!(
        booking_id = %booking.id,
        tutor_id = %booking.tutor_id,
        total_amount = booking.total_amount,
        "booking created"
    );

    audit(
        state,
        user,
        "booking_create",
        serde_json::json!({ "booking_id": booking.id, "total_amount": booking.total_amount }),
    )
    .await;

    Ok(ApiResponse::ok("Booking created", Booking::from(booking)))
}

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Bookings::find();
    finder = match user.role {
        Role::Parent => finder.filter(BookingCol::ParentId.eq(user.user_id)),
        Role::Tutor => finder.filter(BookingCol::TutorId.eq(user.user_id)),
        Role::Admin => finder,
    };
    if let Some(status) = query.status {
        finder = finder.filter(BookingCol::Status.eq(status));
    }
    finder = finder
        .order_by_desc(BookingCol::SessionDate)
        .order_by_desc(BookingCol::SessionTime)
        .order_by_asc(BookingCol::Id);

    let total = finder.clone().count(state.db()).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?
        .into_iter()
        .map(Booking::from)
        .collect();

    Ok(ApiResponse::success(
        "Bookings",
        BookingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<BookingDetail>> {
    let booking = Bookings::find_by_id(id)
        .one(state.db())
        .await?
        .filter(|b| user.role == Role::Admin || b.involves(user.user_id))
        .ok_or(AppError::NotFound)?;

    let payments = Payments::find()
        .filter(PaymentCol::BookingId.eq(booking.id))
        .order_by_desc(PaymentCol::CreatedAt)
        .all(state.db())
        .await?
        .into_iter()
        .map(Payment::from)
        .collect();
    let review = Reviews::find()
        .filter(ReviewCol::BookingId.eq(booking.id))
        .one(state.db())
        .await?
        .map(Review::from);

    Ok(ApiResponse::ok(
        "Booking found",
        BookingDetail {
            booking: Booking::from(booking),
            payments,
            review,
        },
    ))
}

/// Tutor-driven moves: confirm or decline a paid booking, then run it to completion.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookingStatusRequest,
) -> AppResult<ApiResponse<Booking>> {
    ensure_role(user, Role::Tutor)?;

    let txn = state.db().begin().await?;
    let booking = Bookings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .filter(|b| b.tutor_id == user.user_id)
        .ok_or(AppError::NotFound)?;

    let from = booking.status;
    if !from.tutor_can_move_to(payload.status) {
        return Err(AppError::Conflict(format!(
            "Cannot move booking from {} to {}",
            from.as_str(),
            payload.status.as_str()
        )));
    }

    let mut active: BookingActive = booking.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().fixed_offset());
    let booking = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(booking_id = %id, from = from.as_str(), to = booking.status.as_str(), "booking status changed");
    audit(
        state,
        user,
        "booking_status_update",
        serde_json::json!({ "booking_id": id, "from": from, "to": booking.status }),
    )
    .await;

    Ok(ApiResponse::ok("Booking updated", Booking::from(booking)))
}

/// Manual settlement for environments without a live gateway.
/// Calling it again on a settled booking returns the booking unchanged.
pub async fn mark_paid(
    state: &AppState,
    user: &AuthUser,
    payload: MarkPaidRequest,
) -> AppResult<ApiResponse<Booking>> {
    if !state.config.allow_manual_payment {
        return Err(AppError::Forbidden);
    }
    ensure_role(user, Role::Parent)?;

    let txn = state.db().begin().await?;
    let booking = Bookings::find_by_id(payload.booking_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .filter(|b| b.parent_id == user.user_id)
        .ok_or(AppError::NotFound)?;

    match booking.status {
        BookingStatus::PendingPayment => {}
        BookingStatus::Cancelled | BookingStatus::Declined => {
            return Err(AppError::Conflict(format!(
                "Booking is {} and cannot be paid",
                booking.status.as_str()
            )));
        }
        _ => {
            return Ok(ApiResponse::ok("Booking already paid", Booking::from(booking)));
        }
    }

    let now = Utc::now().fixed_offset();
    let latest = Payments::find()
        .filter(PaymentCol::BookingId.eq(booking.id))
        .order_by_desc(PaymentCol::CreatedAt)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    match latest {
        Some(payment) if payment.status == PaymentStatus::Success => {}
        Some(payment) => {
            let mut active: PaymentActive = payment.into();
            active.status = Set(PaymentStatus::Success);
            active.payment_type = Set(Some(MANUAL_PAYMENT_TYPE.into()));
            active.paid_at = Set(Some(now));
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }
        None => {
            PaymentActive {
                id: Set(Uuid::new_v4()),
                booking_id: Set(booking.id),
                order_id: Set(payment_service::new_order_id(booking.id)),
                amount: Set(booking.total_amount),
                status: Set(PaymentStatus::Success),
                payment_type: Set(Some(MANUAL_PAYMENT_TYPE.into())),
                snap_token: Set(None),
                redirect_url: Set(None),
                paid_at: Set(Some(now)),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }

    let (booking, notification) = settle_booking(&txn, booking).await?;
    txn.commit().await?;
    notification_service::dispatch_after_commit(state, notification.into_iter().collect());

    tracing::info!(booking_id = %booking.id, "booking marked paid manually");
    audit(
        state,
        user,
        "booking_mark_paid",
        serde_json::json!({ "booking_id": booking.id }),
    )
    .await;

    Ok(ApiResponse::ok("Booking paid", Booking::from(booking)))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_role(user, Role::Parent)?;
    payload.validate()?;

    let txn = state.db().begin().await?;
    let booking = Bookings::find_by_id(booking_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .filter(|b| b.parent_id == user.user_id)
        .ok_or(AppError::NotFound)?;
    if booking.status != BookingStatus::Completed {
        return Err(AppError::Conflict(
            "Only completed bookings can be reviewed".into(),
        ));
    }
    if Reviews::find()
        .filter(ReviewCol::BookingId.eq(booking.id))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Booking has already been reviewed".into()));
    }

    let tutor = TutorProfiles::find()
        .filter(TutorCol::UserId.eq(booking.tutor_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking.id),
        tutor_id: Set(booking.tutor_id),
        parent_id: Set(user.user_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment.filter(|c| !c.trim().is_empty())),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let (rating, review_count) = running_average(tutor.rating, tutor.review_count, review.rating);
    TutorProfiles::update_many()
        .col_expr(TutorCol::Rating, Expr::value(rating))
        .col_expr(TutorCol::ReviewCount, Expr::value(review_count))
        .col_expr(TutorCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(TutorCol::Id.eq(tutor.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    audit(
        state,
        user,
        "booking_review",
        serde_json::json!({ "booking_id": booking.id, "rating": review.rating }),
    )
    .await;

    Ok(ApiResponse::ok("Review saved", Review::from(review)))
}

/// Flip a pending booking to paid and queue the tutor's notification.
/// Shared by the webhook and the manual path; must run inside their transaction.
pub(crate) async fn settle_booking<C: ConnectionTrait>(
    conn: &C,
    booking: BookingModel,
) -> AppResult<(BookingModel, Option<Uuid>)> {
    let now = Utc::now().fixed_offset();
    Bookings::update_many()
        .col_expr(BookingCol::Status, Expr::value(BookingStatus::Paid))
        .col_expr(BookingCol::UpdatedAt, Expr::value(now))
        .filter(BookingCol::Id.eq(booking.id))
        .filter(BookingCol::Status.eq(BookingStatus::PendingPayment))
        .exec(conn)
        .await?;

    let mut booking = booking;
    booking.status = BookingStatus::Paid;
    booking.updated_at = now;

    let accounts: HashMap<Uuid, _> = Profiles::find()
        .filter(ProfileCol::Id.is_in([booking.tutor_id, booking.parent_id]))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let notification = match accounts.get(&booking.tutor_id) {
        Some(tutor) => {
            let parent_name = accounts
                .get(&booking.parent_id)
                .map(|p| p.full_name.as_str())
                .unwrap_or("Orang tua");
            let draft =
                templates::booking_paid(&tutor.full_name, &tutor.email, parent_name, &booking)?;
            Some(notification_service::enqueue(conn, draft).await?)
        }
        None => {
            tracing::warn!(tutor_id = %booking.tutor_id, "paid booking has no tutor account row");
            None
        }
    };

    Ok((booking, notification))
}

/// Whether two same-day sessions share any minute. Touching ends do not overlap.
pub fn sessions_overlap(
    start_a: NaiveTime,
    hours_a: i32,
    start_b: NaiveTime,
    hours_b: i32,
) -> bool {
    let a_start = minutes_since_midnight(start_a);
    let b_start = minutes_since_midnight(start_b);
    let a_end = session_end_minutes(start_a, hours_a);
    let b_end = session_end_minutes(start_b, hours_b);
    a_start < b_end && b_start < a_end
}

/// New mean rating and count after one more review.
pub fn running_average(current: f64, count: i32, rating: i16) -> (f64, i32) {
    let next_count = count + 1;
    let total = current * f64::from(count) + f64::from(rating);
    (total / f64::from(next_count), next_count)
}

fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn session_end_minutes(start: NaiveTime, hours: i32) -> u32 {
    minutes_since_midnight(start) + hours.max(0) as u32 * 60
}

fn starts_in_future(date: NaiveDate, time: NaiveTime) -> bool {
    let Some(wib) = FixedOffset::east_opt(WIB_OFFSET_SECS) else {
        return true;
    };
    let now = Utc::now().with_timezone(&wib).naive_local();
    date.and_time(time) > now
}

async fn audit(state: &AppState, user: &AuthUser, action: &str, metadata: serde_json::Value) {
    if let Err(err) = log_audit(
        state.db(),
        Some(user.user_id),
        action,
        Some("bookings"),
        Some(metadata),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
