mod common;

use chrono::{NaiveDate, NaiveTime};
use lesgo_api::{
    config::AppConfig,
    dto::{
        bookings::{CreateBookingRequest, MarkPaidRequest, UpdateBookingStatusRequest},
        payments::{CreatePaymentRequest, GatewayNotification},
    },
    entity::{
        bookings::{self, BookingStatus},
        payments::{self, PaymentStatus},
        profiles::Role,
    },
    error::AppError,
    integrations::midtrans::notification_signature,
    services::{booking_service, payment_service},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

use common::{
    FakeGateway, RecordingMailer, account, active_tutor, booking, exec, harness, harness_with,
    locked_tables, parent, payment, transaction_log, tutor_user,
};

fn booking_request(tutor_id: Uuid, hour: u32) -> CreateBookingRequest {
    CreateBookingRequest {
        tutor_id,
        subject: "Matematika".into(),
        session_date: NaiveDate::from_ymd_opt(2099, 3, 14).unwrap(),
        session_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        duration_hours: 2,
        address: "Jl. Kebon Sirih 10".into(),
        notes: None,
    }
}

#[tokio::test]
async fn booking_freezes_the_price_breakdown() {
    let caller = parent();
    let tutor = active_tutor(Uuid::new_v4());
    let created = booking(caller.user_id, tutor.user_id, BookingStatus::PendingPayment);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tutor.clone()]])
        .append_query_results([Vec::<bookings::Model>::new()])
        .append_query_results([vec![created.clone()]])
        .into_connection();
    let h = harness(db);

    let resp = booking_service::create_booking(&h.state, &caller, booking_request(tutor.user_id, 15))
        .await
        .unwrap();
    let booking = resp.data.unwrap();

    assert_eq!(booking.status, BookingStatus::PendingPayment);
    assert_eq!(booking.total_amount, 150000);
    assert_eq!(booking.commission, 22500);
    assert_eq!(booking.tutor_earnings, 127500);
}

#[tokio::test]
async fn overlapping_booking_is_a_conflict() {
    let caller = parent();
    let tutor = active_tutor(Uuid::new_v4());
    // existing 15:00-17:00, requested 16:00-18:00
    let existing = booking(Uuid::new_v4(), tutor.user_id, BookingStatus::Paid);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tutor.clone()]])
        .append_query_results([vec![existing]])
        .into_connection();
    let h = harness(db);

    let err = booking_service::create_booking(&h.state, &caller, booking_request(tutor.user_id, 16))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn subject_must_be_taught_by_the_tutor() {
    let caller = parent();
    let tutor = active_tutor(Uuid::new_v4());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tutor.clone()]])
        .into_connection();
    let h = harness(db);

    let mut request = booking_request(tutor.user_id, 15);
    request.subject = "Biologi".into();
    let err = booking_service::create_booking(&h.state, &caller, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn sessions_past_midnight_are_rejected_before_touching_the_db() {
    let h = harness(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let err = booking_service::create_booking(&h.state, &parent(), booking_request(Uuid::new_v4(), 23))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn mark_paid_is_idempotent() {
    let caller = parent();
    let tutor_id = Uuid::new_v4();
    let pending = booking(caller.user_id, tutor_id, BookingStatus::PendingPayment);
    let mut settled = payment(&pending, PaymentStatus::Success);
    settled.payment_type = Some("manual".into());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending.clone()]])
        .append_query_results([Vec::<payments::Model>::new()])
        .append_query_results([vec![settled]])
        .append_exec_results([exec(1)])
        .append_query_results([vec![
            account(tutor_id, "Sari Wulandari", Role::Tutor),
            account(caller.user_id, "Ibu Rina", Role::Parent),
        ]])
        .append_exec_results([exec(1)])
        .into_connection();
    let h = harness(db);

    let first = booking_service::mark_paid(
        &h.state,
        &caller,
        MarkPaidRequest {
            booking_id: pending.id,
        },
    )
    .await
    .unwrap();
    assert_eq!(first.data.unwrap().status, BookingStatus::Paid);
    let log = format!("{:?}", transaction_log(h.state));
    assert_eq!(locked_tables(&log), ["bookings", "payments"]);
    assert!(log.contains(r#"String(Some("manual"))"#));

    // Second call sees the booking already paid.
    let mut paid = pending.clone();
    paid.status = BookingStatus::Paid;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![paid]])
        .into_connection();
    let again = harness(db);

    let second = booking_service::mark_paid(
        &again.state,
        &caller,
        MarkPaidRequest {
            booking_id: pending.id,
        },
    )
    .await
    .unwrap();
    assert_eq!(second.data.unwrap().status, BookingStatus::Paid);

    let log = format!("{:?}", transaction_log(again.state));
    assert!(!log.contains("INSERT"));
    assert!(!log.contains(r#"UPDATE \"bookings\""#));
}

#[tokio::test]
async fn manual_settlement_of_a_checkout_is_recorded_as_manual() {
    let caller = parent();
    let tutor_id = Uuid::new_v4();
    let pending = booking(caller.user_id, tutor_id, BookingStatus::PendingPayment);
    let mut open = payment(&pending, PaymentStatus::Pending);
    open.payment_type = Some("bank_transfer".into());
    let mut settled = open.clone();
    settled.status = PaymentStatus::Success;
    settled.payment_type = Some("manual".into());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending.clone()]])
        .append_query_results([vec![open]])
        .append_query_results([vec![settled]])
        .append_exec_results([exec(1)])
        .append_query_results([vec![account(tutor_id, "Sari Wulandari", Role::Tutor)]])
        .append_exec_results([exec(1)])
        .into_connection();
    let h = harness(db);

    let paid = booking_service::mark_paid(
        &h.state,
        &caller,
        MarkPaidRequest {
            booking_id: pending.id,
        },
    )
    .await
    .unwrap();
    assert_eq!(paid.data.unwrap().status, BookingStatus::Paid);

    let log = format!("{:?}", transaction_log(h.state));
    assert!(log.contains(r#"UPDATE \"payments\""#));
    assert!(log.contains(r#"String(Some("manual"))"#));
    assert!(!log.contains("bank_transfer"));
}

#[tokio::test]
async fn mark_paid_is_refused_when_disabled() {
    let mut config = AppConfig::for_tests();
    config.allow_manual_payment = false;
    let h = harness_with(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        config,
        RecordingMailer::default(),
        FakeGateway::default(),
    );

    let err = booking_service::mark_paid(
        &h.state,
        &parent(),
        MarkPaidRequest {
            booking_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn tutor_cannot_confirm_an_unpaid_booking() {
    let tutor = tutor_user();
    let unpaid = booking(Uuid::new_v4(), tutor.user_id, BookingStatus::PendingPayment);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![unpaid.clone()]])
        .into_connection();
    let h = harness(db);

    let err = booking_service::update_status(
        &h.state,
        &tutor,
        unpaid.id,
        UpdateBookingStatusRequest {
            status: BookingStatus::Confirmed,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn checkout_sends_the_booking_total_to_the_gateway() {
    let caller = parent();
    let pending = booking(caller.user_id, Uuid::new_v4(), BookingStatus::PendingPayment);
    let mut stored = payment(&pending, PaymentStatus::Pending);
    stored.order_id = "LESGO-STORED-1".into();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending.clone()]])
        .append_query_results([Vec::<payments::Model>::new()])
        .append_query_results([vec![account(caller.user_id, "Ibu Rina", Role::Parent)]])
        .append_query_results([vec![stored]])
        .into_connection();
    let h = harness(db);

    let resp = payment_service::create_payment(
        &h.state,
        &caller,
        CreatePaymentRequest {
            booking_id: pending.id,
        },
    )
    .await
    .unwrap();
    let checkout = resp.data.unwrap();
    assert_eq!(checkout.token, "snap-token");
    assert_eq!(checkout.payment.status, PaymentStatus::Pending);

    let requests = h.gateway.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].transaction_details.gross_amount, 150000);
    assert!(requests[0].transaction_details.order_id.starts_with("LESGO-"));
    assert_eq!(requests[0].customer_details.first_name, "Ibu Rina");
}

#[tokio::test]
async fn gateway_failure_is_a_generic_payment_error() {
    let caller = parent();
    let pending = booking(caller.user_id, Uuid::new_v4(), BookingStatus::PendingPayment);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![pending.clone()]])
        .append_query_results([Vec::<payments::Model>::new()])
        .append_query_results([vec![account(caller.user_id, "Ibu Rina", Role::Parent)]])
        .into_connection();
    let h = harness_with(
        db,
        AppConfig::for_tests(),
        RecordingMailer::default(),
        FakeGateway {
            fail: true,
            ..Default::default()
        },
    );

    let err = payment_service::create_payment(
        &h.state,
        &caller,
        CreatePaymentRequest {
            booking_id: pending.id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Payment(_)));
    assert_eq!(err.status().as_u16(), 502);
    assert_eq!(err.to_string(), "Payment failed, please try again");
}

fn settlement(order_id: &str, server_key: &str) -> GatewayNotification {
    GatewayNotification {
        order_id: order_id.into(),
        transaction_status: "settlement".into(),
        payment_type: Some("bank_transfer".into()),
        status_code: Some("200".into()),
        gross_amount: Some("150000.00".into()),
        signature_key: Some(notification_signature(order_id, "200", "150000.00", server_key)),
        fraud_status: None,
    }
}

#[tokio::test]
async fn settlement_marks_the_booking_paid() {
    let parent_id = Uuid::new_v4();
    let tutor_id = Uuid::new_v4();
    let pending = booking(parent_id, tutor_id, BookingStatus::PendingPayment);
    let open = payment(&pending, PaymentStatus::Pending);
    let mut settled = open.clone();
    settled.status = PaymentStatus::Success;
    settled.payment_type = Some("bank_transfer".into());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![open.clone()]])
        .append_query_results([vec![pending.clone()]])
        .append_query_results([vec![open.clone()]])
        .append_query_results([vec![settled]])
        .append_exec_results([exec(1)])
        .append_query_results([vec![
            account(tutor_id, "Sari Wulandari", Role::Tutor),
            account(parent_id, "Ibu Rina", Role::Parent),
        ]])
        .append_exec_results([exec(1)])
        .into_connection();
    let h = harness(db);
    let key = h.state.config.midtrans.server_key.clone();

    let ack = payment_service::handle_webhook(&h.state, settlement(&open.order_id, &key))
        .await
        .unwrap()
        .data
        .unwrap();

    assert_eq!(ack.payment_status, PaymentStatus::Success);
    assert_eq!(ack.booking_status, BookingStatus::Paid);

    let log = format!("{:?}", transaction_log(h.state));
    assert!(log.contains("notification_outbox"));
    assert_eq!(locked_tables(&log), ["bookings", "payments"]);
}

#[tokio::test]
async fn redelivered_settlement_changes_nothing() {
    let pending = booking(Uuid::new_v4(), Uuid::new_v4(), BookingStatus::PendingPayment);
    let mut paid = pending.clone();
    paid.status = BookingStatus::Paid;
    let mut settled = payment(&pending, PaymentStatus::Success);
    settled.payment_type = Some("bank_transfer".into());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![settled.clone()]])
        .append_query_results([vec![paid]])
        .append_query_results([vec![settled.clone()]])
        .into_connection();
    let h = harness(db);
    let key = h.state.config.midtrans.server_key.clone();

    let ack = payment_service::handle_webhook(&h.state, settlement(&settled.order_id, &key))
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(ack.payment_status, PaymentStatus::Success);
    assert_eq!(ack.booking_status, BookingStatus::Paid);

    let log = format!("{:?}", transaction_log(h.state));
    assert!(!log.contains(r#"UPDATE \"payments\""#));
    assert!(!log.contains("notification_outbox"));
}

#[tokio::test]
async fn forged_notification_is_rejected() {
    let h = harness(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let forged = settlement("LESGO-ABCDEF12-1", "not-the-server-key");

    let err = payment_service::handle_webhook(&h.state, forged)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}
