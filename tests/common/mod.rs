#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use lesgo_api::{
    config::AppConfig,
    db::{create_pool, migrate, orm_from_pool},
    entity::{
        bookings::{self, BookingStatus},
        payments::{self, PaymentStatus},
        profiles::{self, Role},
        tutor_profiles,
    },
    integrations::{
        mailer::{EmailMessage, MailError, Mailer},
        midtrans::{GatewayError, PaymentGateway, SnapRequest, SnapTransaction},
    },
    middleware::auth::AuthUser,
    pricing::PriceBreakdown,
    state::AppState,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, MockExecResult, Set, Statement, Transaction,
};
use uuid::Uuid;

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, MailError> {
        if self.fail {
            return Err(MailError::Rejected {
                status: 503,
                body: "unavailable".into(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<SnapRequest>>,
    pub fail: bool,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_transaction(
        &self,
        request: &SnapRequest,
    ) -> Result<SnapTransaction, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(GatewayError::Rejected {
                status: 401,
                body: "unauthorized".into(),
            });
        }
        Ok(SnapTransaction {
            token: "snap-token".into(),
            redirect_url: "https://app.sandbox.midtrans.com/snap/v2/vtweb/snap-token".into(),
        })
    }
}

pub struct Harness {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub gateway: Arc<FakeGateway>,
}

pub fn harness(orm: DatabaseConnection) -> Harness {
    harness_with(orm, AppConfig::for_tests(), RecordingMailer::default(), FakeGateway::default())
}

pub fn harness_with(
    orm: DatabaseConnection,
    config: AppConfig,
    mailer: RecordingMailer,
    gateway: FakeGateway,
) -> Harness {
    let mailer = Arc::new(mailer);
    let gateway = Arc::new(gateway);
    let state = AppState {
        orm: Arc::new(orm),
        config: Arc::new(config),
        mailer: mailer.clone(),
        gateway: gateway.clone(),
    };
    Harness {
        state,
        mailer,
        gateway,
    }
}

/// Statements the mock connection saw, one entry per transaction.
pub fn transaction_log(state: AppState) -> Vec<Transaction> {
    let orm = Arc::try_unwrap(state.orm)
        .ok()
        .expect("no other handle to the mock connection");
    orm.into_transaction_log()
}

/// Tables of the `SELECT ... FOR UPDATE` statements in a formatted log, in order.
pub fn locked_tables(log: &str) -> Vec<String> {
    log.split("Statement {")
        .filter(|stmt| stmt.contains("FOR UPDATE"))
        .filter_map(|stmt| {
            let rest = &stmt[stmt.find(r#"FROM \""#)? + 7..];
            Some(rest[..rest.find('\\')?].to_string())
        })
        .collect()
}

/// A harness on the database named by `TEST_DATABASE_URL` (or `DATABASE_URL`), migrated
/// and emptied, with Gambir (central Jakarta) seeded. `None` when neither is set.
pub async fn postgres() -> anyhow::Result<Option<Harness>> {
    let Some(database_url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database tests.");
        return Ok(None);
    };
    let pool = create_pool(&database_url).await?;
    migrate(&pool).await?;
    let orm = orm_from_pool(pool);

    execute_all(
        &orm,
        &[
            "TRUNCATE TABLE reviews, payments, bookings, tutor_wallets, tutor_availability, \
             tutor_profiles, notification_outbox, audit_logs, profiles, villages, districts, \
             cities, provinces CASCADE",
            "INSERT INTO provinces (id, name) VALUES ('31', 'DKI JAKARTA')",
            "INSERT INTO cities (id, province_id, name, city_type) \
             VALUES ('31.71', '31', 'KOTA ADM. JAKARTA PUSAT', 'city')",
            "INSERT INTO districts (id, city_id, name) VALUES ('31.71.01', '31.71', 'Gambir')",
            "INSERT INTO villages (id, district_id, name, village_type) VALUES \
             ('31.71.01.1001', '31.71.01', 'Gambir', 'urban'), \
             ('31.71.01.1002', '31.71.01', 'Kebon Kelapa', 'urban')",
        ],
    )
    .await?;

    Ok(Some(harness_with(
        orm,
        AppConfig::for_tests(),
        RecordingMailer::default(),
        FakeGateway::default(),
    )))
}

pub fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

pub async fn execute_all(orm: &DatabaseConnection, statements: &[&str]) -> anyhow::Result<()> {
    let backend = orm.get_database_backend();
    for sql in statements {
        orm.execute(Statement::from_string(backend, *sql)).await?;
    }
    Ok(())
}

pub async fn create_account(h: &Harness, email: &str, role: Role) -> anyhow::Result<Uuid> {
    let profile = profiles::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        full_name: Set(String::new()),
        phone: Set(None),
        avatar_url: Set(None),
        role: Set(role),
        created_at: NotSet,
    }
    .insert(h.state.db())
    .await?;
    Ok(profile.id)
}

/// Store a tutor profile row as given.
pub async fn insert_tutor(h: &Harness, tutor: tutor_profiles::Model) -> anyhow::Result<()> {
    tutor_profiles::Entity::insert(tutor.into_active_model())
        .exec_without_returning(h.state.db())
        .await?;
    Ok(())
}

pub fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

pub fn parent() -> AuthUser {
    AuthUser::new(Uuid::new_v4(), Role::Parent)
}

pub fn tutor_user() -> AuthUser {
    AuthUser::new(Uuid::new_v4(), Role::Tutor)
}

pub fn admin() -> AuthUser {
    AuthUser::new(Uuid::new_v4(), Role::Admin)
}

pub fn account(id: Uuid, name: &str, role: Role) -> profiles::Model {
    profiles::Model {
        id,
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        full_name: name.to_string(),
        phone: Some("081234567890".into()),
        avatar_url: None,
        role,
        created_at: Utc::now().fixed_offset(),
    }
}

/// An approved tutor teaching Matematika in Gambir, central Jakarta.
pub fn active_tutor(user_id: Uuid) -> tutor_profiles::Model {
    let now = Utc::now().fixed_offset();
    tutor_profiles::Model {
        id: Uuid::new_v4(),
        user_id,
        is_verified: true,
        is_active: true,
        is_onboarded: true,
        date_of_birth: NaiveDate::from_ymd_opt(1998, 4, 12),
        gender: Some("female".into()),
        nik: Some("3171234567890001".into()),
        bio: Some("Lulusan matematika, sabar dan teliti.".into()),
        id_card_path: Some("ktp/1.jpg".into()),
        selfie_path: Some("selfie/1.jpg".into()),
        whatsapp: Some("081234567890".into()),
        address: Some("Jl. Medan Merdeka".into()),
        latitude: Some(-6.1754),
        longitude: Some(106.8272),
        province_id: Some("31".into()),
        city_id: Some("31.71".into()),
        district_id: Some("31.71.01".into()),
        village_id: Some("31.71.01.1001".into()),
        education_level: Some("S1".into()),
        institution: Some("Universitas Indonesia".into()),
        major: Some("Matematika".into()),
        subjects: vec!["Matematika".into(), "Fisika".into()],
        hourly_rate: 75000,
        rating: 0.0,
        review_count: 0,
        submitted_at: Some(now),
        approved_at: Some(now),
        approved_by: None,
        rejection_reason: None,
        version: 2,
        created_at: now,
        updated_at: now,
    }
}

pub fn pending_tutor(user_id: Uuid) -> tutor_profiles::Model {
    tutor_profiles::Model {
        is_active: false,
        is_verified: false,
        approved_at: None,
        ..active_tutor(user_id)
    }
}

pub fn booking(parent_id: Uuid, tutor_id: Uuid, status: BookingStatus) -> bookings::Model {
    let now = Utc::now().fixed_offset();
    let price = PriceBreakdown::compute(75000, 2);
    bookings::Model {
        id: Uuid::new_v4(),
        parent_id,
        tutor_id,
        subject: "Matematika".into(),
        session_date: NaiveDate::from_ymd_opt(2099, 3, 14).unwrap(),
        session_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        duration_hours: price.duration_hours,
        address: "Jl. Kebon Sirih 10".into(),
        hourly_rate: price.hourly_rate,
        total_amount: price.total_amount,
        commission: price.commission,
        tutor_earnings: price.tutor_earnings,
        notes: None,
        status,
        created_at: now,
        updated_at: now,
    }
}

pub fn payment(booking: &bookings::Model, status: PaymentStatus) -> payments::Model {
    let now = Utc::now().fixed_offset();
    payments::Model {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        order_id: "LESGO-ABCDEF12-1700000000000".into(),
        amount: booking.total_amount,
        status,
        payment_type: None,
        snap_token: Some("snap-token".into()),
        redirect_url: Some("https://app.sandbox.midtrans.com/snap/v2/vtweb/snap-token".into()),
        paid_at: None,
        created_at: now,
        updated_at: now,
    }
}
