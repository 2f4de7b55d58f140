use lesgo_api::{
    config::AppConfig,
    db::{create_pool, migrate},
};
use uuid::Uuid;

struct DemoTutor {
    email: &'static str,
    name: &'static str,
    subjects: &'static [&'static str],
    hourly_rate: i64,
    latitude: f64,
    longitude: f64,
}

const DEMO_TUTORS: &[DemoTutor] = &[
    DemoTutor {
        email: "tutor.sari@example.com",
        name: "Sari Wulandari",
        subjects: &["Matematika", "Fisika"],
        hourly_rate: 75000,
        latitude: -6.1754,
        longitude: 106.8272,
    },
    DemoTutor {
        email: "tutor.budi@example.com",
        name: "Budi Santoso",
        subjects: &["Bahasa Inggris", "Matematika"],
        hourly_rate: 60000,
        latitude: -6.1865,
        longitude: 106.8343,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    migrate(&pool).await?;

    seed_wilayah(&pool).await?;
    let admin_id = ensure_profile(&pool, "admin@example.com", "Admin LesGo", "admin").await?;
    let parent_id = ensure_profile(&pool, "parent@example.com", "Ibu Rina", "parent").await?;
    for tutor in DEMO_TUTORS {
        let user_id = ensure_profile(&pool, tutor.email, tutor.name, "tutor").await?;
        ensure_active_tutor(&pool, user_id, tutor, admin_id).await?;
    }

    println!("Seed completed. Admin ID: {admin_id}, Parent ID: {parent_id}");
    Ok(())
}

/// Just enough of central Jakarta for local search to return something.
async fn seed_wilayah(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO provinces (id, name) VALUES ('31', 'DKI JAKARTA')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        r#"
        INSERT INTO cities (id, province_id, name, city_type)
        VALUES ('31.71', '31', 'KOTA ADM. JAKARTA PUSAT', 'city')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        r#"
        INSERT INTO districts (id, city_id, name) VALUES ('31.71.01', '31.71', 'Gambir')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query(
        r#"
        INSERT INTO villages (id, district_id, name, village_type)
        VALUES ('31.71.01.1001', '31.71.01', 'Gambir', 'urban')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;

    println!("Seeded wilayah sample");
    Ok(())
}

async fn ensure_profile(
    pool: &sqlx::PgPool,
    email: &str,
    full_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO profiles (id, email, full_name, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(full_name)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured profile {email} (role={role})");
    Ok(id)
}

async fn ensure_active_tutor(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    tutor: &DemoTutor,
    approved_by: Uuid,
) -> anyhow::Result<()> {
    let subjects: Vec<String> = tutor.subjects.iter().map(|s| s.to_string()).collect();
    sqlx::query(
        r#"
        INSERT INTO tutor_profiles (
            id, user_id, is_verified, is_active, is_onboarded, bio, address,
            latitude, longitude, province_id, city_id, district_id, village_id,
            education_level, subjects, hourly_rate, submitted_at, approved_at, approved_by
        )
        VALUES (
            $1, $2, TRUE, TRUE, TRUE, 'Tutor contoh untuk pengembangan lokal.', 'Jakarta Pusat',
            $3, $4, '31', '31.71', '31.71.01', '31.71.01.1001',
            'S1', $5, $6, NOW(), NOW(), $7
        )
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(tutor.latitude)
    .bind(tutor.longitude)
    .bind(&subjects)
    .bind(tutor.hourly_rate)
    .bind(approved_by)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO tutor_wallets (id, tutor_id) VALUES ($1, $2)
        ON CONFLICT (tutor_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .execute(pool)
    .await?;

    println!("Ensured active tutor {}", tutor.email);
    Ok(())
}
