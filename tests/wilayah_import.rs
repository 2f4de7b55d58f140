mod common;

use lesgo_api::{
    db::{DbPool, create_pool, migrate},
    wilayah::{ImportOptions, ImportReport, import, parse_dump},
};

use common::database_url;

const DUMP: &str = r#"
INSERT INTO wilayah (kode, nama) VALUES
('31','DKI JAKARTA'),
('31.71','KOTA ADM. JAKARTA PUSAT'),
('31.71.01','Gambir'),
('31.71.01.1001','Gambir'), ('31.71.01.1002','Kebon Kelapa'), ('31.71.01.1003','Petojo Utara'),
('31.71.01.1004','Petojo Selatan'), ('31.71.01.1005','Cideng');
INSERT INTO wilayah (kode, nama) VALUES
('31.71.02','Sawah Besar'),
('31.71.02.1001','Pasar Baru'), ('31.71.02.1002','Karang Anyar');
"#;

async fn table_counts(pool: &DbPool) -> anyhow::Result<[i64; 4]> {
    let mut counts = [0; 4];
    for (slot, table) in counts.iter_mut().zip(["provinces", "cities", "districts", "villages"]) {
        *slot = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await?;
    }
    Ok(counts)
}

// Batches smaller than the dump, loaded twice: the second run must not add rows.
#[tokio::test]
async fn reimporting_a_dump_converges() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database tests.");
        return Ok(());
    };
    let pool = create_pool(&database_url).await?;
    migrate(&pool).await?;

    let dump = parse_dump(DUMP);
    assert_eq!(dump.villages.len(), 7);
    let expected = ImportReport {
        provinces: 1,
        cities: 1,
        districts: 2,
        villages: 7,
    };

    let fresh = import(
        &pool,
        &dump,
        ImportOptions {
            batch_size: 2,
            truncate: true,
        },
    )
    .await?;
    assert_eq!(fresh, expected);
    assert_eq!(table_counts(&pool).await?, [1, 1, 2, 7]);

    let again = import(
        &pool,
        &dump,
        ImportOptions {
            batch_size: 2,
            truncate: false,
        },
    )
    .await?;
    // Upserts touch every row again without duplicating any.
    assert_eq!(again, expected);
    assert_eq!(table_counts(&pool).await?, [1, 1, 2, 7]);

    let name: String = sqlx::query_scalar("SELECT name FROM villages WHERE id = '31.71.01.1005'")
        .fetch_one(&pool)
        .await?;
    assert_eq!(name, "Cideng");

    // Truncating drops rows that are no longer in the dump.
    let smaller = parse_dump(
        "INSERT INTO wilayah (kode, nama) VALUES ('31','DKI JAKARTA'), ('31.71','KOTA ADM. JAKARTA PUSAT');",
    );
    import(
        &pool,
        &smaller,
        ImportOptions {
            batch_size: 2,
            truncate: true,
        },
    )
    .await?;
    assert_eq!(table_counts(&pool).await?, [1, 1, 0, 0]);

    Ok(())
}
