use std::path::PathBuf;

use clap::Parser;
use lesgo_api::{
    db::{create_pool, migrate},
    wilayah::{self, DEFAULT_BATCH_SIZE, ImportOptions},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Load the Kemendagri administrative division dump into the wilayah tables.
#[derive(Debug, Parser)]
#[command(name = "import-wilayah", version)]
struct Args {
    /// SQL dump containing `('<code>','<name>')` tuples.
    #[arg(short, long, default_value = "data/wilayah.sql")]
    file: PathBuf,

    /// Rows per INSERT statement.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Empty the wilayah tables before loading.
    #[arg(long)]
    truncate: bool,

    /// Parse and report counts without touching the database.
    #[arg(long)]
    dry_run: bool,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lesgo_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let input = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", args.file.display()))?;
    let dump = wilayah::parse_dump(&input);
    tracing::info!(
        provinces = dump.provinces.len(),
        cities = dump.cities.len(),
        districts = dump.districts.len(),
        villages = dump.villages.len(),
        skipped = dump.skipped,
        "parsed dump"
    );

    if args.dry_run {
        println!("Parsed {} units ({} skipped), nothing written", dump.total(), dump.skipped);
        return Ok(());
    }

    let database_url = args
        .database_url
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let pool = create_pool(&database_url).await?;
    migrate(&pool).await?;

    let report = wilayah::import(
        &pool,
        &dump,
        ImportOptions {
            batch_size: args.batch_size,
            truncate: args.truncate,
        },
    )
    .await?;

    println!(
        "Imported {} provinces, {} cities, {} districts, {} villages",
        report.provinces, report.cities, report.districts, report.villages
    );
    Ok(())
}
