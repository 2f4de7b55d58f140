use lesgo_api::{
    config::AppConfig,
    db::{create_pool, migrate},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    migrate(&pool).await?;
    println!("Migrations applied");
    Ok(())
}
