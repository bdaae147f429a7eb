use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use maize_mill::{app, app_state::AppState, bootstrap, config, db};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::create_pool(&config.database).await?;
    let server = config.server.clone();
    let state = AppState::new(db_pool, config);

    tracing::info!("Bootstrapping...");
    bootstrap::serve("MaizeMill", app(state), &server).await
}
