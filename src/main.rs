use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use gazette::auth::session;
use gazette::blog::profiles::{self, ADMIN_ROLE};
use gazette::config::{Cli, Command, Config};
use gazette::db;
use gazette::routes;
use gazette::state::{AppState, DbPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await,
        Command::GrantAdmin { user_id } => set_admin(&pool, &user_id, true),
        Command::RevokeAdmin { user_id } => set_admin(&pool, &user_id, false),
    }
}

async fn serve(pool: DbPool, config: Config) -> anyhow::Result<()> {
    config.warn_disabled_features();

    let purged = session::purge_expired(&*pool.get()?)?;
    if purged > 0 {
        tracing::info!("Removed {} expired sessions", purged);
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::from_config(pool, config)?;
    let app = routes::app(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn set_admin(pool: &DbPool, user_id: &str, admin: bool) -> anyhow::Result<()> {
    let conn = pool.get()?;
    if profiles::get_profile(&conn, user_id)?.is_none() {
        anyhow::bail!("No profile for user {}; they need to sign in once first", user_id);
    }

    let changed = if admin {
        profiles::grant_role(&conn, user_id, ADMIN_ROLE)?
    } else {
        profiles::revoke_role(&conn, user_id, ADMIN_ROLE)?
    };

    match (admin, changed) {
        (true, true) => tracing::info!("Granted admin to {}", user_id),
        (true, false) => tracing::info!("{} is already an admin", user_id),
        (false, true) => tracing::info!("Revoked admin from {}", user_id),
        (false, false) => tracing::info!("{} was not an admin", user_id),
    }
    Ok(())
}
