//! Entry point: load config, wire dependencies, and run the server.

use authgate::auth::{AuthService, JwtSecret};
use authgate::config::Config;
use authgate::db;
use authgate::{create_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Role bootstrap is best-effort: a failure leaves registration broken
    // until the roles table is fixed, but the process still serves login.
    if let Err(e) = AuthService::bootstrap_roles(&db_pool).await {
        tracing::error!(error = %e, "role bootstrap failed; registration will fail until roles exist");
    }

    let jwt_secret = JwtSecret::new(config.jwt_secret.clone(), config.jwt_expiry);

    let state = AppState {
        db: db_pool,
        jwt_secret,
    };

    let app = create_app(state);

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
