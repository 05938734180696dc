use std::sync::Arc;

use anyhow::Result;
use common::{
    database::{self, DatabaseConfig},
    password::{PasswordConfig, PasswordHashing},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use users::{
    MIGRATOR,
    auth::{LoginGuard, StaticAuthProvider},
    config::ServiceConfig,
    repositories::SqlUserRepository,
    routes,
    service::UserService,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting users service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool, &MIGRATOR).await?;

    let hashing = PasswordHashing::new(&PasswordConfig::from(&config.password))?;

    if config.auth.uses_default_passwords() {
        warn!("Built-in principal passwords are in use; override them with USERS_AUTH__*");
    }
    let auth_provider = StaticAuthProvider::new(hashing.clone(), config.auth.principals())?;
    info!("Configured principals: {:?}", auth_provider.usernames());

    let user_repository = SqlUserRepository::new(pool.clone());
    let user_service = UserService::new(Arc::new(user_repository), hashing);

    let app_state = AppState {
        db_pool: pool,
        user_service,
        auth_provider: Arc::new(auth_provider),
        login_guard: LoginGuard::new(config.auth.login_guard()),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Users service listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Users service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
