use clap::Parser;
use order_manager::adapters::{InMemoryOrderRepository, PostgresOrderRepository};
use order_manager::cli::{self, Cli, Commands, DbCommands};
use order_manager::config::{Config, FeatureFlagsBackend, LogFormat};
use order_manager::ports::{FeatureFlagSource, OrderRepository};
use order_manager::services::{EnvFeatureFlags, OrderService, PostgresFeatureFlags, TaxPolicySelector};
use order_manager::{AppState, HttpOptions, create_app, db};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    match cli.command {
        Some(Commands::Serve) | None => serve(config).await,
        Some(Commands::Db(DbCommands::Migrate)) => cli::handle_db_migrate(&config).await,
        Some(Commands::Config) => cli::handle_config_validate(&config),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let (repository, flags): (Arc<dyn OrderRepository>, Arc<dyn FeatureFlagSource>) =
        match config.database_url.as_deref() {
            Some(database_url) => {
                let pool = db::create_pool(database_url, config.database_max_connections).await?;
                db::run_migrations(&pool).await?;

                let flags: Arc<dyn FeatureFlagSource> = match config.feature_flags_backend {
                    FeatureFlagsBackend::Database => Arc::new(PostgresFeatureFlags::new(pool.clone())),
                    FeatureFlagsBackend::Env => Arc::new(EnvFeatureFlags::new()),
                };
                (Arc::new(PostgresOrderRepository::new(pool)), flags)
            }
            None => (
                Arc::new(InMemoryOrderRepository::new()),
                Arc::new(EnvFeatureFlags::new()),
            ),
        };

    tracing::info!(
        store = config.store_backend(),
        feature_flags = ?config.feature_flags_backend,
        "Order store initialized"
    );

    let orders = OrderService::new(repository, TaxPolicySelector::new(flags));
    let options = HttpOptions {
        cors_allowed_origins: config.cors_allowed_origins.clone(),
        log_request_body: config.log_request_body,
    };
    let app = create_app(AppState::new(orders), &options);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
