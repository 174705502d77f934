//! LessonHub server entry point.
//!
//! Loads configuration, initializes logging, connects to PostgreSQL,
//! runs migrations, and starts the HTTP server with the background
//! expiration sweeper.

use tracing_subscriber::EnvFilter;

use lessonhub_core::config::AppConfig;
use lessonhub_core::error::AppError;
use lessonhub_database::{migration, DatabasePool};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server terminated with error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration for the environment named by `LESSONHUB_ENV`
/// (defaults to `development`).
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("LESSONHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. The output
/// format (`json` or `pretty`) comes from the logging section.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.format == "pretty" {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting LessonHub");

    let db = DatabasePool::connect(&config.database).await?;
    migration::run_migrations(db.pool()).await?;

    lessonhub_api::run_server(config, db.into_pool()).await
}
