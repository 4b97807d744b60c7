//! Loanbook Backend Server
//!
//! Rust backend for administering loan records through their contractual
//! and disbursement lifecycle: creation, guarded state transitions, and
//! the audit trail of who moved a loan when.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use loanbook_server::clock::SystemClock;
use loanbook_server::config::Config;
use loanbook_server::handlers;
use loanbook_server::loan::LoanService;
use loanbook_server::routes;
use loanbook_server::state::AppState;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Database connected successfully");

    // Initialize loan service and provision the loans table
    let loan_service = Arc::new(LoanService::new(db_pool, Arc::new(SystemClock)));
    loan_service
        .ensure_schema()
        .await
        .expect("Failed to provision loans table");

    let app_state = AppState::new(loan_service);

    // Create the app router
    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .merge(routes::loan_routes())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!(environment = config.environment.as_str(), "Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
