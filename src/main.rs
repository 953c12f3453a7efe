#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # pairpad
//!
//! Collaborative coding interview server.
//!
//! pairpad exposes an HTTP and WebSocket API that lets multiple participants
//! join a named session and share one code buffer, language selector, problem
//! statement, and chat stream in real time, with a sandboxed execution path
//! for the buffer's current content.
//!
//! ## API surface
//!
//! | Method | Path                       | Description                         |
//! |--------|----------------------------|-------------------------------------|
//! | GET    | `/api/health`              | Liveness probe                      |
//! | POST   | `/api/sessions/create`     | Create a session                    |
//! | GET    | `/api/sessions/{id}`       | Session snapshot                    |
//! | GET    | `/api/problems`            | Problem catalog                     |
//! | GET    | `/api/problems/{id}`       | Problem detail                      |
//! | POST   | `/api/execute`             | Sandboxed code execution            |
//! | GET    | `/api/ws`                  | WebSocket for live collaboration    |
//!
//! ## Architecture
//!
//! ```text
//! main.rs       — entry point, clap subcommands, router setup, graceful shutdown
//! config.rs     — TOML + env-var configuration
//! state.rs      — AppState injected into every handler
//! sessions/     — SessionStore: per-session shared state, last-write-wins
//! registry.rs   — connection↔session bindings, broadcast fan-out
//! executor.rs   — child-process sandbox with wall-clock timeout
//! problems.rs   — static problem catalog + language contract
//! routes/       — health, sessions, problems, execute
//! ws/           — WebSocket upgrade, event router state machine
//! ```

use axum::{
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use pairpad::{config::Config, routes, ws, AppState};

/// Collaborative coding interview server.
#[derive(Parser)]
#[command(name = "pairpad", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP/WS server (default when no subcommand given).
    Serve {
        /// Path to TOML config file.
        #[arg(long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { config }) => run_server(config.as_deref()).await,
        None => run_server(None).await,
    }
}

async fn run_server(config_path: Option<&str>) {
    let config = Config::load(config_path);

    // Initialize tracing
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    info!("pairpad v{} starting", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}", config.server.listen);
    info!(
        "Execution backend: {} (timeout {} ms)",
        config.execution.node_bin, config.execution.timeout_ms
    );

    let state = AppState::new(config);

    let app = Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/sessions/create", post(routes::sessions::create_session))
        .route("/api/sessions/{id}", get(routes::sessions::get_session))
        .route("/api/problems", get(routes::problems::list_problems))
        .route("/api/problems/{id}", get(routes::problems::get_problem))
        .route("/api/execute", post(routes::execute::execute))
        .route("/api/ws", get(ws::ws_upgrade))
        // Browser clients are served from a different origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let listener = TcpListener::bind(&state.config.server.listen)
        .await
        .expect("Failed to bind");

    info!("Server ready");

    // Graceful shutdown
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("Failed to register SIGTERM");
            tokio::select! {
                _ = ctrl_c => info!("Received SIGINT"),
                _ = sigterm.recv() => info!("Received SIGTERM"),
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            info!("Received SIGINT");
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("Server error");

    info!("Shutting down...");
}
