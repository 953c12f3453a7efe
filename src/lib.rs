#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_async)]

//! pairpad library — exposes core modules for embedding and for tests.
//!
//! This library re-exports the key building blocks:
//! - `config` — configuration loading
//! - `sessions` — collaborative session state and store
//! - `registry` — connection bindings and broadcast fan-out
//! - `executor` — sandboxed code execution
//! - `problems` — static problem catalog and language enum
//! - `routes` — REST API route handlers
//! - `ws` — WebSocket protocol handling

pub mod config;
pub mod executor;
pub mod problems;
pub mod registry;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod util;
pub mod ws;

// Re-export key types at crate root for convenience.
pub use config::Config;
pub use executor::ExecutionResult;
pub use problems::Language;
pub use registry::ConnectionRegistry;
pub use sessions::SessionStore;
pub use state::AppState;
