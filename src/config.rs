//! Configuration loading and defaults.
//!
//! Configuration is resolved in order of precedence (highest wins):
//!
//! 1. **Environment variables** — `PAIRPAD_LISTEN`, `PAIRPAD_NODE_BIN`
//! 2. **Config file** — path via `--config <path>`, or `pairpad.toml` in CWD
//! 3. **Compiled defaults** — see each field's default value below
//!
//! The TOML file mirrors the struct hierarchy:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:5000"
//! ws_outbox_size = 256
//!
//! [execution]
//! node_bin = "node"
//! node_args = []          # e.g. ["--permission"] on Node ≥ 20 for fs/net denial
//! working_dir = "/tmp"
//! timeout_ms = 5000
//!
//! [logging]
//! level = "info"
//! ```

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind (default `0.0.0.0:5000`).
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Per-connection outbox depth; events beyond it are dropped for that
    /// peer rather than blocking the session (default 256).
    #[serde(default = "default_ws_outbox_size")]
    pub ws_outbox_size: usize,
}

/// Sandbox settings for code execution.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Node.js binary used for the JavaScript backend (default `node`).
    #[serde(default = "default_node_bin")]
    pub node_bin: String,
    /// Extra interpreter flags. `--permission` (Node ≥ 20) additionally
    /// denies filesystem and child-process access inside the sandbox.
    #[serde(default)]
    pub node_args: Vec<String>,
    /// Working directory for sandboxed processes (default `/tmp`).
    #[serde(default = "default_exec_working_dir")]
    pub working_dir: String,
    /// Wall-clock execution bound in milliseconds (default 5000).
    #[serde(default = "default_exec_timeout_ms")]
    pub timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level (default `info`). Overridden by `RUST_LOG` env var.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_listen() -> String {
    "0.0.0.0:5000".to_string()
}
fn default_ws_outbox_size() -> usize {
    256
}
fn default_node_bin() -> String {
    "node".to_string()
}
fn default_exec_working_dir() -> String {
    "/tmp".to_string()
}
fn default_exec_timeout_ms() -> u64 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ws_outbox_size: default_ws_outbox_size(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            node_bin: default_node_bin(),
            node_args: Vec::new(),
            working_dir: default_exec_working_dir(),
            timeout_ms: default_exec_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration with the precedence chain: env vars > file > defaults.
    ///
    /// If `path` is `Some`, reads that file (panics on failure). Otherwise
    /// looks for `pairpad.toml` in the current directory, falling back to
    /// compiled defaults.
    pub fn load(path: Option<&str>) -> Self {
        let mut config: Config = if let Some(p) = path {
            let content = std::fs::read_to_string(p)
                .unwrap_or_else(|e| panic!("Failed to read config file {p}: {e}"));
            toml::from_str(&content)
                .unwrap_or_else(|e| panic!("Failed to parse config file {p}: {e}"))
        } else if Path::new("pairpad.toml").exists() {
            let content =
                std::fs::read_to_string("pairpad.toml").expect("Failed to read pairpad.toml");
            toml::from_str(&content).expect("Failed to parse pairpad.toml")
        } else {
            Config {
                server: ServerConfig::default(),
                execution: ExecutionConfig::default(),
                logging: LoggingConfig::default(),
            }
        };

        // Env var overrides
        if let Ok(listen) = std::env::var("PAIRPAD_LISTEN") {
            config.server.listen = listen;
        }
        if let Ok(node_bin) = std::env::var("PAIRPAD_NODE_BIN") {
            config.execution.node_bin = node_bin;
        }

        config
    }
}
