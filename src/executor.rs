//! Sandboxed execution of untrusted session code.
//!
//! The buffer a session is editing can be run on demand. The code is
//! untrusted and changes rapidly, so it is never evaluated in this process:
//! the JavaScript backend spawns a separate Node.js interpreter with a
//! cleared environment and a neutral working directory, feeds the program
//! over stdin, and bounds the whole run with a wall-clock timeout. The child
//! has `kill_on_drop(true)`, so a timed-out run is hard-killed rather than
//! left behind.
//!
//! Every outcome — captured output, runtime failure, timeout, unsupported
//! language — is expressed as an [`ExecutionResult`]. Nothing here returns
//! `Err` or panics into the caller's fault domain.

use std::process::Stdio;
use std::time::Instant;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::debug;

use crate::config::ExecutionConfig;
use crate::problems::Language;

/// Max captured bytes per stream. Output beyond this is drained (to avoid
/// pipe deadlock) but discarded.
const MAX_OUTPUT: usize = 1024 * 1024;

/// Lookup path handed to the child in place of the inherited environment.
const SANDBOX_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Outcome of one execution request.
///
/// Exactly one of `output` / `error` is populated, depending on `success`.
/// `execution_time_ms` is measured from call entry to result on every path.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl ExecutionResult {
    fn ok(output: String, start: Instant) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
            execution_time_ms: elapsed_ms(start),
        }
    }

    fn failed(error: String, start: Instant) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error),
            execution_time_ms: elapsed_ms(start),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    #[allow(clippy::cast_possible_truncation)]
    let ms = start.elapsed().as_millis() as u64;
    ms
}

/// Run `code` under the backend for `language`.
///
/// Dispatch is one explicit arm per language: adding an execution backend
/// means replacing one arm, and languages without a backend fail
/// deterministically without ever spawning anything.
pub async fn execute(code: &str, language: Language, config: &ExecutionConfig) -> ExecutionResult {
    let start = Instant::now();
    match language {
        Language::Javascript => run_node(code, config, start).await,
        // TypeScript runs through the JavaScript backend, matching the
        // original behavior: type annotations are the editor's concern.
        Language::Typescript => run_node(code, config, start).await,
        Language::Python => ExecutionResult::failed(
            "Python execution is not supported yet".to_string(),
            start,
        ),
        Language::Java => {
            ExecutionResult::failed("Java execution is not supported yet".to_string(), start)
        }
        Language::Cpp => {
            ExecutionResult::failed("C++ execution is not supported yet".to_string(), start)
        }
    }
}

/// Spawn `node -` reading the program from stdin, capture stdout/stderr
/// concurrently, and kill the child if it outlives the timeout.
async fn run_node(code: &str, config: &ExecutionConfig, start: Instant) -> ExecutionResult {
    let mut cmd = Command::new(&config.node_bin);
    cmd.args(&config.node_args)
        .arg("-")
        .current_dir(&config.working_dir)
        .env_clear()
        .env("PATH", SANDBOX_PATH)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ExecutionResult::failed(
                format!("Failed to start interpreter {}: {e}", config.node_bin),
                start,
            );
        }
    };

    let Some(mut stdin) = child.stdin.take() else {
        return ExecutionResult::failed("Failed to take stdin pipe".to_string(), start);
    };
    let Some(mut stdout) = child.stdout.take() else {
        return ExecutionResult::failed("Failed to take stdout pipe".to_string(), start);
    };
    let Some(mut stderr) = child.stderr.take() else {
        return ExecutionResult::failed("Failed to take stderr pipe".to_string(), start);
    };

    let program = code.to_string();
    let timeout = tokio::time::Duration::from_millis(config.timeout_ms);
    let run = async {
        // Feed the program, then close stdin so the interpreter starts.
        let write_result = stdin.write_all(program.as_bytes()).await;
        drop(stdin);
        if let Err(e) = write_result {
            debug!("Sandbox stdin write failed: {e}");
        }

        // Read both streams concurrently to avoid pipe deadlock.
        let (stdout_data, stderr_data) = tokio::join!(
            read_capped(&mut stdout, MAX_OUTPUT),
            read_capped(&mut stderr, MAX_OUTPUT),
        );
        drop(stdout);
        drop(stderr);

        let status = child.wait().await;
        (status, stdout_data, stderr_data)
    };

    match Box::pin(tokio::time::timeout(timeout, run)).await {
        Ok((Ok(status), stdout_data, stderr_data)) => {
            if status.success() {
                let output = stdout_data.trim_end_matches('\n').to_string();
                let output = if output.is_empty() {
                    "Code ran successfully (no output)".to_string()
                } else {
                    output
                };
                ExecutionResult::ok(output, start)
            } else {
                let diagnostic = stderr_data.trim_end_matches('\n').to_string();
                let diagnostic = if diagnostic.is_empty() {
                    format!(
                        "Process exited with code {}",
                        status.code().unwrap_or(-1)
                    )
                } else {
                    diagnostic
                };
                ExecutionResult::failed(diagnostic, start)
            }
        }
        Ok((Err(e), _, _)) => ExecutionResult::failed(format!("Process error: {e}"), start),
        // Dropping the child here triggers kill_on_drop.
        Err(_) => ExecutionResult::failed(
            format!("Execution timed out after {} ms", config.timeout_ms),
            start,
        ),
    }
}

/// Read from an async reader, keeping the first `max_bytes` and draining the
/// rest. Closing the pipe early while the child is still writing causes
/// SIGPIPE and potential deadlocks against the other stream.
async fn read_capped(reader: &mut (impl tokio::io::AsyncRead + Unpin), max_bytes: usize) -> String {
    let mut buf = Vec::with_capacity(max_bytes.min(65536));
    let mut tmp = [0u8; 8192];
    loop {
        match reader.read(&mut tmp).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if buf.len() < max_bytes {
                    let take = n.min(max_bytes - buf.len());
                    buf.extend_from_slice(&tmp[..take]);
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
