//! Model gateway backed by an external command.
//!
//! Each `generate` call spawns the configured command once. The request is
//! written to the child's stdin as a single JSON document:
//!
//! ```json
//! {"turns": [{"role": "system", "text": "..."}, {"role": "user", "text": "..."}],
//!  "temperature": 0.7, "max_response_length": 2000}
//! ```
//!
//! and the reply is whatever the child prints on stdout. A non-zero exit
//! status is a failed request; stderr becomes the error message.

use async_trait::async_trait;
use crew_application::{GatewayError, GenerationOptions, ModelGateway};
use crew_domain::Turn;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Longest stderr excerpt carried into an error.
const STDERR_EXCERPT: usize = 500;

#[derive(Debug, Clone)]
pub struct ProcessModelGateway {
    command: String,
    args: Vec<String>,
}

impl ProcessModelGateway {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn request_body(turns: &[Turn], options: &GenerationOptions) -> Result<Vec<u8>, GatewayError> {
        serde_json::to_vec(&serde_json::json!({
            "turns": turns,
            "temperature": options.temperature,
            "max_response_length": options.max_response_length,
        }))
        .map_err(|e| GatewayError::Other(format!("Failed to encode request: {e}")))
    }

    fn spawn(&self) -> Result<tokio::process::Child, GatewayError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out call drops the future; the child goes with it.
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        cmd.spawn().map_err(|e| {
            GatewayError::ConnectionError(format!("Failed to spawn {}: {e}", self.command))
        })
    }
}

fn classify_failure(code: Option<i32>, stderr: &str) -> GatewayError {
    let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
    let lower = excerpt.to_lowercase();
    if lower.contains("quota") || lower.contains("rate limit") {
        return GatewayError::QuotaExceeded(excerpt);
    }
    match code {
        Some(code) => GatewayError::RequestFailed(format!("exit status {code}: {excerpt}")),
        None => GatewayError::RequestFailed(format!("terminated by signal: {excerpt}")),
    }
}

#[async_trait]
impl ModelGateway for ProcessModelGateway {
    async fn generate(
        &self,
        turns: &[Turn],
        options: &GenerationOptions,
    ) -> Result<String, GatewayError> {
        let body = Self::request_body(turns, options)?;
        let mut child = self.spawn()?;
        debug!(command = %self.command, turns = turns.len(), "Model process spawned");

        // Write while reading so a chatty child cannot fill its stdout pipe
        // and stall on an unread stdin.
        let stdin = child.stdin.take();
        let write = async {
            if let Some(mut stdin) = stdin
                && let Err(e) = stdin.write_all(&body).await
            {
                warn!(command = %self.command, error = %e, "Could not write request to model process");
            }
        };
        let ((), output) = tokio::join!(write, child.wait_with_output());
        let output =
            output.map_err(|e| GatewayError::ConnectionError(format!("Model process failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(output.status.code(), &stderr));
        }

        let reply = String::from_utf8(output.stdout)
            .map_err(|e| GatewayError::InvalidResponse(format!("Reply is not UTF-8: {e}")))?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(GatewayError::InvalidResponse("empty reply".into()));
        }
        debug!(command = %self.command, chars = reply.len(), "Model process replied");
        Ok(reply.to_string())
    }
}
