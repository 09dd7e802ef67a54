use std::io::Write;
use std::process::Stdio;

use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::summary::JournalSummary;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("External command is empty")]
    NoCommand,
    #[error("External command I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("External command exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("Summarizer output is not a summary: {reason}")]
    MalformedOutput { reason: String, raw: String },
}

/// Runs an external program as a batch job.
///
/// The input goes into a temporary file whose path is appended to the
/// command line; the program answers on stdout. As a summarizer it prints a
/// JSON summary.
#[derive(Debug, Clone)]
pub struct ScriptRelay {
    program: String,
    args: Vec<String>,
}

impl ScriptRelay {
    pub fn new(command: &[String]) -> Result<Self, RelayError> {
        let (program, args) = command.split_first().ok_or(RelayError::NoCommand)?;
        if program.trim().is_empty() {
            return Err(RelayError::NoCommand);
        }
        Ok(Self { program: program.clone(), args: args.to_vec() })
    }

    pub async fn run(&self, text: &str) -> Result<JournalSummary, RelayError> {
        let stdout = self.invoke(text.as_bytes(), ".txt").await?;
        parse_output(&stdout)
    }

    /// Write `input` to a temp file ending in `suffix`, run the command on it
    /// and return its stdout.
    pub async fn invoke(&self, input: &[u8], suffix: &str) -> Result<String, RelayError> {
        let mut file = tempfile::Builder::new().prefix("odoscan-ocr-").suffix(suffix).tempfile()?;
        file.write_all(input)?;
        file.flush()?;

        info!(program = %self.program, bytes = input.len(), "running external command");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .stdin(Stdio::null())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stderr.trim().is_empty() {
            debug!(%stderr, "external command stderr");
        }

        if !output.status.success() {
            warn!(status = %output.status, "external command failed");
            return Err(RelayError::Exit { status: output.status.to_string(), stderr });
        }

        Ok(stdout)
    }
}

fn parse_output(stdout: &str) -> Result<JournalSummary, RelayError> {
    let malformed = |reason: String| RelayError::MalformedOutput { reason, raw: stdout.to_string() };

    let value: Value = serde_json::from_str(stdout.trim()).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    if let Some(error) = value.get("error") {
        let reason = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(malformed(reason));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(ScriptRelay::new(&[]), Err(RelayError::NoCommand)));
        assert!(matches!(ScriptRelay::new(&["  ".to_string()]), Err(RelayError::NoCommand)));
    }

    #[test]
    fn error_payload_is_malformed_output() {
        let err = parse_output(r#"{"error": "file missing"}"#).unwrap_err();
        match err {
            RelayError::MalformedOutput { reason, .. } => assert_eq!(reason, "file missing"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_output("not json"), Err(RelayError::MalformedOutput { .. })));
        assert!(matches!(parse_output(r#"{"payee": "x"}"#), Err(RelayError::MalformedOutput { .. })));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> ScriptRelay {
        // `sh -c script path`: the temp file path lands in $0.
        ScriptRelay::new(&["sh".to_string(), "-c".to_string(), script.to_string()]).unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn passes_text_through_temp_file() {
        let relay = sh(r#"grep -q 'TOTALS 10.00' "$0" && echo '{"payee": "ACME", "total": "10.00", "balance_ok": true}'"#);
        let summary = relay.run("Pay to ACME\nTOTALS 10.00").await.unwrap();
        assert_eq!(summary.payee.as_deref(), Some("ACME"));
        assert!(summary.balance_ok);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_exit_error() {
        let relay = sh("echo boom >&2; exit 3");
        match relay.run("x").await {
            Err(RelayError::Exit { stderr, .. }) => assert_eq!(stderr.trim(), "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let relay = ScriptRelay::new(&["/nonexistent/odoscan-summarizer".to_string()]).unwrap();
        assert!(matches!(relay.run("x").await, Err(RelayError::Io(_))));
    }
}
