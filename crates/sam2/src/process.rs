use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tokio::process::Command as TokioCommand;

use crate::{error::Sam2Error, wire::parse_reply};

/// Runs the SAM2 runner script once per request, exchanging JSON documents.
///
/// The request is written to a temporary file passed as `--input`; the reply
/// is read from the script's stdout. Every call starts a fresh process, so the
/// script reloads its model each time.
#[derive(Debug, Clone)]
pub struct Sam2Process {
    script_path: PathBuf,
    uv_env_path: Option<PathBuf>,
    interpreter: OsString,
}

impl Sam2Process {
    pub fn new(script_path: impl Into<PathBuf>, uv_env_path: Option<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            uv_env_path,
            interpreter: OsString::from("python"),
        }
    }

    /// Replace the `python` interpreter used to launch the script
    pub fn with_interpreter(mut self, interpreter: impl Into<OsString>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn script_path(&self) -> &PathBuf {
        &self.script_path
    }

    pub async fn run<Req, Resp>(&self, request: &Req) -> Result<Resp, Sam2Error>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut temp_input = tempfile::NamedTempFile::new()?;
        serde_json::to_writer(&mut temp_input, request)?;
        temp_input.flush()?;

        let mut cmd = if let Some(uv_path) = &self.uv_env_path {
            let mut c = TokioCommand::new(uv_path);
            c.arg("run").arg(&self.interpreter).arg(&self.script_path);
            c
        } else {
            let mut c = TokioCommand::new(&self.interpreter);
            c.arg(&self.script_path);
            c
        };

        tracing::debug!(script = %self.script_path.display(), "invoking runner script");
        let output = cmd.arg("--input").arg(temp_input.path()).output().await?;

        if !output.status.success() {
            return Err(Sam2Error::ScriptFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_reply(&output.stdout)
    }
}
