//! Recorded REPL sessions.
//!
//! A session file lists commands to feed to an interpreter; running it
//! produces a companion output file (`session.json` → `session.out.json`)
//! with the same commands and their captured output. Only the output file
//! is read here.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const PLAIN_TEXT: &str = "text/plain";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot open session output {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed session output: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplConfig {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub first_prompt: Option<String>,
    #[serde(default)]
    pub change_prompt: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub continuation_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplCommand {
    pub command: String,
    #[serde(default = "default_output_type")]
    pub output_type: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
}

fn default_output_type() -> String {
    PLAIN_TEXT.to_string()
}

impl ReplCommand {
    /// Captured output, treating an empty string as no output.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref().filter(|o| !o.is_empty())
    }

    pub fn is_plain_text(&self) -> bool {
        self.output_type == PLAIN_TEXT
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplSession {
    #[serde(default)]
    pub config: Option<ReplConfig>,
    pub commands: Vec<ReplCommand>,
}

pub fn read_session<R: Read>(reader: R) -> Result<ReplSession, SessionError> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn read_session_file(path: &Path) -> Result<ReplSession, SessionError> {
    let file = File::open(path).map_err(|source| SessionError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_session(BufReader::new(file))
}

/// Path of the output companion of a session file: the extension is
/// replaced by `suffix`.
pub fn session_output_path(session: &Path, suffix: &str) -> PathBuf {
    let stem = session
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    session.with_file_name(format!("{stem}{suffix}"))
}
