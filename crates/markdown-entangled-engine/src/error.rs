use std::path::PathBuf;

use crate::properties::PropertyError;
use crate::session::SessionError;

/// Failures that stop a page from being rendered.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("line {line}: {source}")]
    Properties {
        line: usize,
        #[source]
        source: PropertyError,
    },
    #[error("invalid rule pattern: {0}")]
    Rule(#[from] regex::Error),
    #[error("no code block registered for {0}")]
    UnknownReference(String),
    #[error("code block `{name}` has a .repl fragment but no `session` attribute")]
    MissingSessionAttribute { name: String },
    #[error("session file not found: {0}")]
    MissingSessionFile(PathBuf),
    #[error("session output not found: {0} (run the session first)")]
    MissingSessionOutput(PathBuf),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("session output {path} has no command #{index}")]
    MissingCommand { path: PathBuf, index: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("no sync command configured")]
    EmptyCommand,
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
    },
}
