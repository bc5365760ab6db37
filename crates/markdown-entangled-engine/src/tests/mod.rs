use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::rc::Rc;

use tempfile::TempDir;

use crate::build::{BuildError, BuildRunner};

/// Create a temporary docs directory
pub fn create_test_docs_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test file with content, creating parent directories
pub fn create_test_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
    file_path
}

/// Build runner that records scripts instead of running them
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    pub scripts: Rc<RefCell<Vec<String>>>,
}

impl RecordingRunner {
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.borrow().clone()
    }
}

impl BuildRunner for RecordingRunner {
    fn run_script(&mut self, script: &str) -> Result<Option<ExitStatus>, BuildError> {
        self.scripts.borrow_mut().push(script.to_string());
        Ok(None)
    }
}
