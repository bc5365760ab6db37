//! Running extracted build scripts.
//!
//! A script is written into a fresh scratch directory and handed to an
//! external build tool. The directory lives exactly as long as the
//! invocation: it is removed when the [`tempfile::TempDir`] guard drops,
//! whatever the outcome.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use markdown_entangled_config::BuildConfig;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no build command configured")]
    EmptyCommand,
    #[error("failed to stage build script: {0}")]
    Stage(#[source] std::io::Error),
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Something that can execute a build script.
pub trait BuildRunner {
    /// Run `script` to completion. The exit status is informational only.
    fn run_script(&mut self, script: &str) -> Result<Option<ExitStatus>, BuildError>;
}

/// Runs scripts with an external tool, `make -f <script>` by default.
#[derive(Debug, Clone)]
pub struct MakeRunner {
    command: Vec<String>,
    script_name: String,
    working_dir: PathBuf,
}

impl MakeRunner {
    pub fn new(command: Vec<String>, script_name: impl Into<String>, working_dir: PathBuf) -> Self {
        Self {
            command,
            script_name: script_name.into(),
            working_dir,
        }
    }

    pub fn from_config(config: &BuildConfig, working_dir: PathBuf) -> Self {
        Self::new(config.command.clone(), config.script_name.clone(), working_dir)
    }
}

impl BuildRunner for MakeRunner {
    fn run_script(&mut self, script: &str) -> Result<Option<ExitStatus>, BuildError> {
        let (program, args) = self.command.split_first().ok_or(BuildError::EmptyCommand)?;

        let scratch = tempfile::tempdir().map_err(BuildError::Stage)?;
        let script_path = scratch.path().join(&self.script_name);
        let mut contents = script.to_string();
        if !contents.ends_with('\n') {
            contents.push('\n');
        }
        fs::write(&script_path, contents).map_err(BuildError::Stage)?;

        log::debug!(
            "running {} {} {}",
            program,
            args.join(" "),
            script_path.display()
        );
        let status = Command::new(program)
            .args(args)
            .arg(&script_path)
            .current_dir(&self.working_dir)
            .status()
            .map_err(|source| BuildError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            log::warn!("build script exited with {status}");
        }
        Ok(Some(status))
    }
}

/// Runner used when build artifacts are disabled; never executes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRunner;

impl BuildRunner for NoopRunner {
    fn run_script(&mut self, _script: &str) -> Result<Option<ExitStatus>, BuildError> {
        Ok(None)
    }
}

/// Run a script and log instead of propagating failures. Build results
/// never influence the rendered page.
pub fn run_detached(runner: &mut dyn BuildRunner, script: &str) {
    if let Err(e) = runner.run_script(script) {
        log::warn!("build artifact not built: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_command_is_rejected() {
        let mut runner = MakeRunner::new(vec![], "Makefile", PathBuf::from("."));
        assert!(matches!(
            runner.run_script("all:\n"),
            Err(BuildError::EmptyCommand)
        ));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let mut runner = MakeRunner::new(
            vec!["definitely-not-a-build-tool-4821".to_string()],
            "Makefile",
            PathBuf::from("."),
        );
        assert!(matches!(
            runner.run_script("all:\n"),
            Err(BuildError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn script_is_staged_and_run_in_working_dir() {
        // `sh <script>` stands in for make: the script copies itself out
        // of the scratch directory so the test can inspect it.
        let work = TempDir::new().unwrap();
        let mut runner = MakeRunner::new(
            vec!["sh".to_string()],
            "build.sh",
            work.path().to_path_buf(),
        );

        let status = runner
            .run_script("cp \"$0\" staged.sh\necho done > out.txt")
            .unwrap()
            .unwrap();

        assert!(status.success());
        let staged = std::fs::read_to_string(work.path().join("staged.sh")).unwrap();
        assert_eq!(staged, "cp \"$0\" staged.sh\necho done > out.txt\n");
        let out = std::fs::read_to_string(work.path().join("out.txt")).unwrap();
        assert_eq!(out.trim(), "done");
    }

    #[cfg(unix)]
    #[test]
    fn scratch_directory_is_removed_afterwards() {
        let work = TempDir::new().unwrap();
        let mut runner = MakeRunner::new(
            vec!["sh".to_string()],
            "build.sh",
            work.path().to_path_buf(),
        );

        runner
            .run_script("dirname \"$0\" > scratch.txt\nexit 3")
            .unwrap();

        let scratch = std::fs::read_to_string(work.path().join("scratch.txt")).unwrap();
        assert!(!std::path::Path::new(scratch.trim()).exists());
    }

    #[test]
    fn noop_runner_runs_nothing() {
        assert!(NoopRunner.run_script("all:\n").unwrap().is_none());
    }
}
