//! Entry points called by a site generator.
//!
//! [`on_pre_build`] runs once before any page is rendered and brings the
//! Markdown sources in sync with the tangled code. [`on_page_markdown`]
//! runs for every page and returns its rewritten Markdown.

use std::path::Path;
use std::process::Command;

use markdown_entangled_config::Config;
use relative_path::{RelativePath, RelativePathBuf};

use crate::build::{BuildRunner, MakeRunner, NoopRunner};
use crate::content::{self, ReplOptions};
use crate::document::{document_to_text, read_markdown};
use crate::error::{FilterError, HookError};
use crate::filter::{FilterOptions, MarkdownFilter};
use crate::io::{self, IoError};

/// The page being rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Location of the page below the docs directory.
    pub src_path: RelativePathBuf,
}

impl Page {
    pub fn new(src_path: impl Into<RelativePathBuf>) -> Self {
        Self {
            src_path: src_path.into(),
        }
    }
}

/// Index of the pages in the site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Files {
    pages: Vec<RelativePathBuf>,
}

impl Files {
    pub fn new(pages: Vec<RelativePathBuf>) -> Self {
        Self { pages }
    }

    pub fn from_docs_dir(docs_dir: &Path) -> Result<Self, IoError> {
        Ok(Self::new(io::scan_pages(docs_dir)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelativePath> {
        self.pages.iter().map(|p| p.as_relative_path())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Run the configured sync command in the project root.
pub fn on_pre_build(config: &Config) -> Result<(), HookError> {
    if !config.sync.enabled {
        log::debug!("sync disabled, skipping pre-build hook");
        return Ok(());
    }

    let (program, args) = config
        .sync
        .command
        .split_first()
        .ok_or(HookError::EmptyCommand)?;
    let command = config.sync.command.join(" ");
    log::info!("running `{command}`");

    let status = Command::new(program)
        .args(args)
        .current_dir(&config.project_root)
        .status()
        .map_err(|source| HookError::Spawn {
            program: program.clone(),
            source,
        })?;

    if !status.success() {
        return Err(HookError::Failed { command, status });
    }
    Ok(())
}

/// Rewrite one page, running build artifacts with the configured tool.
pub fn on_page_markdown(
    markdown: &str,
    page: &Page,
    config: &Config,
    files: &Files,
) -> Result<String, FilterError> {
    let runner: Box<dyn BuildRunner> = if config.build.enabled {
        Box::new(MakeRunner::from_config(
            &config.build,
            config.project_root.clone(),
        ))
    } else {
        Box::new(NoopRunner)
    };
    on_page_markdown_with_runner(markdown, page, config, files, runner)
}

/// [`on_page_markdown`] with a caller-supplied build runner.
pub fn on_page_markdown_with_runner(
    markdown: &str,
    page: &Page,
    config: &Config,
    _files: &Files,
    runner: Box<dyn BuildRunner>,
) -> Result<String, FilterError> {
    log::info!(
        "entangled markdown filter version {}",
        env!("CARGO_PKG_VERSION")
    );

    let options = FilterOptions::from_config(&config.build);

    if config.repl.enabled {
        log::debug!("filtering {} with the content chain", page.src_path);
        let filter = content::compose_filters([
            content::add_title(),
            content::run_build_artifacts(options, runner),
            content::include_repl_output(ReplOptions::from_config(config)),
        ]);
        let mut document = read_markdown(markdown)?;
        document.apply(&filter)?;
        document_to_text(&document)
    } else {
        log::debug!("filtering {} line by line", page.src_path);
        let mut filter = MarkdownFilter::new(options, runner)?;
        Ok(filter.run(markdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{RecordingRunner, create_test_docs_dir, create_test_file};
    use pretty_assertions::assert_eq;

    fn config_in(root: &Path) -> Config {
        let mut config = Config {
            project_root: root.to_path_buf(),
            ..Config::default()
        };
        config.sync.enabled = false;
        config
    }

    #[test]
    fn line_filter_is_used_without_repl() {
        let config = config_in(Path::new("."));
        let out = on_page_markdown(
            "``` {.python #a}\n```\n",
            &Page::new("index.md"),
            &config,
            &Files::default(),
        )
        .unwrap();
        assert_eq!(out, "```python {#a title=\"#a\"}\n```\n");
    }

    #[test]
    fn content_chain_is_used_with_repl() {
        let mut config = config_in(Path::new("."));
        config.repl.enabled = true;

        // Malformed properties only fail in the content chain
        let err = on_page_markdown(
            "``` {.python = x}\n```",
            &Page::new("index.md"),
            &config,
            &Files::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::Properties { line: 1, .. }));
    }

    #[test]
    fn both_paths_run_build_artifacts() {
        for repl in [false, true] {
            let mut config = config_in(Path::new("."));
            config.repl.enabled = repl;
            config.build.enabled = true;
            let runner = RecordingRunner::default();

            let out = on_page_markdown_with_runner(
                "``` {.make .build-artifact}\nall:\n```",
                &Page::new("index.md"),
                &config,
                &Files::default(),
                Box::new(runner.clone()),
            )
            .unwrap();

            assert_eq!(out, "```make {.build-artifact}\n```");
            assert_eq!(runner.scripts(), vec!["all:"]);
        }
    }

    #[test]
    fn files_index_the_docs_dir() {
        let docs = create_test_docs_dir();
        create_test_file(&docs, "index.md", "");
        create_test_file(&docs, "guide/setup.md", "");

        let files = Files::from_docs_dir(docs.path()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(
            files
                .iter()
                .any(|page| page == RelativePath::new("guide/setup.md"))
        );
    }

    #[test]
    fn pre_build_is_skipped_when_disabled() {
        let mut config = Config::default();
        config.sync.enabled = false;
        config.sync.command.clear();
        assert!(on_pre_build(&config).is_ok());
    }

    #[test]
    fn pre_build_rejects_an_empty_command() {
        let mut config = Config::default();
        config.sync.command.clear();
        assert!(matches!(on_pre_build(&config), Err(HookError::EmptyCommand)));
    }

    #[cfg(unix)]
    #[test]
    fn pre_build_reports_failure() {
        let root = create_test_docs_dir();
        let mut config = config_in(root.path());
        config.sync.enabled = true;
        config.sync.command = vec!["sh".into(), "-c".into(), "exit 2".into()];

        assert!(matches!(
            on_pre_build(&config),
            Err(HookError::Failed { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn pre_build_runs_in_project_root() {
        let root = create_test_docs_dir();
        let mut config = config_in(root.path());
        config.sync.enabled = true;
        config.sync.command = vec!["sh".into(), "-c".into(), "touch synced".into()];

        on_pre_build(&config).unwrap();

        assert!(root.path().join("synced").exists());
    }
}
