//! # Markdown Filter
//!
//! Line rules that rewrite fenced code blocks, built on the [rule
//! engine](crate::mawk).
//!
//! ## Rules
//!
//! Evaluated in this order, first match wins:
//!
//! 1. **start_ignore** - `~~~markdown` opens a verbatim region
//! 2. **stop_ignore** - `~~~` closes it
//! 3. **open_code_block** - ```` ```{...} ```` gets a language tag and a
//!    `title` attribute; `.build-artifact` blocks start script collection
//! 4. **close_code_block** - the closing fence of a build-artifact block
//!    hands the collected script to the [`BuildRunner`]
//! 5. **add_line_to_script** - lines of a build-artifact block are
//!    captured and removed from the page
//!
//! Inside a verbatim region rules 3 to 5 never fire, so literal Markdown
//! examples stay byte-for-byte intact.
//!
//! ## Closing fences
//!
//! With [`ClosingFence::Verbatim`] a build-artifact block keeps both fences
//! and loses its body. [`ClosingFence::Suppress`] removes the block from the
//! page entirely, fences included, so the page never holds an unbalanced
//! fence. This is the one case where `open_code_block` does not emit the
//! re-rendered opening fence: it is erased along with the rest of the block.
//!
//! ## Line endings
//!
//! Lines keep their `\r` on CRLF pages; a rewritten opening fence gets it
//! back. Captured script lines lose it, so build tools always see LF.


use markdown_entangled_config::{BuildConfig, ClosingFence};

use crate::build::{self, BuildRunner, NoopRunner};
use crate::error::FilterError;
use crate::fence::CodeFence;
use crate::mawk::{LineMatch, Mode, Rule, RuleOutcome, RuleSet};
use crate::properties::{self, Property, parse_properties};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub build_artifacts: bool,
    pub closing_fence: ClosingFence,
}

impl FilterOptions {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            build_artifacts: config.enabled,
            closing_fence: config.closing_fence,
        }
    }
}

/// Scan position within the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub ignoring: bool,
    pub collecting_script: bool,
    pub script_lines: Vec<String>,
    pub script_indent: String,
    pub script_properties: Vec<Property>,
}

pub struct FilterState {
    options: FilterOptions,
    runner: Box<dyn BuildRunner>,
    scan: ScanState,
}

impl FilterState {
    fn start_ignore(&mut self, _m: &LineMatch<'_>) -> RuleOutcome {
        self.scan.ignoring = true;
        RuleOutcome::PassThrough
    }

    fn stop_ignore(&mut self, _m: &LineMatch<'_>) -> RuleOutcome {
        self.scan.ignoring = false;
        RuleOutcome::PassThrough
    }

    fn open_code_block(&mut self, m: &LineMatch<'_>) -> RuleOutcome {
        if self.scan.ignoring {
            return RuleOutcome::NoMatch;
        }

        let indent = m.name("indent").unwrap_or_default();
        let fence = m.name("fence").unwrap_or(CodeFence::BACKTICKS);
        let mut properties = match parse_properties(m.name("properties").unwrap_or_default()) {
            Ok(properties) => properties,
            Err(e) => {
                log::warn!("leaving code block as is: {e}");
                return RuleOutcome::NoMatch;
            }
        };

        let title = CodeFence::add_title(&mut properties);
        let mut line = CodeFence::render_open_line(indent, fence, &properties, title.as_deref());
        line.push_str(m.name("eol").unwrap_or_default());
        log::debug!("rewrote fence {:?} -> {:?}", m.line(), line);

        if self.options.build_artifacts
            && properties::has_class(&properties, CodeFence::BUILD_ARTIFACT_CLASS)
        {
            self.scan.collecting_script = true;
            self.scan.script_indent = indent.to_string();
            self.scan.script_properties = properties;
            self.scan.script_lines.clear();

            if self.options.closing_fence == ClosingFence::Suppress {
                return RuleOutcome::erase();
            }
        }

        RuleOutcome::replace_with(line)
    }

    fn close_code_block(&mut self, _m: &LineMatch<'_>) -> RuleOutcome {
        if self.scan.ignoring || !self.scan.collecting_script {
            return RuleOutcome::NoMatch;
        }

        self.scan.collecting_script = false;
        let script = std::mem::take(&mut self.scan.script_lines).join("\n");
        log::debug!(
            "running build artifact {:?}",
            properties::ids(&self.scan.script_properties)
        );
        build::run_detached(self.runner.as_mut(), &script);

        match self.options.closing_fence {
            ClosingFence::Verbatim => RuleOutcome::PassThrough,
            ClosingFence::Suppress => RuleOutcome::erase(),
        }
    }

    fn add_line_to_script(&mut self, m: &LineMatch<'_>) -> RuleOutcome {
        if self.scan.ignoring || !self.scan.collecting_script {
            return RuleOutcome::NoMatch;
        }

        let line = m.line();
        let stripped = line
            .strip_prefix(self.scan.script_indent.as_str())
            .unwrap_or(line);
        let stripped = stripped.strip_suffix('\r').unwrap_or(stripped);
        self.scan.script_lines.push(stripped.to_string());
        RuleOutcome::erase()
    }
}

/// The line filter. Build a new one per document: scan state carries over
/// between calls to [`MarkdownFilter::run`].
pub struct MarkdownFilter {
    rules: RuleSet<FilterState>,
}

impl MarkdownFilter {
    pub fn new(options: FilterOptions, runner: Box<dyn BuildRunner>) -> Result<Self, FilterError> {
        let state = FilterState {
            options,
            runner,
            scan: ScanState::default(),
        };
        let rules = vec![
            Rule::on_match(
                "start_ignore",
                CodeFence::VERBATIM_START_PATTERN,
                FilterState::start_ignore,
            )?,
            Rule::on_match(
                "stop_ignore",
                CodeFence::VERBATIM_END_PATTERN,
                FilterState::stop_ignore,
            )?,
            Rule::on_match(
                "open_code_block",
                CodeFence::OPEN_PATTERN,
                FilterState::open_code_block,
            )?,
            Rule::on_match(
                "close_code_block",
                CodeFence::CLOSE_PATTERN,
                FilterState::close_code_block,
            )?,
            Rule::always("add_line_to_script", FilterState::add_line_to_script),
        ];
        Ok(Self {
            rules: RuleSet::new(state, rules),
        })
    }

    /// A filter that only rewrites titles and never runs a build.
    pub fn titles_only() -> Result<Self, FilterError> {
        Self::new(FilterOptions::default(), Box::new(NoopRunner))
    }

    pub fn run(&mut self, markdown: &str) -> String {
        self.rules.run(markdown, Mode::Exclusive)
    }

    pub fn scan_state(&self) -> &ScanState {
        &self.rules.state().scan
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.rule_names()
    }
}
