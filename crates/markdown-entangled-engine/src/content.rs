//! # Content filters
//!
//! A [`ContentFilter`] maps one [`Content`] item to any number of items and
//! may rewrite the code blocks in the [`ReferenceMap`] along the way.
//! Filters chain with [`compose_filter`]: the second filter runs over every
//! item the first one produced.
//!
//! ```text
//! add_title -> run_build_artifacts -> include_repl_output
//! ```

use std::cell::RefCell;
use std::path::PathBuf;

use markdown_entangled_config::{ClosingFence, Config};

use crate::build::{self, BuildRunner};
use crate::document::{CodeBlock, Content, ReferenceId, ReferenceMap};
use crate::error::FilterError;
use crate::fence::CodeFence;
use crate::filter::FilterOptions;
use crate::session::{read_session_file, session_output_path};

pub type ContentFilter<'a> =
    Box<dyn Fn(&mut ReferenceMap, Content) -> Result<Vec<Content>, FilterError> + 'a>;

pub fn identity<'a>() -> ContentFilter<'a> {
    Box::new(|_, content| Ok(vec![content]))
}

/// Lift a filter over code blocks to one over content. Plain text passes
/// through untouched.
pub fn codeblock_filter<'a, F>(f: F) -> ContentFilter<'a>
where
    F: Fn(&mut ReferenceMap, ReferenceId) -> Result<Vec<Content>, FilterError> + 'a,
{
    Box::new(move |refs, content| match content {
        Content::PlainText(_) => Ok(vec![content]),
        Content::Reference(id) => f(refs, id),
    })
}

/// Apply `filter` to every item and concatenate the results.
pub fn iter_bind<I>(
    filter: &ContentFilter<'_>,
    refs: &mut ReferenceMap,
    content: I,
) -> Result<Vec<Content>, FilterError>
where
    I: IntoIterator<Item = Content>,
{
    let mut out = Vec::new();
    for item in content {
        out.extend(filter(refs, item)?);
    }
    Ok(out)
}

pub fn compose_filter<'a>(first: ContentFilter<'a>, second: ContentFilter<'a>) -> ContentFilter<'a> {
    Box::new(move |refs, content| {
        let produced = first(refs, content)?;
        iter_bind(&second, refs, produced)
    })
}

/// Chain `filters` left to right, starting from [`identity`].
pub fn compose_filters<'a, I>(filters: I) -> ContentFilter<'a>
where
    I: IntoIterator<Item = ContentFilter<'a>>,
{
    filters.into_iter().fold(identity(), compose_filter)
}

fn lookup<'r>(
    refs: &'r mut ReferenceMap,
    id: &ReferenceId,
) -> Result<&'r mut CodeBlock, FilterError> {
    refs.get_codeblock_mut(id)
        .ok_or_else(|| FilterError::UnknownReference(id.to_string()))
}

/// Rewrite every opening fence into the `lang {#id .class title="..."}`
/// form.
pub fn add_title<'a>() -> ContentFilter<'a> {
    codeblock_filter(|refs, id| {
        let block = lookup(refs, &id)?;
        let title = CodeFence::add_title(&mut block.properties);
        block.open_line = CodeFence::render_open_line(
            &block.indent,
            CodeFence::BACKTICKS,
            &block.properties,
            title.as_deref(),
        );
        block.open_line.push_str(&block.line_ending);
        Ok(vec![Content::Reference(id)])
    })
}

/// Hand the body of every `.build-artifact` block to `runner`, then drop
/// the body, or the whole block with [`ClosingFence::Suppress`].
pub fn run_build_artifacts<'a>(
    options: FilterOptions,
    runner: Box<dyn BuildRunner + 'a>,
) -> ContentFilter<'a> {
    let runner = RefCell::new(runner);
    codeblock_filter(move |refs, id| {
        let block = lookup(refs, &id)?;
        if !options.build_artifacts || !block.has_class(CodeFence::BUILD_ARTIFACT_CLASS) {
            return Ok(vec![Content::Reference(id)]);
        }

        let script = block.dedented_source();
        block.source.clear();
        log::debug!("running build artifact {id}");
        build::run_detached(&mut **runner.borrow_mut(), &script);

        match options.closing_fence {
            ClosingFence::Verbatim => Ok(vec![Content::Reference(id)]),
            ClosingFence::Suppress => Ok(vec![]),
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplOptions {
    /// Session paths are resolved against this directory.
    pub project_root: PathBuf,
    pub output_suffix: String,
}

impl ReplOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            project_root: config.project_root.clone(),
            output_suffix: config.repl.output_suffix.clone(),
        }
    }
}

/// Prefix every non-blank line of `text` with `prefix`.
fn indent_text(text: &str, prefix: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect()
}

/// Append the recorded output of every `.repl` block.
///
/// All blocks sharing a name replay one session, named by the `session`
/// attribute of the first of them; the n-th block shows the output of
/// command n.
pub fn include_repl_output<'a>(options: ReplOptions) -> ContentFilter<'a> {
    codeblock_filter(move |refs, id| {
        let Some(block) = refs.get_codeblock(&id) else {
            return Err(FilterError::UnknownReference(id.to_string()));
        };
        if !block.has_class(CodeFence::REPL_CLASS) {
            return Ok(vec![Content::Reference(id)]);
        }
        let indent = block.indent.clone();
        let line_ending = block.line_ending.clone();

        let session = refs
            .by_name(&id.name)
            .first()
            .and_then(|first| refs.get_codeblock(first))
            .and_then(|first| first.attribute(CodeFence::SESSION_KEY))
            .ok_or_else(|| FilterError::MissingSessionAttribute {
                name: id.name.clone(),
            })?;

        let session_path = options.project_root.join(session);
        if !session_path.exists() {
            return Err(FilterError::MissingSessionFile(session_path));
        }
        let output_path = session_output_path(&session_path, &options.output_suffix);
        if !output_path.exists() {
            return Err(FilterError::MissingSessionOutput(output_path));
        }

        let recorded = read_session_file(&output_path)?;
        let command = recorded
            .commands
            .get(id.ref_count)
            .ok_or_else(|| FilterError::MissingCommand {
                path: output_path.clone(),
                index: id.ref_count,
            })?;

        let Some(output) = command.output() else {
            return Ok(vec![Content::Reference(id)]);
        };
        log::debug!("appending output of {id} from {}", output_path.display());

        let text = if command.is_plain_text() {
            format!("\n``` {{.text .output}}\n{output}\n```")
        } else {
            format!("\n**unknown MIME type: {}**", command.output_type)
        };
        let mut text = indent_text(&text, &indent);
        if !line_ending.is_empty() {
            text = text.replace('\n', &format!("{line_ending}\n"));
            text.push_str(&line_ending);
        }
        Ok(vec![Content::Reference(id), Content::PlainText(text)])
    })
}
