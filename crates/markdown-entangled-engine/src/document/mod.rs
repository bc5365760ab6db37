//! Block-level view of a page for content filters.
//!
//! A page is read into a flat list of [`Content`]: plain lines, and
//! references to the attribute-carrying code blocks held in a
//! [`ReferenceMap`]. Filters rewrite that list and the blocks behind it;
//! [`document_to_text`] turns the result back into Markdown.

pub mod builder;
pub mod reference_map;

use std::fmt;

pub use builder::DocumentBuilder;
pub use reference_map::ReferenceMap;

use crate::content::ContentFilter;
use crate::error::FilterError;
use crate::mawk::{join_lines, split_lines};
use crate::properties::{self, Property};

/// A fenced code block opened with a property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub properties: Vec<Property>,
    pub indent: String,
    pub open_line: String,
    /// Body lines as they appear on the page, indentation included.
    pub source: Vec<String>,
    pub close_line: String,
    /// `"\r"` when the opening fence ended in CRLF, else empty.
    pub line_ending: String,
    /// 1-based line number of the opening fence.
    pub line_number: usize,
}

impl CodeBlock {
    pub fn has_class(&self, class: &str) -> bool {
        properties::has_class(&self.properties, class)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        properties::get_attribute(&self.properties, key)
    }

    /// Body with the fence indentation removed from every line that has it,
    /// joined with LF.
    pub fn dedented_source(&self) -> String {
        self.source
            .iter()
            .map(|line| line.strip_prefix(self.indent.as_str()).unwrap_or(line))
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.open_line.as_str())
            .chain(self.source.iter().map(String::as_str))
            .chain(std::iter::once(self.close_line.as_str()))
    }
}

/// Key of a code block: its name, plus its position among the blocks that
/// share that name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceId {
    pub name: String,
    pub ref_count: usize,
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.ref_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    PlainText(String),
    Reference(ReferenceId),
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub references: ReferenceMap,
    pub content: Vec<Content>,
    pub trailing_newline: bool,
}

impl Document {
    /// Run `filter` over every content item, replacing the content list
    /// with the concatenated results.
    pub fn apply(&mut self, filter: &ContentFilter<'_>) -> Result<(), FilterError> {
        let content = std::mem::take(&mut self.content);
        self.content = crate::content::iter_bind(filter, &mut self.references, content)?;
        Ok(())
    }
}

/// Read a page into a [`Document`].
pub fn read_markdown(text: &str) -> Result<Document, FilterError> {
    let (lines, trailing_newline) = split_lines(text);
    let mut builder = DocumentBuilder::new();
    for (index, line) in lines.into_iter().enumerate() {
        builder.push(index + 1, line)?;
    }
    let mut document = builder.finish();
    document.trailing_newline = trailing_newline;
    Ok(document)
}

/// Render a [`Document`] back to Markdown.
pub fn document_to_text(document: &Document) -> Result<String, FilterError> {
    let mut lines: Vec<&str> = Vec::new();
    for item in &document.content {
        match item {
            Content::PlainText(text) => lines.push(text),
            Content::Reference(id) => {
                let block = document
                    .references
                    .get_codeblock(id)
                    .ok_or_else(|| FilterError::UnknownReference(id.to_string()))?;
                lines.extend(block.lines());
            }
        }
    }
    Ok(join_lines(&lines, document.trailing_newline))
}
