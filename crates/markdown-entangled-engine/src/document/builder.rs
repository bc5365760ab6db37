use std::sync::OnceLock;

use regex::Regex;

use super::{CodeBlock, Content, Document, ReferenceMap};
use crate::error::FilterError;
use crate::fence::CodeFence;
use crate::properties::parse_properties;

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})")).expect("Invalid fence regex")
}

fn verbatim_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| anchored(CodeFence::VERBATIM_START_PATTERN))
}

fn verbatim_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| anchored(CodeFence::VERBATIM_END_PATTERN))
}

fn open_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| anchored(CodeFence::OPEN_PATTERN))
}

fn close_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| anchored(CodeFence::CLOSE_PATTERN))
}

fn any_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| anchored(r"\s*```"))
}

#[derive(Debug)]
enum LeafState {
    None,
    Verbatim,
    PlainFence,
    Block(CodeBlock),
}

/// Consumes a page line by line. Lines outside attribute fences become
/// [`Content::PlainText`]; attribute fences become registered
/// [`CodeBlock`]s.
pub struct DocumentBuilder {
    leaf: LeafState,
    references: ReferenceMap,
    out: Vec<Content>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            leaf: LeafState::None,
            references: ReferenceMap::default(),
            out: vec![],
        }
    }

    /// Feed the next line. `line_number` is 1-based.
    pub fn push(&mut self, line_number: usize, line: &str) -> Result<(), FilterError> {
        match &mut self.leaf {
            LeafState::Verbatim => {
                if verbatim_end().is_match(line) {
                    self.leaf = LeafState::None;
                }
                self.push_text(line);
            }
            LeafState::PlainFence => {
                if close_fence().is_match(line) {
                    self.leaf = LeafState::None;
                }
                self.push_text(line);
            }
            LeafState::Block(block) => {
                if close_fence().is_match(line) {
                    block.close_line = line.to_string();
                    self.close_block();
                } else {
                    block.source.push(line.to_string());
                }
            }
            LeafState::None => self.open_leaf(line_number, line)?,
        }
        Ok(())
    }

    pub fn finish(mut self) -> Document {
        // EOF flush: an unterminated block goes back to the page as text
        if let LeafState::Block(block) = std::mem::replace(&mut self.leaf, LeafState::None) {
            log::warn!(
                "code block opened on line {} is never closed",
                block.line_number
            );
            self.out.push(Content::PlainText(block.open_line));
            self.out
                .extend(block.source.into_iter().map(Content::PlainText));
        }

        Document {
            references: self.references,
            content: self.out,
            trailing_newline: false,
        }
    }

    fn open_leaf(&mut self, line_number: usize, line: &str) -> Result<(), FilterError> {
        if verbatim_start().is_match(line) {
            self.leaf = LeafState::Verbatim;
        } else if let Some(caps) = open_fence().captures(line) {
            let raw = caps.name("properties").map_or("", |m| m.as_str());
            let properties = parse_properties(raw).map_err(|source| FilterError::Properties {
                line: line_number,
                source,
            })?;
            let indent = caps.name("indent").map_or("", |m| m.as_str());
            let line_ending = caps.name("eol").map_or("", |m| m.as_str());
            self.leaf = LeafState::Block(CodeBlock {
                properties,
                indent: indent.to_string(),
                open_line: line.to_string(),
                source: vec![],
                close_line: String::new(),
                line_ending: line_ending.to_string(),
                line_number,
            });
            return Ok(());
        } else if any_fence().is_match(line) {
            self.leaf = LeafState::PlainFence;
        }

        self.push_text(line);
        Ok(())
    }

    fn close_block(&mut self) {
        if let LeafState::Block(block) = std::mem::replace(&mut self.leaf, LeafState::None) {
            let id = self.references.insert(block);
            self.out.push(Content::Reference(id));
        }
    }

    fn push_text(&mut self, line: &str) {
        self.out.push(Content::PlainText(line.to_string()));
    }
}
