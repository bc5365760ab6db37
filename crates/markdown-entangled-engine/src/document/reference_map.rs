use std::collections::HashMap;

use super::{CodeBlock, ReferenceId};
use crate::fence::CodeFence;
use crate::properties;

/// Code blocks of a page, keyed by [`ReferenceId`] and grouped by name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    map: HashMap<ReferenceId, CodeBlock>,
    index: HashMap<String, Vec<ReferenceId>>,
    anonymous: usize,
}

impl ReferenceMap {
    /// Register a block under its name: the first id, else the `file`
    /// attribute, else a fresh anonymous name.
    pub fn insert(&mut self, block: CodeBlock) -> ReferenceId {
        let name = self.block_name(&block);
        let ids = self.index.entry(name.clone()).or_default();
        let id = ReferenceId {
            name,
            ref_count: ids.len(),
        };
        ids.push(id.clone());
        self.map.insert(id.clone(), block);
        id
    }

    pub fn get_codeblock(&self, id: &ReferenceId) -> Option<&CodeBlock> {
        self.map.get(id)
    }

    pub fn get_codeblock_mut(&mut self, id: &ReferenceId) -> Option<&mut CodeBlock> {
        self.map.get_mut(id)
    }

    /// All blocks sharing `name`, in page order.
    pub fn by_name(&self, name: &str) -> &[ReferenceId] {
        self.index.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn block_name(&mut self, block: &CodeBlock) -> String {
        if let Some(id) = properties::ids(&block.properties).first() {
            return id.to_string();
        }
        if let Some(file) = block.attribute(CodeFence::FILE_KEY) {
            return file.to_string();
        }
        self.anonymous += 1;
        format!("#anonymous-{}", self.anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::parse_properties;
    use pretty_assertions::assert_eq;

    fn block(properties: &str) -> CodeBlock {
        CodeBlock {
            properties: parse_properties(properties).unwrap(),
            indent: String::new(),
            open_line: format!("``` {{{properties}}}"),
            source: vec![],
            close_line: "```".into(),
            line_ending: String::new(),
            line_number: 1,
        }
    }

    #[test]
    fn repeated_names_count_up() {
        let mut refs = ReferenceMap::default();
        let first = refs.insert(block("#hello .python"));
        let second = refs.insert(block("#hello .repl"));
        let other = refs.insert(block("#other"));

        assert_eq!(first.ref_count, 0);
        assert_eq!(second.ref_count, 1);
        assert_eq!(other.ref_count, 0);
        assert_eq!(refs.by_name("hello"), &[first, second]);
        assert_eq!(refs.len(), 3);
    }

    #[test]
    fn file_attribute_names_a_block_without_id() {
        let mut refs = ReferenceMap::default();
        let id = refs.insert(block("file=src/main.rs .rust"));
        assert_eq!(id.name, "src/main.rs");
    }

    #[test]
    fn anonymous_blocks_get_distinct_names() {
        let mut refs = ReferenceMap::default();
        let a = refs.insert(block(".python"));
        let b = refs.insert(block(".python"));

        assert_ne!(a.name, b.name);
        assert_eq!(b.ref_count, 0);
        assert!(refs.get_codeblock(&a).is_some());
    }

    #[test]
    fn unknown_name_is_empty() {
        let refs = ReferenceMap::default();
        assert!(refs.by_name("missing").is_empty());
        assert!(refs.is_empty());
    }
}
