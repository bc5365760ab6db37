pub mod build;
pub mod content;
pub mod document;
pub mod error;
pub mod fence;
pub mod filter;
pub mod hooks;
pub mod io;
pub mod mawk;
pub mod properties;
pub mod session;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use build::{BuildError, BuildRunner, MakeRunner, NoopRunner};
pub use content::{ContentFilter, ReplOptions};
pub use document::{CodeBlock, Content, Document, ReferenceId, ReferenceMap};
pub use error::{FilterError, HookError};
pub use filter::{FilterOptions, MarkdownFilter};
pub use hooks::{Files, Page, on_page_markdown, on_pre_build};
pub use io::IoError;
pub use properties::{Property, PropertyError};
