use crate::properties::{self, Property};

/// Title shown when a block names more than one id or file.
pub const AMBIGUOUS_TITLE: &str = "error: ambiguous code block title";

pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";

    pub const BUILD_ARTIFACT_CLASS: &'static str = "build-artifact";
    pub const REPL_CLASS: &'static str = "repl";
    pub const FILE_KEY: &'static str = "file";
    pub const TITLE_KEY: &'static str = "title";
    pub const SESSION_KEY: &'static str = "session";

    pub const VERBATIM_START_PATTERN: &'static str = r"~~~markdown\s*$";
    pub const VERBATIM_END_PATTERN: &'static str = r"~~~\s*$";
    /// Opening fence carrying a property block: indent, fence, properties,
    /// and the `\r` of a CRLF line.
    pub const OPEN_PATTERN: &'static str =
        r"(?P<indent>[ \t]*)(?P<fence>```)[ \t]*\{(?P<properties>.*)\}[ \t]*(?P<eol>\r?)$";
    pub const CLOSE_PATTERN: &'static str = r"(?P<indent>\s*)```\s*$";

    /// Title derived from the block's ids and `file` attributes.
    pub fn synthesize_title(properties: &[Property]) -> Option<String> {
        let ids = properties::ids(properties);
        let files = properties::attributes(properties, Self::FILE_KEY);

        match (ids.as_slice(), files.as_slice()) {
            ([id], [file]) => Some(format!("#{id} / file: {file}")),
            ([id], []) => Some(format!("#{id}")),
            ([], [file]) => Some(format!("file: {file}")),
            _ if ids.len() > 1 || files.len() > 1 => Some(AMBIGUOUS_TITLE.to_string()),
            _ => None,
        }
    }

    /// Append a synthesized title to `properties` unless one is present.
    /// Returns the title to render. An existing `title` attribute wins, so
    /// rewriting an already rewritten fence leaves it unchanged.
    pub fn add_title(properties: &mut Vec<Property>) -> Option<String> {
        if let Some(existing) = properties::get_attribute(properties, Self::TITLE_KEY) {
            return Some(existing.to_string());
        }
        let title = Self::synthesize_title(properties)?;
        properties.push(Property::attribute(Self::TITLE_KEY, title.clone()));
        Some(title)
    }

    /// Render an opening fence: the first class becomes the language tag,
    /// then `{#id .other-classes title="..."}` when there is anything left
    /// to show. Other attributes are not rendered.
    pub fn render_open_line(
        indent: &str,
        fence: &str,
        properties: &[Property],
        title: Option<&str>,
    ) -> String {
        let ids = properties::ids(properties);
        let classes = properties::classes(properties);

        let mut line = format!("{indent}{fence}");
        if let Some(language) = classes.first() {
            line.push_str(language);
        }

        let mut items: Vec<String> = Vec::new();
        if let Some(id) = ids.first() {
            items.push(Property::Id(id.to_string()).to_string());
        }
        for class in classes.iter().skip(1) {
            items.push(Property::Class(class.to_string()).to_string());
        }
        if let Some(title) = title {
            items.push(Property::attribute(Self::TITLE_KEY, title).to_string());
        }

        if !items.is_empty() {
            line.push_str(" {");
            line.push_str(&items.join(" "));
            line.push('}');
        }
        line
    }
}
