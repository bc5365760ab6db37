//! Code block properties: the `{#id .class key="value"}` annotation that
//! follows an opening fence.

pub mod lexer;

use std::fmt;

use lexer::{Token, TokenKind, lex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    Id(String),
    Class(String),
    Attribute { key: String, value: String },
}

impl Property {
    pub fn attribute(key: impl Into<String>, value: impl Into<String>) -> Self {
        Property::Attribute {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Id(id) => write!(f, "#{id}"),
            Property::Class(class) => write!(f, ".{class}"),
            Property::Attribute { key, value } => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "{key}=\"{escaped}\"")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("unexpected `{text}` at offset {offset} in code block properties")]
    Unexpected { text: String, offset: usize },
    #[error("attribute `{key}` has no value")]
    MissingValue { key: String },
}

/// Parse the inside of a `{...}` annotation. Surrounding braces are
/// accepted and ignored.
pub fn parse_properties(input: &str) -> Result<Vec<Property>, PropertyError> {
    let tokens: Vec<Token<'_>> = lex(input)
        .into_iter()
        .filter(|t| t.kind != Some(TokenKind::Whitespace))
        .collect();

    let mut properties = Vec::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        match token.kind {
            Some(TokenKind::LBrace) | Some(TokenKind::RBrace) => {}
            Some(TokenKind::Id) => properties.push(Property::Id(token.text[1..].to_string())),
            Some(TokenKind::Class) => {
                properties.push(Property::Class(token.text[1..].to_string()))
            }
            Some(TokenKind::Key) => {
                let key = token.text[..token.text.len() - 1].to_string();
                let value = match iter.peek().and_then(|t| t.kind) {
                    Some(TokenKind::Quoted) => {
                        let quoted = iter.next().map(|t| t.text).unwrap_or("\"\"");
                        unquote(quoted)
                    }
                    Some(TokenKind::Bare | TokenKind::Id | TokenKind::Class) => iter
                        .next()
                        .map(|t| t.text.to_string())
                        .unwrap_or_default(),
                    _ => return Err(PropertyError::MissingValue { key }),
                };
                properties.push(Property::Attribute { key, value });
            }
            _ => {
                return Err(PropertyError::Unexpected {
                    text: token.text.to_string(),
                    offset: token.offset,
                });
            }
        }
    }

    Ok(properties)
}

fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Value of the first attribute named `key`.
pub fn get_attribute<'a>(properties: &'a [Property], key: &str) -> Option<&'a str> {
    properties.iter().find_map(|p| match p {
        Property::Attribute { key: k, value } if k == key => Some(value.as_str()),
        _ => None,
    })
}

pub fn ids(properties: &[Property]) -> Vec<&str> {
    properties
        .iter()
        .filter_map(|p| match p {
            Property::Id(id) => Some(id.as_str()),
            _ => None,
        })
        .collect()
}

pub fn classes(properties: &[Property]) -> Vec<&str> {
    properties
        .iter()
        .filter_map(|p| match p {
            Property::Class(class) => Some(class.as_str()),
            _ => None,
        })
        .collect()
}

/// Values of every attribute named `key`, in order.
pub fn attributes<'a>(properties: &'a [Property], key: &str) -> Vec<&'a str> {
    properties
        .iter()
        .filter_map(|p| match p {
            Property::Attribute { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
        .collect()
}

pub fn has_class(properties: &[Property], class: &str) -> bool {
    properties
        .iter()
        .any(|p| matches!(p, Property::Class(c) if c == class))
}
