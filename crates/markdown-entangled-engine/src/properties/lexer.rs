//! Tokenizer for code block attribute strings such as
//! `#main .python file="src/main.py"`.
//!
//! Every byte of the input ends up in exactly one token, including
//! whitespace, so callers can report precise offsets.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
///
/// The first byte decides the kind: `#` starts an id, `.` a class, `"` a
/// quoted string. A word directly followed by `=` is a key.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"")]
pub enum TokenKind {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// `#identifier`
    #[regex(r#"#[^\s{}="]+"#)]
    Id,

    /// `.classname`
    #[regex(r#"\.[^\s{}="]+"#)]
    Class,

    /// `key=`
    #[regex(r"[A-Za-z_][A-Za-z0-9_\-]*=")]
    Key,

    /// `"value"`, backslash escapes allowed
    #[regex(r#""([^"\\]|\\.)*""#)]
    Quoted,

    /// Any other run of non-space characters, used for unquoted values.
    #[regex(r##"[^\s{}="#.][^\s{}="]*"##)]
    Bare,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// `None` when the lexer could not classify the text.
    pub kind: Option<TokenKind>,
    pub text: &'a str,
    pub offset: usize,
}

/// Lex the input into a sequence of tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        tokens.push(Token {
            kind: result.ok(),
            text: lexer.slice(),
            offset: lexer.span().start,
        });
    }

    tokens
}
