// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bracket-tag scanner
//!
//! Finds `[name]`, `[/name]` and `[name=argument]` tokens left to right.
//! Anything that does not fit the grammar is simply not a token; the parser
//! sees it as part of the literal text between tokens.

use once_cell::sync::Lazy;
use regex::{CaptureMatches, Regex};
use std::ops::Range;

/// `[` + optional `/` + name (`*` or letters/digits) + optional `=argument` + `]`
static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[(/?)(\*|[a-z0-9]+)(?:=([^\]]+))?\]").unwrap());

/// One bracket tag found in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Byte range of the whole tag in the source
    pub span: Range<usize>,
    /// `[/name]` rather than `[name]`
    pub closing: bool,
    /// Tag name, lower-cased
    pub name: String,
    /// Everything between `=` and `]`, verbatim
    pub argument: Option<&'a str>,
    /// The tag exactly as written
    pub source: &'a str,
}

/// Iterator over the tags of `input`, in source order
pub struct Tokens<'a> {
    captures: CaptureMatches<'static, 'a>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.captures.next()?;
        let whole = caps.get(0)?;
        Some(Token {
            span: whole.range(),
            closing: caps.get(1).is_some_and(|m| !m.as_str().is_empty()),
            name: caps.get(2).map_or_else(String::new, |m| m.as_str().to_lowercase()),
            argument: caps.get(3).map(|m| m.as_str()),
            source: whole.as_str(),
        })
    }
}

/// Scan `input` for bracket tags
pub fn tokenize(input: &str) -> Tokens<'_> {
    Tokens {
        captures: TAG_PATTERN.captures_iter(input),
    }
}
