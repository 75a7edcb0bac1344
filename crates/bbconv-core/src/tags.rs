// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bracket-tag names and the micro-formats carried in tag arguments
//!
//! One table maps tag names to node kinds. Opening tags, closing tags and
//! the bracket-tag renderer all read it, so synonyms such as `b`/`strong`
//! behave the same everywhere.

use crate::ast::NodeKind;

/// Tag name to node kind. The first name listed for a kind is the one the
/// renderer writes.
const TAG_TABLE: &[(&str, NodeKind)] = &[
    ("*", NodeKind::ListItem),
    ("b", NodeKind::Bold),
    ("strong", NodeKind::Bold),
    ("i", NodeKind::Italic),
    ("em", NodeKind::Italic),
    ("u", NodeKind::Underline),
    ("s", NodeKind::Strikethrough),
    ("strike", NodeKind::Strikethrough),
    ("url", NodeKind::Link),
    ("img", NodeKind::Image),
    ("code", NodeKind::CodeBlock),
    ("quote", NodeKind::Quote),
    ("list", NodeKind::List),
    ("table", NodeKind::Table),
    ("tr", NodeKind::TableRow),
    ("td", NodeKind::TableCell),
    ("th", NodeKind::TableCell),
    ("color", NodeKind::Color),
    ("size", NodeKind::Size),
    ("font", NodeKind::Font),
    ("hr", NodeKind::HorizontalRule),
];

/// Resolve a lower-cased tag name
pub fn kind_for_tag(name: &str) -> Option<NodeKind> {
    TAG_TABLE
        .iter()
        .find(|(tag, _)| *tag == name)
        .map(|(_, kind)| *kind)
}

/// Canonical tag name for `kind`, `None` when the syntax has no tag for it
pub fn tag_for_kind(kind: NodeKind) -> Option<&'static str> {
    TAG_TABLE
        .iter()
        .find(|(_, k)| *k == kind)
        .map(|(tag, _)| *tag)
}

/// Whether a closing tag called `name` closes an open node of `kind`.
///
/// Matching is by kind, so `[b]…[/strong]` closes.
pub fn closes(kind: NodeKind, name: &str) -> bool {
    kind_for_tag(name) == Some(kind)
}

/// Kinds whose opening tag never takes content
pub fn is_self_closing(kind: NodeKind) -> bool {
    kind == NodeKind::HorizontalRule
}

/// The `[table=width,background]` argument.
///
/// Exactly two comma-separated positions are read; a third and anything
/// after it is dropped. Empty positions are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSpec {
    pub width: Option<String>,
    pub background: Option<String>,
}

impl TableSpec {
    pub fn parse(argument: &str) -> Self {
        let mut parts = argument.split(',').map(str::trim);
        let mut field = || parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let width = field();
        let background = field();
        Self { width, background }
    }

    /// Tag argument for this spec, `None` when both positions are absent
    pub fn to_argument(&self) -> Option<String> {
        match (&self.width, &self.background) {
            (None, None) => None,
            (Some(width), None) => Some(width.clone()),
            (width, Some(background)) => Some(format!(
                "{},{}",
                width.as_deref().unwrap_or(""),
                background
            )),
        }
    }
}
