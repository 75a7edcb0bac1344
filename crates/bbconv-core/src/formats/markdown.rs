// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markdown output
//!
//! There is no Markdown parser; asking to parse Markdown is an
//! unsupported-format error at the converter level. Text is written as is,
//! without escaping.

use crate::ast::{attr, ListStyle, NodeKind, NodeRef, Tree};
use crate::traits::{Format, RenderConfig, Renderer, Result};

/// Markdown renderer
pub struct MarkdownHandler;

impl MarkdownHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for MarkdownHandler {
    fn format(&self) -> Format {
        Format::Markdown
    }

    fn render(&self, tree: &Tree, config: &RenderConfig) -> Result<String> {
        let writer = MarkdownWriter { config };
        let mut output = writer.children(tree.root_ref(), 0);
        let trimmed = output.trim_end_matches('\n').len();
        output.truncate(trimmed);
        if !output.is_empty() {
            output.push('\n');
        }
        Ok(output)
    }
}

/// Kinds that start on a line of their own
fn is_block(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Paragraph
            | NodeKind::CodeBlock
            | NodeKind::Quote
            | NodeKind::List
            | NodeKind::Table
            | NodeKind::HorizontalRule
    )
}

/// `item` followed by the items opened inside it, in document order.
///
/// An item opened while another is still open nests inside it; in Markdown
/// such items are written as the following entries of the same list.
fn item_chain(item: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    let mut chain = Vec::new();
    let mut stack = vec![item];
    while let Some(node) = stack.pop() {
        chain.push(node);
        stack.extend(node.children().filter(|c| c.kind() == NodeKind::ListItem).rev());
    }
    chain
}

/// Code text: the node's own content, then whatever its children hold
fn code_text(node: NodeRef<'_>) -> String {
    let mut text = node.content().to_string();
    for child in node.children() {
        text.push_str(&child.text_content());
    }
    text
}

/// `-` for bullets, `1.`, `a.` or `A.` otherwise
fn list_marker(style: ListStyle, index: usize) -> String {
    match style {
        ListStyle::Plain => style.marker(index),
        _ => format!("{}.", style.marker(index)),
    }
}

/// The list an item belongs to, above any items it is nested in
fn owning_list(item: NodeRef<'_>) -> Option<NodeRef<'_>> {
    let mut current = item.parent();
    while let Some(node) = current {
        match node.kind() {
            NodeKind::List => return Some(node),
            NodeKind::ListItem => current = node.parent(),
            _ => return None,
        }
    }
    None
}

struct MarkdownWriter<'c> {
    config: &'c RenderConfig,
}

impl MarkdownWriter<'_> {
    /// `depth` is the list nesting level, used for item indentation
    fn children(&self, node: NodeRef<'_>, depth: usize) -> String {
        self.join(node.children(), depth)
    }

    fn join<'a>(&self, children: impl Iterator<Item = NodeRef<'a>>, depth: usize) -> String {
        let mut output = String::new();
        for child in children {
            if is_block(child.kind()) && !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&self.node(child, depth));
        }
        output
    }

    fn node(&self, node: NodeRef<'_>, depth: usize) -> String {
        match node.kind() {
            NodeKind::Document
            | NodeKind::TableRow
            | NodeKind::TableCell
            | NodeKind::Font
            | NodeKind::Color
            | NodeKind::Size => self.children(node, depth),

            NodeKind::Text | NodeKind::RawHtml => node.content().to_string(),

            NodeKind::Paragraph => {
                let body = self.children(node, depth);
                format!("{}\n\n", body.trim_end_matches('\n'))
            }

            NodeKind::Bold => format!("**{}**", self.children(node, depth)),
            NodeKind::Italic => format!("*{}*", self.children(node, depth)),
            NodeKind::Underline => format!("<u>{}</u>", self.children(node, depth)),
            NodeKind::Strikethrough => format!("~~{}~~", self.children(node, depth)),

            NodeKind::Link => {
                let label = self.children(node, depth);
                match node.attr(attr::HREF) {
                    Some(href) if label.is_empty() => format!("<{}>", href),
                    Some(href) => format!("[{}]({})", label, href),
                    None => label,
                }
            }

            NodeKind::Image => format!(
                "![{}]({})",
                node.text_content(),
                node.attr(attr::SRC).unwrap_or_default()
            ),

            NodeKind::CodeBlock => {
                let body = code_text(node);
                format!("```\n{}\n```\n\n", body.trim_end_matches('\n'))
            }

            NodeKind::CodeInline => format!("`{}`", code_text(node)),

            NodeKind::Quote => {
                let body = self.children(node, depth);
                let mut quoted = String::new();
                for line in body.trim_end_matches('\n').lines() {
                    if line.is_empty() {
                        quoted.push_str(">\n");
                    } else {
                        quoted.push_str("> ");
                        quoted.push_str(line);
                        quoted.push('\n');
                    }
                }
                quoted.push('\n');
                quoted
            }

            NodeKind::List => self.list(node, depth),

            // Reached only for an item rendered apart from its list walk
            NodeKind::ListItem => {
                let (style, start) = match owning_list(node) {
                    Some(list) => {
                        let index = list
                            .children()
                            .filter(|c| c.kind() == NodeKind::ListItem)
                            .flat_map(item_chain)
                            .position(|c| c.id() == node.id())
                            .unwrap_or(0);
                        (ListStyle::from_attr(list.attr(attr::STYLE)), index)
                    }
                    None => (ListStyle::Plain, 0),
                };
                let mut output = String::new();
                for (offset, item) in item_chain(node).into_iter().enumerate() {
                    let marker = list_marker(style, start + offset);
                    output.push_str(&self.item(item, depth, &marker));
                }
                output
            }

            NodeKind::Table => self.table(node, depth),

            NodeKind::LineBreak => "  \n".to_string(),

            NodeKind::HorizontalRule => "---\n\n".to_string(),
        }
    }

    fn list(&self, node: NodeRef<'_>, depth: usize) -> String {
        let style = ListStyle::from_attr(node.attr(attr::STYLE));
        let mut output = String::new();
        let mut index = 0;
        for child in node.children() {
            if child.kind() == NodeKind::ListItem {
                for item in item_chain(child) {
                    let marker = list_marker(style, index);
                    output.push_str(&self.item(item, depth, &marker));
                    index += 1;
                }
            } else {
                output.push_str(&self.node(child, depth));
            }
        }
        if depth == 0 {
            output.push('\n');
        }
        output
    }

    /// One entry; items nested in it are written by the caller
    fn item(&self, node: NodeRef<'_>, depth: usize, marker: &str) -> String {
        let own = node.children().filter(|c| c.kind() != NodeKind::ListItem);
        let body = self.join(own, depth + 1);
        format!(
            "{}{} {}\n",
            self.config.indent.repeat(depth),
            marker,
            body.trim_end_matches('\n')
        )
    }

    fn table(&self, node: NodeRef<'_>, depth: usize) -> String {
        let mut output = String::new();
        let rows = node.children().filter(|r| r.kind() == NodeKind::TableRow);
        for (index, row) in rows.enumerate() {
            let cells: Vec<String> = row
                .children()
                .filter(|c| c.kind() == NodeKind::TableCell)
                .map(|c| self.cell(c, depth))
                .collect();
            output.push('|');
            for cell in &cells {
                output.push(' ');
                output.push_str(cell);
                output.push_str(" |");
            }
            output.push('\n');
            if index == 0 {
                output.push('|');
                output.push_str(&" --- |".repeat(cells.len()));
                output.push('\n');
            }
        }
        output.push('\n');
        output
    }

    fn cell(&self, node: NodeRef<'_>, depth: usize) -> String {
        self.children(node, depth)
            .trim()
            .replace('\n', " ")
            .replace('|', "\\|")
    }
}
