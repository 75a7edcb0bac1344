// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bracket-tag format handler
//!
//! Parsing keeps a stack of open nodes. Unknown tags and closing tags with
//! nothing to close become literal text, so no input is ever rejected.

use crate::ast::{attr, ListStyle, Node, NodeId, NodeKind, NodeRef, Tree, MAX_NESTING_DEPTH};
use crate::tags::{self, TableSpec};
use crate::tokenizer::{tokenize, Token};
use crate::traits::{Format, ParseConfig, Parser, RenderConfig, Renderer, Result};

/// Bracket-tag parser and renderer
pub struct BbcodeHandler;

impl BbcodeHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BbcodeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for BbcodeHandler {
    fn format(&self) -> Format {
        Format::BbCode
    }

    fn parse(&self, input: &str, config: &ParseConfig) -> Result<Tree> {
        let mut builder = TreeBuilder::new(config);
        let mut last_end = 0;

        for token in tokenize(input) {
            builder.text(&input[last_end..token.span.start]);
            if token.closing {
                builder.close(&token);
            } else {
                builder.open(&token);
            }
            last_end = token.span.end;
        }
        builder.text(&input[last_end..]);

        // Whatever is still open is closed by the end of input
        Ok(builder.tree)
    }
}

/// Parser state: the tree so far and the stack of open nodes
struct TreeBuilder<'c> {
    tree: Tree,
    stack: Vec<NodeId>,
    config: &'c ParseConfig,
}

impl<'c> TreeBuilder<'c> {
    fn new(config: &'c ParseConfig) -> Self {
        let tree = Tree::new();
        let stack = vec![tree.root()];
        Self {
            tree,
            stack,
            config,
        }
    }

    fn top(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }

    fn text(&mut self, text: &str) {
        let top = self.top();
        self.tree.push_text(top, text);
    }

    fn open(&mut self, token: &Token<'_>) {
        let kind = match tags::kind_for_tag(&token.name) {
            Some(NodeKind::Image) if !self.config.allow_images => None,
            other => other,
        };
        let Some(kind) = kind else {
            tracing::trace!(tag = token.source, "unknown tag kept as text");
            self.text(token.source);
            return;
        };

        let self_closing = tags::is_self_closing(kind);
        if !self_closing && self.stack.len() > MAX_NESTING_DEPTH {
            tracing::trace!(tag = token.source, "nesting too deep, tag kept as text");
            self.text(token.source);
            return;
        }

        let id = self.tree.create_node(kind);
        if let Some(argument) = token.argument {
            apply_argument(self.tree.node_mut(id), argument);
        }
        let top = self.top();
        self.tree.append_child(top, id);
        if !self_closing {
            self.stack.push(id);
        }
    }

    fn close(&mut self, token: &Token<'_>) {
        // The root sits at index 0 and is never closed by a tag
        let matched = self
            .stack
            .iter()
            .rposition(|&id| tags::closes(self.tree.node(id).kind(), &token.name))
            .filter(|&index| index > 0);

        match matched {
            Some(index) => self.stack.truncate(index),
            None => {
                tracing::trace!(tag = token.source, "unmatched closing tag kept as text");
                self.text(token.source);
            }
        }
    }
}

/// Store a tag argument on the attribute its kind uses
fn apply_argument(node: &mut Node, argument: &str) {
    match node.kind() {
        NodeKind::Link => node.set_attr(attr::HREF, argument),
        NodeKind::Image => node.set_attr(attr::SRC, argument),
        NodeKind::List => node.set_attr(attr::STYLE, argument),
        NodeKind::Table => {
            let spec = TableSpec::parse(argument);
            if let Some(width) = spec.width {
                node.set_attr(attr::WIDTH, width);
            }
            if let Some(background) = spec.background {
                node.set_attr(attr::BGCOLOR, background);
            }
        }
        NodeKind::TableRow => node.set_attr(attr::BGCOLOR, argument),
        NodeKind::TableCell => node.set_attr(attr::WIDTH, argument),
        NodeKind::Color => node.set_attr(attr::COLOR, argument),
        NodeKind::Size => node.set_attr(attr::SIZE, argument),
        NodeKind::Font => node.set_attr(attr::FACE, argument),
        _ => {}
    }
}

/// Tag argument to write back for a node, the inverse of [`apply_argument`]
fn argument_for(node: NodeRef<'_>) -> Option<String> {
    let value = match node.kind() {
        NodeKind::List => ListStyle::from_attr(node.attr(attr::STYLE))
            .as_attr()
            .map(str::to_string),
        NodeKind::Table => TableSpec {
            width: node.attr(attr::WIDTH).map(str::to_string),
            background: node.attr(attr::BGCOLOR).map(str::to_string),
        }
        .to_argument(),
        NodeKind::TableRow => node.attr(attr::BGCOLOR).map(str::to_string),
        NodeKind::TableCell => node.attr(attr::WIDTH).map(str::to_string),
        NodeKind::Color => node.attr(attr::COLOR).map(str::to_string),
        NodeKind::Size => node.attr(attr::SIZE).map(str::to_string),
        NodeKind::Font => node.attr(attr::FACE).map(str::to_string),
        _ => None,
    };
    value.filter(|v| !v.is_empty()).map(|v| bracket_safe(&v))
}

// An argument ends at the first `]`
fn bracket_safe(value: &str) -> String {
    value.replace(']', "%5D")
}

impl Renderer for BbcodeHandler {
    fn format(&self) -> Format {
        Format::BbCode
    }

    fn render(&self, tree: &Tree, _config: &RenderConfig) -> Result<String> {
        let mut output = String::new();
        render_node(&mut output, tree.root_ref());
        Ok(output)
    }
}

fn render_node(output: &mut String, node: NodeRef<'_>) {
    match node.kind() {
        NodeKind::Document => render_children(output, node),

        NodeKind::Paragraph => {
            render_children(output, node);
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
        }

        NodeKind::Text | NodeKind::RawHtml => output.push_str(node.content()),

        NodeKind::Link => render_link(output, node),

        NodeKind::Image => render_image(output, node),

        // Inline code has no bracket form of its own and shares `[code]`
        NodeKind::CodeBlock | NodeKind::CodeInline => {
            output.push_str("[code]");
            output.push_str(node.content());
            render_children(output, node);
            output.push_str("[/code]");
        }

        NodeKind::ListItem => {
            output.push_str("[*]");
            render_children(output, node);
        }

        NodeKind::LineBreak => output.push('\n'),

        NodeKind::HorizontalRule => output.push_str("[hr]"),

        NodeKind::Bold
        | NodeKind::Italic
        | NodeKind::Underline
        | NodeKind::Strikethrough
        | NodeKind::Quote
        | NodeKind::List
        | NodeKind::Table
        | NodeKind::TableRow
        | NodeKind::TableCell
        | NodeKind::Font
        | NodeKind::Color
        | NodeKind::Size => match tags::tag_for_kind(node.kind()) {
            Some(tag) => {
                open_tag(output, tag, argument_for(node).as_deref());
                render_children(output, node);
                close_tag(output, tag);
            }
            None => render_children(output, node),
        },
    }
}

fn render_children(output: &mut String, node: NodeRef<'_>) {
    for child in node.children() {
        render_node(output, child);
    }
}

fn open_tag(output: &mut String, tag: &str, argument: Option<&str>) {
    output.push('[');
    output.push_str(tag);
    if let Some(argument) = argument {
        output.push('=');
        output.push_str(argument);
    }
    output.push(']');
}

fn close_tag(output: &mut String, tag: &str) {
    output.push_str("[/");
    output.push_str(tag);
    output.push(']');
}

fn render_link(output: &mut String, node: NodeRef<'_>) {
    let href = node.attr(attr::HREF).filter(|h| !h.is_empty());
    let label_is_href = match (href, node.first_child()) {
        (Some(href), Some(child)) => {
            node.child_count() == 1 && child.kind() == NodeKind::Text && child.content() == href
        }
        (Some(_), None) => true,
        (None, _) => false,
    };

    match href {
        Some(href) if label_is_href => {
            open_tag(output, "url", None);
            output.push_str(href);
        }
        Some(href) => {
            open_tag(output, "url", Some(&bracket_safe(href)));
            render_children(output, node);
        }
        None => {
            open_tag(output, "url", None);
            render_children(output, node);
        }
    }
    close_tag(output, "url");
}

fn render_image(output: &mut String, node: NodeRef<'_>) {
    let src = node.attr(attr::SRC).filter(|s| !s.is_empty());
    match src {
        Some(src) if node.is_leaf() => {
            open_tag(output, "img", None);
            output.push_str(src);
        }
        Some(src) => {
            open_tag(output, "img", Some(&bracket_safe(src)));
            render_children(output, node);
        }
        None => {
            open_tag(output, "img", None);
            render_children(output, node);
        }
    }
    close_tag(output, "img");
}
