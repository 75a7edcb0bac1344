// SPDX-License-Identifier: AGPL-3.0-or-later
//! Unified document tree for multi-format conversion
//!
//! Every parser produces a [`Tree`] and every renderer consumes one. Nodes
//! live in an arena owned by the tree and refer to each other through
//! [`NodeId`]. A node owns the ordered list of its children; the parent link
//! is a plain index that [`Tree::append_child`] and [`Tree::remove_child`]
//! keep in step with that list. It is bookkeeping only and is never
//! serialized.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Semantic role of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Document,
    Paragraph,
    Text,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Link,
    Image,
    CodeBlock,
    CodeInline,
    Quote,
    List,
    ListItem,
    Table,
    TableRow,
    TableCell,
    LineBreak,
    HorizontalRule,
    Font,
    Color,
    Size,
    RawHtml,
}

impl NodeKind {
    /// Every kind, in declaration order
    pub const ALL: [Self; 23] = [
        Self::Document,
        Self::Paragraph,
        Self::Text,
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strikethrough,
        Self::Link,
        Self::Image,
        Self::CodeBlock,
        Self::CodeInline,
        Self::Quote,
        Self::List,
        Self::ListItem,
        Self::Table,
        Self::TableRow,
        Self::TableCell,
        Self::LineBreak,
        Self::HorizontalRule,
        Self::Font,
        Self::Color,
        Self::Size,
        Self::RawHtml,
    ];

    /// Kinds that are complete without any children.
    ///
    /// The optimizer never prunes these, whatever their child count.
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Image | Self::HorizontalRule | Self::LineBreak)
    }

    /// Short name used in outlines and serialized trees
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Paragraph => "paragraph",
            Self::Text => "text",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::Link => "link",
            Self::Image => "image",
            Self::CodeBlock => "code_block",
            Self::CodeInline => "code_inline",
            Self::Quote => "quote",
            Self::List => "list",
            Self::ListItem => "list_item",
            Self::Table => "table",
            Self::TableRow => "table_row",
            Self::TableCell => "table_cell",
            Self::LineBreak => "line_break",
            Self::HorizontalRule => "horizontal_rule",
            Self::Font => "font",
            Self::Color => "color",
            Self::Size => "size",
            Self::RawHtml => "raw_html",
        }
    }
}

/// Attribute names shared by parsers and renderers
pub mod attr {
    /// Link target
    pub const HREF: &str = "href";
    /// Image source
    pub const SRC: &str = "src";
    /// List style (see [`super::ListStyle`])
    pub const STYLE: &str = "style";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    /// Background colour of tables and rows
    pub const BGCOLOR: &str = "bgcolor";
    pub const COLOR: &str = "color";
    pub const SIZE: &str = "size";
    /// Font family
    pub const FACE: &str = "face";
}

/// List marker style, stored on the list node's `style` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    /// Bullets
    #[default]
    Plain,
    /// 1, 2, 3
    Numeric,
    /// a, b, c
    LowerAlpha,
    /// A, B, C
    UpperAlpha,
}

impl ListStyle {
    /// Read the style from a list's attribute value. Unknown values are plain.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1") => Self::Numeric,
            Some("a") => Self::LowerAlpha,
            Some("A") => Self::UpperAlpha,
            _ => Self::Plain,
        }
    }

    /// Attribute value for this style, `None` for plain lists
    pub const fn as_attr(&self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Numeric => Some("1"),
            Self::LowerAlpha => Some("a"),
            Self::UpperAlpha => Some("A"),
        }
    }

    /// Marker for the item at zero-based `index`, without trailing punctuation
    pub fn marker(&self, index: usize) -> String {
        match self {
            Self::Plain => "-".to_string(),
            Self::Numeric => (index + 1).to_string(),
            Self::LowerAlpha => alpha_marker(index, false),
            Self::UpperAlpha => alpha_marker(index, true),
        }
    }
}

// a..z, aa..az, ba.. like spreadsheet columns
fn alpha_marker(index: usize, upper: bool) -> String {
    let base = if upper { b'A' } else { b'a' };
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push((base + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Ordered attribute map with unique keys.
///
/// Insertion order is kept for stable output but two maps with the same
/// entries compare equal in any order.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Set `name` to `value`, replacing an existing value in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for Attributes {}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Index of a node inside its [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A single node. Obtained through [`Tree::node`] and [`Tree::node_mut`].
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) content: String,
    pub(crate) attributes: Attributes,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            content: String::new(),
            attributes: Attributes::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Text payload. Meaningful for text and code nodes, empty elsewhere.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name, value);
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Deepest nesting the parsers build below the root. Markup opened past it
/// is kept as text, which bounds every recursive walk over a parsed tree.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Arena-backed document tree, rooted at a [`NodeKind::Document`] node
#[derive(Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Create a tree holding only an empty document root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
            root: NodeId(0),
        }
    }

    /// A document whose only child is `text` (nothing at all for empty text)
    pub fn from_text(text: &str) -> Self {
        let mut tree = Self::new();
        let root = tree.root();
        tree.push_text(root, text);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrowing view of the root
    pub fn root_ref(&self) -> NodeRef<'_> {
        self.get(self.root)
    }

    /// Borrowing view of `id`
    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Allocate a detached node of `kind`
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    /// Allocate a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        let id = self.create_node(NodeKind::Text);
        self.nodes[id.0].content = content.into();
        id
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// A child that already hangs elsewhere is detached from its old parent
    /// first, so a node is never shared. Appending the root or an ancestor of
    /// `parent` would create a cycle and is ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if child == self.root || child == parent || self.is_ancestor(child, parent) {
            tracing::trace!(?parent, ?child, "refusing to append, would create a cycle");
            return;
        }
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.remove_child(old_parent, child);
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detach `child` from `parent`. Returns whether it was a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|&id| id == child) {
            Some(index) => {
                siblings.remove(index);
                self.nodes[child.0].parent = None;
                true
            }
            None => false,
        }
    }

    /// Append text under `parent`, extending its last child when that is
    /// already a text node. Empty text is ignored.
    pub fn push_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if self.nodes[last.0].kind == NodeKind::Text {
                self.nodes[last.0].content.push_str(text);
                return;
            }
        }
        let id = self.create_text(text);
        self.append_child(parent, id);
    }

    /// Take the children list of `id`, leaving the parent links untouched.
    /// Callers hand a list back with [`Tree::set_children`].
    pub(crate) fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        std::mem::take(&mut self.nodes[id.0].children)
    }

    /// Install `children` under `id`, linking each of them to it
    pub(crate) fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes[id.0].children = children;
    }

    /// Clear the parent link of a node that was dropped from a children list
    pub(crate) fn detach(&mut self, id: NodeId) {
        self.nodes[id.0].parent = None;
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut current = self.nodes[of.0].parent;
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    /// Pretty JSON dump of the tree (parent links are not included)
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::ConversionError::SerializationError(e.to_string()))
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.root_ref() == other.root_ref()
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root_ref().serialize(serializer)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_outline(f, self.root_ref(), 0)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn write_outline(f: &mut fmt::Formatter<'_>, node: NodeRef<'_>, depth: usize) -> fmt::Result {
    write!(f, "{}{}", "  ".repeat(depth), node.kind().label())?;
    let content = node.content();
    if !content.is_empty() {
        let preview: String = content.chars().take(20).collect();
        let ellipsis = if content.chars().count() > 20 { "..." } else { "" };
        write!(f, " {:?}{}", preview, ellipsis)?;
    }
    if !node.attributes().is_empty() {
        let attrs: Vec<String> = node
            .attributes()
            .iter()
            .map(|(k, v)| format!("{}={:?}", k, v))
            .collect();
        write!(f, " {{{}}}", attrs.join(", "))?;
    }
    writeln!(f)?;
    for child in node.children() {
        write_outline(f, child, depth + 1)?;
    }
    Ok(())
}

/// Read-only view of one node together with the tree that owns it
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub fn node(&self) -> &'a Node {
        self.tree.node(self.id)
    }

    pub fn kind(&self) -> NodeKind {
        self.node().kind
    }

    pub fn content(&self) -> &'a str {
        &self.node().content
    }

    pub fn attributes(&self) -> &'a Attributes {
        &self.node().attributes
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node().attributes.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.node().attributes.contains(name)
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + ExactSizeIterator {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.children().next()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| self.tree.get(id))
    }

    pub fn is_leaf(&self) -> bool {
        self.node().children.is_empty()
    }

    /// This node and everything below it, in document order
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants { stack: vec![*self] }
    }

    /// Concatenated content of every text and code node in this subtree
    pub fn text_content(&self) -> String {
        self.descendants()
            .map(|node| node.content())
            .collect::<Vec<_>>()
            .concat()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
            && self.content() == other.content()
            && self.attributes() == other.attributes()
            && self.child_count() == other.child_count()
            && self.children().zip(other.children()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_outline(f, *self, 0)
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Children<'a>(NodeRef<'a>);

        impl Serialize for Children<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_seq(self.0.children())
            }
        }

        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("content", self.content())?;
        state.serialize_field("attributes", self.attributes())?;
        state.serialize_field("children", &Children(*self))?;
        state.end()
    }
}

/// Pre-order walk over a subtree
pub struct Descendants<'a> {
    stack: Vec<NodeRef<'a>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().rev());
        Some(node)
    }
}
