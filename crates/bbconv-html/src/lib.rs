// SPDX-License-Identifier: AGPL-3.0-or-later
//! html5ever document adapter
//!
//! Implements the bbconv document capability set on top of
//! `markup5ever_rcdom`. Handles are reference-counted nodes; parent links are
//! the weak pointers rcdom keeps and are updated whenever a node moves.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bbconv_core::{DomAdapter, DomDocument, SelectorList, TEXT_NODE_NAME};
use html5ever::tendril::TendrilSink;
use html5ever::{
    ns, parse_document, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute,
    LocalName, QualName,
};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

/// Creates documents by running the html5ever parser
#[derive(Debug, Clone, Copy, Default)]
pub struct Html5everAdapter;

impl Html5everAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl DomAdapter for Html5everAdapter {
    type Document = RcDomDocument;

    fn parse_html(&self, html: &str) -> RcDomDocument {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        RcDomDocument {
            document: dom.document,
        }
    }

    fn create_document(&self) -> RcDomDocument {
        self.parse_html("")
    }
}

/// A parsed document. Always has `html`, `head` and `body` elements.
#[derive(Clone)]
pub struct RcDomDocument {
    document: Handle,
}

impl RcDomDocument {
    /// The document node itself, above `<html>`
    pub fn document_node(&self) -> &Handle {
        &self.document
    }
}

impl DomDocument for RcDomDocument {
    type Node = Handle;

    fn select(&self, pattern: &str) -> Vec<Handle> {
        select_from(&self.document, pattern)
    }

    fn html(&self) -> String {
        serialize_handle(&self.document, TraversalScope::ChildrenOnly(None))
    }

    fn text(&self) -> String {
        self.text_of(&self.document)
    }

    fn body(&self) -> Option<Handle> {
        descendants(&self.document)
            .into_iter()
            .find(|node| element_name(node).as_deref() == Some("body"))
    }

    fn tag_name(&self, node: &Handle) -> String {
        match &node.data {
            NodeData::Element { name, .. } => local_name(name),
            NodeData::Text { .. } => TEXT_NODE_NAME.to_string(),
            NodeData::Comment { .. } => "#comment".to_string(),
            NodeData::Document => "#document".to_string(),
            NodeData::Doctype { .. } => "#doctype".to_string(),
            NodeData::ProcessingInstruction { .. } => "#processing-instruction".to_string(),
        }
    }

    fn attr(&self, node: &Handle, name: &str) -> Option<String> {
        match &node.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| is_named(&a.name, name))
                .map(|a| a.value.to_string()),
            _ => None,
        }
    }

    fn set_attr(&mut self, node: &Handle, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &node.data {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter_mut().find(|a| is_named(&a.name, name)) {
                Some(existing) => existing.value = value.into(),
                None => attrs.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(name)),
                    value: value.into(),
                }),
            }
        }
    }

    fn has_attr(&self, node: &Handle, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    fn attribute_names(&self, node: &Handle) -> Vec<String> {
        match &node.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .map(|a| a.name.local.to_string())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn inner_html(&self, node: &Handle) -> String {
        serialize_handle(node, TraversalScope::ChildrenOnly(None))
    }

    fn set_inner_html(&mut self, node: &Handle, html: &str) {
        clear_children(node);
        for child in parse_fragment(html) {
            append(node, child);
        }
    }

    fn text_of(&self, node: &Handle) -> String {
        let mut text = String::new();
        collect_text(node, &mut text);
        text
    }

    fn set_text(&mut self, node: &Handle, text: &str) {
        clear_children(node);
        append(node, create_text(text));
    }

    fn children(&self, node: &Handle) -> Vec<Handle> {
        node.children
            .borrow()
            .iter()
            .filter(|c| matches!(c.data, NodeData::Element { .. } | NodeData::Text { .. }))
            .cloned()
            .collect()
    }

    fn select_within(&self, node: &Handle, pattern: &str) -> Vec<Handle> {
        select_from(node, pattern)
    }

    fn parent(&self, node: &Handle) -> Option<Handle> {
        parent_of(node)
    }

    fn replace_with(&mut self, node: &Handle, html: &str) {
        let Some(parent) = parent_of(node) else {
            return;
        };
        let replacement = parse_fragment(html);
        for new_node in &replacement {
            new_node.parent.set(Some(Rc::downgrade(&parent)));
        }
        let mut siblings = parent.children.borrow_mut();
        if let Some(index) = siblings.iter().position(|c| Rc::ptr_eq(c, node)) {
            siblings.splice(index..=index, replacement);
            node.parent.set(None);
        }
    }

    fn remove(&mut self, node: &Handle) {
        if let Some(parent) = parent_of(node) {
            parent.children.borrow_mut().retain(|c| !Rc::ptr_eq(c, node));
        }
        node.parent.set(None);
    }

    fn outer_html(&self, node: &Handle) -> String {
        match node.data {
            // rcdom refuses to serialize the document node itself
            NodeData::Document => serialize_handle(node, TraversalScope::ChildrenOnly(None)),
            _ => serialize_handle(node, TraversalScope::IncludeNode),
        }
    }
}

// `LocalName` is an atom with ASCII helpers of its own; compare as `str`
fn local_name(name: &QualName) -> String {
    let local: &str = &name.local;
    local.to_ascii_lowercase()
}

fn is_named(name: &QualName, wanted: &str) -> bool {
    let local: &str = &name.local;
    local.eq_ignore_ascii_case(wanted)
}

fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(local_name(name)),
        _ => None,
    }
}

/// Every node below `root` in document order, `root` excluded
fn descendants(root: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack: Vec<Handle> = root.children.borrow().iter().rev().cloned().collect();
    while let Some(node) = stack.pop() {
        stack.extend(node.children.borrow().iter().rev().cloned());
        out.push(node);
    }
    out
}

fn select_from(root: &Handle, pattern: &str) -> Vec<Handle> {
    let selector = SelectorList::parse(pattern);
    descendants(root)
        .into_iter()
        .filter(|node| element_name(node).is_some_and(|name| selector.matches(&name)))
        .collect()
}

fn collect_text(node: &Handle, out: &mut String) {
    let mut stack = vec![node.clone()];
    while let Some(node) = stack.pop() {
        match &node.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } | NodeData::Document => {
                stack.extend(node.children.borrow().iter().rev().cloned());
            }
            _ => {}
        }
    }
}

fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

fn append(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

fn clear_children(node: &Handle) {
    for child in node.children.take() {
        child.parent.set(None);
    }
}

fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.into()),
        },
    })
}

/// Parse `html` as body content and return the resulting top-level nodes
fn parse_fragment(html: &str) -> Vec<Handle> {
    let document = Html5everAdapter.parse_html(html);
    let Some(body) = document.body() else {
        return Vec::new();
    };
    let nodes = body.children.take();
    for node in &nodes {
        node.parent.set(None);
    }
    nodes
}

fn serialize_handle(node: &Handle, scope: TraversalScope) -> String {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: scope,
        ..Default::default()
    };
    if let Err(error) = serialize(&mut output, &SerializableHandle::from(node.clone()), opts) {
        tracing::warn!(%error, "html serialization failed");
        return String::new();
    }
    String::from_utf8_lossy(&output).into_owned()
}
