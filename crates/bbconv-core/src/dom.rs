// SPDX-License-Identifier: AGPL-3.0-or-later
//! Document-tree capability set used for HTML input
//!
//! The core never talks to an HTML parser directly. Ingestion goes through
//! [`DomAdapter`] and [`DomDocument`], so any backend that can provide
//! these operations can be plugged in. Node handles are opaque values owned
//! by the document that issued them.
//!
//! Patterns accepted by `select` are a comma-separated list of element names
//! with `*` matching any element (see [`SelectorList`]).

use crate::config::SanitizePolicy;

/// Name reported by [`DomDocument::tag_name`] for text nodes
pub const TEXT_NODE_NAME: &str = "#text";

/// Creates documents
pub trait DomAdapter {
    type Document: DomDocument;

    /// Parse HTML text into a document
    fn parse_html(&self, html: &str) -> Self::Document;

    /// An empty document
    fn create_document(&self) -> Self::Document;
}

/// A parsed document and the operations the converter may perform on it
pub trait DomDocument {
    /// Handle to one node of this document
    type Node: Clone;

    /// Every element in the document matching `pattern`, in document order
    fn select(&self, pattern: &str) -> Vec<Self::Node>;

    /// Serialized document
    fn html(&self) -> String;

    /// Text content of the whole document
    fn text(&self) -> String;

    /// The `<body>` element
    fn body(&self) -> Option<Self::Node>;

    /// Lower-case element name, or [`TEXT_NODE_NAME`] for text
    fn tag_name(&self, node: &Self::Node) -> String;

    fn attr(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attr(&mut self, node: &Self::Node, name: &str, value: &str);

    fn has_attr(&self, node: &Self::Node, name: &str) -> bool;

    fn attribute_names(&self, node: &Self::Node) -> Vec<String>;

    /// Serialized children of `node`
    fn inner_html(&self, node: &Self::Node) -> String;

    /// Replace the children of `node` with parsed `html`
    fn set_inner_html(&mut self, node: &Self::Node, html: &str);

    /// Text content of `node` and its descendants
    fn text_of(&self, node: &Self::Node) -> String;

    /// Replace the children of `node` with a single text node
    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Element and text children, in order
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Descendant elements of `node` matching `pattern`
    fn select_within(&self, node: &Self::Node, pattern: &str) -> Vec<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Swap `node` for the nodes parsed from `html`
    fn replace_with(&mut self, node: &Self::Node, html: &str);

    /// Detach `node` and its subtree from the document
    fn remove(&mut self, node: &Self::Node);

    /// Serialized `node` including itself
    fn outer_html(&self, node: &Self::Node) -> String;

    /// Drop unsafe elements and blank event-handler attributes
    fn strip_unsafe(&mut self, policy: &SanitizePolicy) {
        let pattern = policy.removal_pattern();
        if !pattern.is_empty() {
            for node in self.select(&pattern) {
                self.remove(&node);
            }
        }
        for node in self.select("*") {
            for name in self.attribute_names(&node) {
                if policy.is_event_attribute(&name) {
                    self.set_attr(&node, &name, "");
                }
            }
        }
    }
}

/// Parsed `select` pattern: element names separated by commas, `*` for any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    names: Vec<String>,
    any: bool,
}

impl SelectorList {
    pub fn parse(pattern: &str) -> Self {
        let mut names = Vec::new();
        let mut any = false;
        for part in pattern.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part == "*" {
                any = true;
            } else {
                names.push(part.to_ascii_lowercase());
            }
        }
        Self { names, any }
    }

    /// Whether an element called `tag` matches. Text nodes never match.
    pub fn matches(&self, tag: &str) -> bool {
        if tag == TEXT_NODE_NAME {
            return false;
        }
        self.any || self.names.iter().any(|name| name.eq_ignore_ascii_case(tag))
    }
}

/// Minimal in-memory document used by the core tests
#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    #[derive(Debug, Clone)]
    enum FakeData {
        Element {
            tag: String,
            attrs: Vec<(String, String)>,
        },
        Text(String),
    }

    #[derive(Debug, Clone)]
    struct FakeNode {
        data: FakeData,
        children: Vec<usize>,
        parent: Option<usize>,
    }

    /// Document built by hand; `parse_html` understands no markup at all and
    /// only returns a body holding the text.
    #[derive(Debug, Clone)]
    pub struct FakeDocument {
        nodes: Vec<FakeNode>,
        body: usize,
    }

    impl FakeDocument {
        pub fn new() -> Self {
            let mut doc = Self {
                nodes: Vec::new(),
                body: 0,
            };
            doc.body = doc.push(
                FakeData::Element {
                    tag: "body".into(),
                    attrs: Vec::new(),
                },
                None,
            );
            doc
        }

        pub fn body_id(&self) -> usize {
            self.body
        }

        fn push(&mut self, data: FakeData, parent: Option<usize>) -> usize {
            let id = self.nodes.len();
            self.nodes.push(FakeNode {
                data,
                children: Vec::new(),
                parent,
            });
            if let Some(p) = parent {
                self.nodes[p].children.push(id);
            }
            id
        }

        pub fn element(&mut self, parent: usize, tag: &str, attrs: &[(&str, &str)]) -> usize {
            let attrs = attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            self.push(
                FakeData::Element {
                    tag: tag.to_string(),
                    attrs,
                },
                Some(parent),
            )
        }

        pub fn text_node(&mut self, parent: usize, text: &str) -> usize {
            self.push(FakeData::Text(text.to_string()), Some(parent))
        }

        fn walk(&self, from: usize, out: &mut Vec<usize>) {
            for &child in &self.nodes[from].children {
                out.push(child);
                self.walk(child, out);
            }
        }

        fn matching(&self, from: usize, pattern: &str) -> Vec<usize> {
            let selector = SelectorList::parse(pattern);
            let mut all = Vec::new();
            self.walk(from, &mut all);
            all.into_iter()
                .filter(|&id| selector.matches(&self.tag_name(&id)))
                .collect()
        }

        fn serialize(&self, id: usize, out: &mut String) {
            match &self.nodes[id].data {
                FakeData::Text(t) => out.push_str(t),
                FakeData::Element { tag, attrs } => {
                    out.push('<');
                    out.push_str(tag);
                    for (k, v) in attrs {
                        out.push_str(&format!(" {}=\"{}\"", k, v));
                    }
                    out.push('>');
                    for &child in &self.nodes[id].children {
                        self.serialize(child, out);
                    }
                    out.push_str(&format!("</{}>", tag));
                }
            }
        }

        fn attrs_mut(&mut self, id: usize) -> Option<&mut Vec<(String, String)>> {
            match &mut self.nodes[id].data {
                FakeData::Element { attrs, .. } => Some(attrs),
                FakeData::Text(_) => None,
            }
        }

        fn clear_children(&mut self, id: usize) {
            for child in std::mem::take(&mut self.nodes[id].children) {
                self.nodes[child].parent = None;
            }
        }
    }

    impl DomDocument for FakeDocument {
        type Node = usize;

        fn select(&self, pattern: &str) -> Vec<usize> {
            self.matching(self.body, pattern)
        }

        fn html(&self) -> String {
            self.outer_html(&self.body)
        }

        fn text(&self) -> String {
            self.text_of(&self.body)
        }

        fn body(&self) -> Option<usize> {
            Some(self.body)
        }

        fn tag_name(&self, node: &usize) -> String {
            match &self.nodes[*node].data {
                FakeData::Element { tag, .. } => tag.to_ascii_lowercase(),
                FakeData::Text(_) => TEXT_NODE_NAME.to_string(),
            }
        }

        fn attr(&self, node: &usize, name: &str) -> Option<String> {
            match &self.nodes[*node].data {
                FakeData::Element { attrs, .. } => attrs
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v.clone()),
                FakeData::Text(_) => None,
            }
        }

        fn set_attr(&mut self, node: &usize, name: &str, value: &str) {
            if let Some(attrs) = self.attrs_mut(*node) {
                match attrs.iter_mut().find(|(k, _)| k == name) {
                    Some(entry) => entry.1 = value.to_string(),
                    None => attrs.push((name.to_string(), value.to_string())),
                }
            }
        }

        fn has_attr(&self, node: &usize, name: &str) -> bool {
            self.attr(node, name).is_some()
        }

        fn attribute_names(&self, node: &usize) -> Vec<String> {
            match &self.nodes[*node].data {
                FakeData::Element { attrs, .. } => attrs.iter().map(|(k, _)| k.clone()).collect(),
                FakeData::Text(_) => Vec::new(),
            }
        }

        fn inner_html(&self, node: &usize) -> String {
            let mut out = String::new();
            for &child in &self.nodes[*node].children {
                self.serialize(child, &mut out);
            }
            out
        }

        fn set_inner_html(&mut self, node: &usize, html: &str) {
            self.set_text(node, html);
        }

        fn text_of(&self, node: &usize) -> String {
            match &self.nodes[*node].data {
                FakeData::Text(t) => t.clone(),
                FakeData::Element { .. } => self.nodes[*node]
                    .children
                    .iter()
                    .map(|c| self.text_of(c))
                    .collect(),
            }
        }

        fn set_text(&mut self, node: &usize, text: &str) {
            self.clear_children(*node);
            self.text_node(*node, text);
        }

        fn children(&self, node: &usize) -> Vec<usize> {
            self.nodes[*node].children.clone()
        }

        fn select_within(&self, node: &usize, pattern: &str) -> Vec<usize> {
            self.matching(*node, pattern)
        }

        fn parent(&self, node: &usize) -> Option<usize> {
            self.nodes[*node].parent
        }

        fn replace_with(&mut self, node: &usize, html: &str) {
            if let Some(parent) = self.nodes[*node].parent {
                let replacement = self.push(FakeData::Text(html.to_string()), None);
                self.nodes[replacement].parent = Some(parent);
                let siblings = &mut self.nodes[parent].children;
                if let Some(index) = siblings.iter().position(|c| c == node) {
                    siblings[index] = replacement;
                }
                self.nodes[*node].parent = None;
            }
        }

        fn remove(&mut self, node: &usize) {
            if let Some(parent) = self.nodes[*node].parent.take() {
                self.nodes[parent].children.retain(|c| c != node);
            }
        }

        fn outer_html(&self, node: &usize) -> String {
            let mut out = String::new();
            self.serialize(*node, &mut out);
            out
        }
    }

    /// Adapter handing out [`FakeDocument`]s
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FakeAdapter;

    impl DomAdapter for FakeAdapter {
        type Document = FakeDocument;

        fn parse_html(&self, html: &str) -> FakeDocument {
            let mut doc = FakeDocument::new();
            if !html.is_empty() {
                let body = doc.body_id();
                doc.text_node(body, html);
            }
            doc
        }

        fn create_document(&self) -> FakeDocument {
            FakeDocument::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeDocument;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_selector_list() {
        let selector = SelectorList::parse("script, STYLE ,");
        assert!(selector.matches("script"));
        assert!(selector.matches("style"));
        assert!(!selector.matches("p"));
        assert!(SelectorList::parse("*").matches("p"));
        assert!(!SelectorList::parse("*").matches(TEXT_NODE_NAME));
        assert!(!SelectorList::parse("").matches("p"));
    }

    #[test]
    fn test_strip_unsafe_removes_elements_and_blanks_handlers() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let p = doc.element(body, "p", &[("onclick", "evil()"), ("class", "x")]);
        doc.text_node(p, "kept");
        let script = doc.element(body, "script", &[]);
        doc.text_node(script, "alert(1)");

        doc.strip_unsafe(&SanitizePolicy::default());

        assert_eq!(doc.children(&body), vec![p]);
        assert_eq!(doc.attr(&p, "onclick"), Some(String::new()));
        assert_eq!(doc.attr(&p, "class"), Some("x".to_string()));
        assert_eq!(doc.text(), "kept");
        assert_eq!(doc.parent(&script), None);
    }

    #[test]
    fn test_strip_unsafe_with_empty_policy_keeps_everything() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let script = doc.element(body, "script", &[("onload", "x()")]);
        let policy = SanitizePolicy {
            remove_elements: Vec::new(),
            event_attribute_prefix: String::new(),
        };

        doc.strip_unsafe(&policy);

        assert_eq!(doc.children(&body), vec![script]);
        assert_eq!(doc.attr(&script, "onload"), Some("x()".to_string()));
    }
}
