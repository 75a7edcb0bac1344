// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTML format handler
//!
//! Ingestion walks a document obtained from a [`DomAdapter`] after the unsafe
//! parts have been stripped. Rendering writes the forum dialect of HTML
//! (`<b>`, `<font>`, `class="t_table"`, ...) directly from the tree.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{attr, ListStyle, NodeId, NodeKind, NodeRef, Tree, MAX_NESTING_DEPTH};
use crate::dom::{DomAdapter, DomDocument, TEXT_NODE_NAME};
use crate::traits::{Format, ParseConfig, Parser, RenderConfig, Renderer, Result};

static BACKGROUND_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)background-color\s*:\s*([^;]+)").unwrap());

/// HTML parser over a pluggable document backend, and HTML renderer
pub struct HtmlHandler<A> {
    adapter: A,
}

impl<A> HtmlHandler<A> {
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}

impl<A: DomAdapter> Parser for HtmlHandler<A> {
    fn format(&self) -> Format {
        Format::Html
    }

    fn parse(&self, input: &str, config: &ParseConfig) -> Result<Tree> {
        let mut document = self.adapter.parse_html(input);
        document.strip_unsafe(&config.sanitize);
        let tree = tree_from_document(&document, config);
        tracing::debug!(input_len = input.len(), "ingested html document");
        Ok(tree)
    }
}

impl<A> Renderer for HtmlHandler<A> {
    fn format(&self) -> Format {
        Format::Html
    }

    fn render(&self, tree: &Tree, config: &RenderConfig) -> Result<String> {
        HtmlRenderer.render(tree, config)
    }
}

/// Convert the body of an already prepared document into a tree.
///
/// Elements without a counterpart (`span`, unknown names) are transparent:
/// their children are lifted into the enclosing node.
pub fn tree_from_document<D: DomDocument>(document: &D, config: &ParseConfig) -> Tree {
    let mut tree = Tree::new();
    if let Some(body) = document.body() {
        let root = tree.root();
        let mut ingest = Ingest {
            document,
            tree: &mut tree,
            config,
            depth: 0,
        };
        ingest.children(&body, root);
    }
    tree
}

struct Ingest<'a, D: DomDocument> {
    document: &'a D,
    tree: &'a mut Tree,
    config: &'a ParseConfig,
    /// Elements entered below the body
    depth: usize,
}

impl<D: DomDocument> Ingest<'_, D> {
    /// Past [`MAX_NESTING_DEPTH`] the rest of the subtree is kept as its text
    fn children(&mut self, node: &D::Node, parent: NodeId) {
        if self.depth >= MAX_NESTING_DEPTH {
            tracing::trace!("nesting too deep, keeping text only");
            let text = self.document.text_of(node);
            self.tree.push_text(parent, &text);
            return;
        }
        self.depth += 1;
        for child in self.document.children(node) {
            self.node(&child, parent);
        }
        self.depth -= 1;
    }

    fn node(&mut self, node: &D::Node, parent: NodeId) {
        let tag = self.document.tag_name(node);
        match tag.as_str() {
            TEXT_NODE_NAME => {
                let text = self.document.text_of(node);
                self.tree.push_text(parent, &text);
            }
            "p" => {
                self.container(node, parent, NodeKind::Paragraph);
            }
            "div" => {
                let class = self.document.attr(node, "class").unwrap_or_default();
                let mut classes = class.split_whitespace();
                if classes.clone().any(|c| c == "blockcode") {
                    self.code(node, parent, NodeKind::CodeBlock);
                } else if classes.any(|c| c == "quote") {
                    self.children(node, parent);
                } else {
                    self.container(node, parent, NodeKind::Paragraph);
                }
            }
            "b" | "strong" => {
                self.container(node, parent, NodeKind::Bold);
            }
            "i" | "em" => {
                self.container(node, parent, NodeKind::Italic);
            }
            "u" => {
                self.container(node, parent, NodeKind::Underline);
            }
            "s" | "strike" | "del" => {
                self.container(node, parent, NodeKind::Strikethrough);
            }
            "a" => {
                let id = self.open(parent, NodeKind::Link);
                self.copy_attr(node, id, "href", attr::HREF);
                self.children(node, id);
            }
            "img" => {
                if self.config.allow_images {
                    let id = self.open(parent, NodeKind::Image);
                    self.copy_attr(node, id, "src", attr::SRC);
                    self.copy_attr(node, id, "width", attr::WIDTH);
                    self.copy_attr(node, id, "height", attr::HEIGHT);
                }
            }
            "pre" => self.code(node, parent, NodeKind::CodeBlock),
            "code" => self.code(node, parent, NodeKind::CodeInline),
            "blockquote" => {
                self.container(node, parent, NodeKind::Quote);
            }
            "ul" | "ol" => {
                let declared = self.document.attr(node, "type");
                let style = match ListStyle::from_attr(declared.as_deref()) {
                    ListStyle::Plain if tag == "ol" => ListStyle::Numeric,
                    style => style,
                };
                let id = self.open(parent, NodeKind::List);
                if let Some(value) = style.as_attr() {
                    self.tree.node_mut(id).set_attr(attr::STYLE, value);
                }
                self.children(node, id);
            }
            "li" => {
                self.container(node, parent, NodeKind::ListItem);
            }
            "table" => {
                let id = self.open(parent, NodeKind::Table);
                self.copy_attr(node, id, "width", attr::WIDTH);
                self.copy_background(node, id);
                self.children(node, id);
            }
            "tr" => {
                let id = self.open(parent, NodeKind::TableRow);
                self.copy_background(node, id);
                self.children(node, id);
            }
            "td" | "th" => {
                let id = self.open(parent, NodeKind::TableCell);
                self.copy_attr(node, id, "width", attr::WIDTH);
                self.children(node, id);
            }
            "br" => {
                self.open(parent, NodeKind::LineBreak);
            }
            "hr" => {
                self.open(parent, NodeKind::HorizontalRule);
            }
            "font" => self.font(node, parent),
            _ => self.children(node, parent),
        }
    }

    fn open(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.tree.create_node(kind);
        self.tree.append_child(parent, id);
        id
    }

    fn container(&mut self, node: &D::Node, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.open(parent, kind);
        self.children(node, id);
        id
    }

    /// Code keeps its text verbatim, markup inside it is flattened
    fn code(&mut self, node: &D::Node, parent: NodeId, kind: NodeKind) {
        let id = self.open(parent, kind);
        let text = self.document.text_of(node);
        self.tree.push_text(id, &text);
    }

    /// `color`, `size` and `face` each become a node, nested in that order
    fn font(&mut self, node: &D::Node, parent: NodeId) {
        let mut current = parent;
        for (name, kind) in [
            ("color", NodeKind::Color),
            ("size", NodeKind::Size),
            ("face", NodeKind::Font),
        ] {
            if let Some(value) = self.non_empty_attr(node, name) {
                current = self.open(current, kind);
                self.tree.node_mut(current).set_attr(name, value);
            }
        }
        self.children(node, current);
    }

    fn non_empty_attr(&self, node: &D::Node, name: &str) -> Option<String> {
        self.document
            .attr(node, name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn copy_attr(&mut self, node: &D::Node, id: NodeId, from: &str, to: &str) {
        if let Some(value) = self.non_empty_attr(node, from) {
            self.tree.node_mut(id).set_attr(to, value);
        }
    }

    /// `bgcolor`, or else a `background-color` declaration in `style`
    fn copy_background(&mut self, node: &D::Node, id: NodeId) {
        let color = self.non_empty_attr(node, "bgcolor").or_else(|| {
            let style = self.document.attr(node, "style")?;
            let caps = BACKGROUND_COLOR.captures(&style)?;
            let value = caps.get(1)?.as_str().trim();
            (!value.is_empty()).then(|| value.to_string())
        });
        if let Some(color) = color {
            self.tree.node_mut(id).set_attr(attr::BGCOLOR, color);
        }
    }
}

/// Escape the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Tree to forum-dialect HTML
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn format(&self) -> Format {
        Format::Html
    }

    fn render(&self, tree: &Tree, config: &RenderConfig) -> Result<String> {
        let mut writer = HtmlWriter {
            output: String::new(),
            config,
        };
        writer.node(tree.root_ref());
        Ok(writer.output)
    }
}

struct HtmlWriter<'c> {
    output: String,
    config: &'c RenderConfig,
}

impl HtmlWriter<'_> {
    fn node(&mut self, node: NodeRef<'_>) {
        match node.kind() {
            NodeKind::Document => self.children(node),
            NodeKind::Paragraph => self.wrap(node, "<p>", "</p>\n"),
            NodeKind::Text => self.text(node.content()),
            NodeKind::Bold => self.wrap(node, "<b>", "</b>"),
            NodeKind::Italic => self.wrap(node, "<i>", "</i>"),
            NodeKind::Underline => self.wrap(node, "<u>", "</u>"),
            NodeKind::Strikethrough => self.wrap(node, "<strike>", "</strike>"),
            NodeKind::Link => {
                self.output.push_str("<a");
                if let Some(href) = node.attr(attr::HREF) {
                    self.attribute("href", href);
                }
                self.output.push_str(" target=\"_blank\">");
                self.children(node);
                self.output.push_str("</a>");
            }
            NodeKind::Image => {
                self.output.push_str("<img");
                self.attribute("src", node.attr(attr::SRC).unwrap_or_default());
                for name in [attr::WIDTH, attr::HEIGHT] {
                    if let Some(value) = node.attr(name) {
                        self.attribute(name, value);
                    }
                }
                self.output.push_str(" border=\"0\" alt=\"\" />");
            }
            NodeKind::CodeBlock => {
                self.output.push_str("<div class=\"blockcode\"><blockquote>");
                self.text(node.content());
                self.children(node);
                self.output.push_str("</blockquote></div>\n");
            }
            NodeKind::CodeInline => {
                self.output.push_str("<code>");
                self.text(node.content());
                self.children(node);
                self.output.push_str("</code>");
            }
            NodeKind::Quote => self.wrap(
                node,
                "<div class=\"quote\"><blockquote>",
                "</blockquote></div>\n",
            ),
            NodeKind::List => {
                let open = match ListStyle::from_attr(node.attr(attr::STYLE)) {
                    ListStyle::Plain => "<ul>",
                    ListStyle::Numeric => "<ul type=\"1\" class=\"litype_1\">",
                    ListStyle::LowerAlpha => "<ul type=\"a\" class=\"litype_2\">",
                    ListStyle::UpperAlpha => "<ul type=\"A\" class=\"litype_3\">",
                };
                self.wrap(node, open, "</ul>\n");
            }
            NodeKind::ListItem => {
                self.output.push_str("<li>");
                for child in node.children().filter(|c| c.kind() != NodeKind::ListItem) {
                    self.node(child);
                }
                self.output.push_str("</li>");
                // An item opened inside another one follows it in the list
                for child in node.children().filter(|c| c.kind() == NodeKind::ListItem) {
                    self.node(child);
                }
            }
            NodeKind::Table => {
                self.output.push_str("<table class=\"t_table\"");
                if let Some(width) = node.attr(attr::WIDTH) {
                    self.attribute("width", width);
                }
                if let Some(color) = node.attr(attr::BGCOLOR) {
                    self.attribute("style", &format!("background-color: {}", color));
                }
                self.output.push('>');
                self.children(node);
                self.output.push_str("</table>\n");
            }
            NodeKind::TableRow => {
                self.output.push_str("<tr");
                if let Some(color) = node.attr(attr::BGCOLOR) {
                    self.attribute("style", &format!("background-color: {}", color));
                }
                self.output.push('>');
                self.children(node);
                self.output.push_str("</tr>");
            }
            NodeKind::TableCell => {
                self.output.push_str("<td");
                if let Some(width) = node.attr(attr::WIDTH) {
                    self.attribute("width", width);
                }
                self.output.push('>');
                self.children(node);
                self.output.push_str("</td>");
            }
            NodeKind::Color => self.font(node, "color", attr::COLOR),
            NodeKind::Size => self.font(node, "size", attr::SIZE),
            NodeKind::Font => self.font(node, "face", attr::FACE),
            NodeKind::LineBreak => self.output.push_str("<br />"),
            NodeKind::HorizontalRule => self.output.push_str("<hr class=\"l\" />"),
            NodeKind::RawHtml => self.output.push_str(node.content()),
        }
    }

    fn children(&mut self, node: NodeRef<'_>) {
        for child in node.children() {
            self.node(child);
        }
    }

    fn wrap(&mut self, node: NodeRef<'_>, open: &str, close: &str) {
        self.output.push_str(open);
        self.children(node);
        self.output.push_str(close);
    }

    fn font(&mut self, node: NodeRef<'_>, html_name: &str, key: &str) {
        match node.attr(key) {
            Some(value) => {
                self.output.push_str("<font");
                self.attribute(html_name, value);
                self.output.push('>');
                self.children(node);
                self.output.push_str("</font>");
            }
            None => self.children(node),
        }
    }

    /// Attribute values are escaped whatever the configuration says
    fn attribute(&mut self, name: &str, value: &str) {
        self.output.push(' ');
        self.output.push_str(name);
        self.output.push_str("=\"");
        self.output.push_str(&escape_html(value));
        self.output.push('"');
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let text = if self.config.escape_html {
            escape_html(text)
        } else {
            text.to_string()
        };
        let text = text
            .replace("\r\n", "<br />")
            .replace('\n', "<br />")
            .replace("  ", "&nbsp;&nbsp;");
        self.output.push_str(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SanitizePolicy;
    use crate::dom::fake::{FakeAdapter, FakeDocument};
    use crate::formats::bbcode::BbcodeHandler;
    use crate::optimizer::Optimizer;
    use pretty_assertions::assert_eq;

    fn bbcode_to_html(input: &str) -> String {
        let mut tree = BbcodeHandler::new()
            .parse(input, &ParseConfig::default())
            .unwrap();
        Optimizer::new().optimize(&mut tree);
        HtmlRenderer.render(&tree, &RenderConfig::default()).unwrap()
    }

    fn ingest(document: &FakeDocument) -> Tree {
        let mut tree = tree_from_document(document, &ParseConfig::default());
        Optimizer::new().optimize(&mut tree);
        tree
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_inline_tags() {
        assert_eq!(
            bbcode_to_html("[b]a[/b][i]b[/i][u]c[/u][s]d[/s]"),
            "<b>a</b><i>b</i><u>c</u><strike>d</strike>"
        );
    }

    #[test]
    fn test_render_text_escaping_and_breaks() {
        assert_eq!(
            bbcode_to_html("a < b\r\nc  d\ne"),
            "a &lt; b<br />c&nbsp;&nbsp;d<br />e"
        );

        let mut tree = Tree::from_text("<i>kept</i>");
        Optimizer::new().optimize(&mut tree);
        let config = RenderConfig {
            escape_html: false,
            ..RenderConfig::default()
        };
        assert_eq!(HtmlRenderer.render(&tree, &config).unwrap(), "<i>kept</i>");
    }

    #[test]
    fn test_render_link_and_image() {
        assert_eq!(
            bbcode_to_html("[url]http://x.test/?a=1&b=2[/url]"),
            "<a href=\"http://x.test/?a=1&amp;b=2\" target=\"_blank\">http://x.test/?a=1&amp;b=2</a>"
        );
        assert_eq!(
            bbcode_to_html("[img]http://x.test/a.png[/img]"),
            "<img src=\"http://x.test/a.png\" border=\"0\" alt=\"\" />"
        );
    }

    #[test]
    fn test_attributes_escaped_even_without_text_escaping() {
        let mut tree = Tree::new();
        let root = tree.root();
        let link = tree.create_node(NodeKind::Link);
        tree.node_mut(link).set_attr(attr::HREF, "x\" onclick=\"y");
        tree.append_child(root, link);
        tree.push_text(link, "t");
        let config = RenderConfig {
            escape_html: false,
            ..RenderConfig::default()
        };
        assert_eq!(
            HtmlRenderer.render(&tree, &config).unwrap(),
            "<a href=\"x&quot; onclick=&quot;y\" target=\"_blank\">t</a>"
        );
    }

    #[test]
    fn test_render_code_and_quote() {
        assert_eq!(
            bbcode_to_html("[code]x<y[/code][quote]q[/quote]"),
            "<div class=\"blockcode\"><blockquote>x&lt;y</blockquote></div>\n\
             <div class=\"quote\"><blockquote>q</blockquote></div>\n"
        );
    }

    #[test]
    fn test_render_lists() {
        assert_eq!(
            bbcode_to_html("[list][*]a[*]b[/list]"),
            "<ul><li>a</li><li>b</li></ul>\n"
        );
        assert_eq!(
            bbcode_to_html("[list=1][*]a[/list][list=a][*]b[/list][list=A][*]c[/list]"),
            "<ul type=\"1\" class=\"litype_1\"><li>a</li></ul>\n\
             <ul type=\"a\" class=\"litype_2\"><li>b</li></ul>\n\
             <ul type=\"A\" class=\"litype_3\"><li>c</li></ul>\n"
        );
    }

    #[test]
    fn test_render_table() {
        assert_eq!(
            bbcode_to_html("[table=80%,#eee][tr=red][td=20]x[/td][/tr][/table]"),
            "<table class=\"t_table\" width=\"80%\" style=\"background-color: #eee\">\
             <tr style=\"background-color: red\"><td width=\"20\">x</td></tr></table>\n"
        );
    }

    #[test]
    fn test_render_fonts_and_voids() {
        assert_eq!(
            bbcode_to_html("[color=red]a[/color][size=3]b[/size][font=Arial]c[/font][hr]"),
            "<font color=\"red\">a</font><font size=\"3\">b</font>\
             <font face=\"Arial\">c</font><hr class=\"l\" />"
        );
    }

    #[test]
    fn test_render_every_kind_alone() {
        for kind in NodeKind::ALL {
            let mut tree = Tree::new();
            let root = tree.root();
            let id = tree.create_node(kind);
            tree.append_child(root, id);
            assert!(HtmlRenderer.render(&tree, &RenderConfig::default()).is_ok());
        }
    }

    #[test]
    fn test_ingest_inline_and_links() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let p = doc.element(body, "p", &[]);
        let strong = doc.element(p, "strong", &[]);
        doc.text_node(strong, "bold");
        let a = doc.element(p, "a", &[("href", "http://x.test")]);
        doc.text_node(a, "link");
        let span = doc.element(p, "span", &[]);
        doc.text_node(span, " tail");

        let tree = ingest(&doc);
        let para = tree.root_ref().first_child().unwrap();
        assert_eq!(para.kind(), NodeKind::Paragraph);
        let kinds: Vec<_> = para.children().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::Bold, NodeKind::Link, NodeKind::Text]);
        assert_eq!(
            para.children().nth(1).unwrap().attr(attr::HREF),
            Some("http://x.test")
        );
    }

    #[test]
    fn test_ingest_lists_default_styles() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let ol = doc.element(body, "ol", &[]);
        let li = doc.element(ol, "li", &[]);
        doc.text_node(li, "one");
        let ul = doc.element(body, "ul", &[("type", "A")]);
        let li = doc.element(ul, "li", &[]);
        doc.text_node(li, "two");
        let plain = doc.element(body, "ul", &[]);
        let li = doc.element(plain, "li", &[]);
        doc.text_node(li, "three");

        let tree = ingest(&doc);
        let styles: Vec<_> = tree.root_ref().children().map(|l| l.attr(attr::STYLE)).collect();
        assert_eq!(styles, vec![Some("1"), Some("A"), None]);
    }

    #[test]
    fn test_ingest_table_background_from_style() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let table = doc.element(
            body,
            "table",
            &[("width", "90%"), ("style", "border: 0; Background-Color : #abc ;")],
        );
        let tr = doc.element(table, "tr", &[("bgcolor", "red")]);
        let th = doc.element(tr, "th", &[("width", "10")]);
        doc.text_node(th, "h");

        let tree = ingest(&doc);
        let table = tree.root_ref().first_child().unwrap();
        assert_eq!(table.attr(attr::WIDTH), Some("90%"));
        assert_eq!(table.attr(attr::BGCOLOR), Some("#abc"));
        let row = table.first_child().unwrap();
        assert_eq!(row.attr(attr::BGCOLOR), Some("red"));
        let cell = row.first_child().unwrap();
        assert_eq!(cell.kind(), NodeKind::TableCell);
        assert_eq!(cell.attr(attr::WIDTH), Some("10"));
    }

    #[test]
    fn test_ingest_font_attributes_nest() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let font = doc.element(body, "font", &[("face", "Arial"), ("color", "red")]);
        doc.text_node(font, "x");

        let tree = ingest(&doc);
        let color = tree.root_ref().first_child().unwrap();
        assert_eq!(color.kind(), NodeKind::Color);
        let face = color.first_child().unwrap();
        assert_eq!(face.kind(), NodeKind::Font);
        assert_eq!(face.attr(attr::FACE), Some("Arial"));
        assert_eq!(face.text_content(), "x");
    }

    #[test]
    fn test_ingest_code_and_forum_wrappers() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let pre = doc.element(body, "pre", &[]);
        let b = doc.element(pre, "b", &[]);
        doc.text_node(b, "let x = 1;");
        let quote = doc.element(body, "div", &[("class", "quote")]);
        let bq = doc.element(quote, "blockquote", &[]);
        doc.text_node(bq, "said");
        let code = doc.element(body, "div", &[("class", "blockcode")]);
        doc.text_node(code, "raw");

        let tree = ingest(&doc);
        let kinds: Vec<_> = tree.root_ref().children().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::CodeBlock, NodeKind::Quote, NodeKind::CodeBlock]
        );
        assert_eq!(tree.root_ref().first_child().unwrap().text_content(), "let x = 1;");
    }

    #[test]
    fn test_ingest_images_can_be_disabled() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        doc.element(body, "img", &[("src", "a.png"), ("width", "10")]);

        let tree = ingest(&doc);
        let img = tree.root_ref().first_child().unwrap();
        assert_eq!(img.attr(attr::SRC), Some("a.png"));
        assert_eq!(img.attr(attr::WIDTH), Some("10"));

        let config = ParseConfig {
            allow_images: false,
            ..ParseConfig::default()
        };
        let tree = tree_from_document(&doc, &config);
        assert_eq!(tree.root_ref().child_count(), 0);
    }

    #[test]
    fn test_ingest_after_strip_unsafe() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let script = doc.element(body, "script", &[]);
        doc.text_node(script, "alert(1)");
        let p = doc.element(body, "p", &[]);
        doc.text_node(p, "safe");

        doc.strip_unsafe(&SanitizePolicy::default());
        let tree = ingest(&doc);

        assert_eq!(tree.root_ref().text_content(), "safe");
    }

    #[test]
    fn test_ingest_deep_nesting_keeps_text() {
        let mut doc = FakeDocument::new();
        let mut parent = doc.body_id();
        for _ in 0..1_000 {
            parent = doc.element(parent, "b", &[]);
        }
        doc.text_node(parent, "deep");

        let tree = ingest(&doc);
        let mut levels = 0;
        let mut current = tree.root_ref();
        while let Some(child) = current.first_child().filter(|c| c.kind() == NodeKind::Bold) {
            levels += 1;
            current = child;
        }
        assert_eq!(levels, MAX_NESTING_DEPTH);
        assert_eq!(current.text_content(), "deep");
    }

    #[test]
    fn test_inline_code_keeps_code_tag_in_bbcode() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        doc.text_node(body, "run ");
        let code = doc.element(body, "code", &[]);
        doc.text_node(code, "make");

        let tree = ingest(&doc);
        assert_eq!(
            BbcodeHandler::new().render(&tree, &RenderConfig::default()).unwrap(),
            "run [code]make[/code]"
        );
    }

    #[test]
    fn test_nested_items_render_as_siblings() {
        let mut tree = Tree::new();
        let root = tree.root();
        let list = tree.create_node(NodeKind::List);
        tree.append_child(root, list);
        let first = tree.create_node(NodeKind::ListItem);
        tree.append_child(list, first);
        tree.push_text(first, "a");
        let second = tree.create_node(NodeKind::ListItem);
        tree.append_child(first, second);
        tree.push_text(second, "b");

        assert_eq!(
            HtmlRenderer.render(&tree, &RenderConfig::default()).unwrap(),
            "<ul><li>a</li><li>b</li></ul>\n"
        );
    }

    #[test]
    fn test_handler_parses_through_adapter() {
        let handler = HtmlHandler::new(FakeAdapter);
        let tree = handler.parse("plain words", &ParseConfig::default()).unwrap();
        assert_eq!(tree.root_ref().text_content(), "plain words");
        assert_eq!(Parser::format(&handler), Format::Html);
    }
}
