//! Minimal DOM tree over html5ever, plus the selector engine the
//! extraction strategies query it with.

pub mod query;

pub use query::Selector;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::collections::HashMap;

/// A node in the parsed tree. Only what extraction needs: tag, attributes,
/// text, children.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub children: Vec<DomNode>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
}

impl DomNode {
    fn element(tag: String) -> Self {
        Self {
            tag,
            attrs: HashMap::new(),
            text: String::new(),
            children: Vec::new(),
            kind: NodeKind::Element,
        }
    }

    fn text_node(text: String) -> Self {
        Self {
            tag: String::new(),
            attrs: HashMap::new(),
            text,
            children: Vec::new(),
            kind: NodeKind::Text,
        }
    }

    fn document() -> Self {
        Self {
            tag: String::new(),
            attrs: HashMap::new(),
            text: String::new(),
            children: Vec::new(),
            kind: NodeKind::Document,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    /// Whitespace-separated class list.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Visible text of this node and all descendants, single-space joined.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        if self.kind == NodeKind::Text {
            let trimmed = self.text.trim();
            if !trimmed.is_empty() {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push_str(trimmed);
            }
            return;
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// All descendants (document order) matching a selector string.
    /// Invalid selectors match nothing.
    pub fn select(&self, selector: &str) -> Vec<&DomNode> {
        match Selector::parse(selector) {
            Some(sel) => query::select(self, &sel),
            None => Vec::new(),
        }
    }

    /// First match of a selector string, if any.
    pub fn select_first(&self, selector: &str) -> Option<&DomNode> {
        self.select(selector).into_iter().next()
    }
}

/// Parse an HTML string into a DomNode tree. Script, style, and svg
/// subtrees are dropped; the embedded-data strategy works on the raw
/// markup instead.
pub fn parse_html(html: &str) -> DomNode {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut html.as_bytes());

    match dom {
        Ok(dom) => convert(&dom.document),
        Err(_) => DomNode::document(),
    }
}

fn convert(handle: &Handle) -> DomNode {
    match &handle.data {
        NodeData::Document => {
            let mut doc = DomNode::document();
            for child in handle.children.borrow().iter() {
                let converted = convert(child);
                if converted.kind != NodeKind::Document {
                    doc.children.push(converted);
                }
            }
            doc
        }
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            let mut node = DomNode::element(tag);
            for attr in attrs.borrow().iter() {
                node.attrs
                    .insert(attr.name.local.to_string(), attr.value.to_string());
            }
            if matches!(node.tag.as_str(), "script" | "style" | "svg" | "path") {
                return node;
            }
            for child in handle.children.borrow().iter() {
                let converted = convert(child);
                if converted.kind == NodeKind::Document {
                    continue;
                }
                if converted.kind == NodeKind::Text && converted.text.trim().is_empty() {
                    continue;
                }
                node.children.push(converted);
            }
            node
        }
        NodeData::Text { contents } => DomNode::text_node(contents.borrow().to_string()),
        // Comments, processing instructions, doctypes.
        _ => DomNode::document(),
    }
}
