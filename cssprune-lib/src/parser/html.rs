//! Markup tokenization through html5ever.
//!
//! html5ever does the tokenizing and the error recovery; [`PruneTreeSink`]
//! only records the resulting tree so it can be replayed as a well-formed
//! stream of start/end events (see [`dom_tree::walk`]).

use crate::dom::dom_tree::{self, Handle, MarkupHandler, Node, NodeData};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    Attribute, LocalName, Namespace, QualName,
};
use log::debug;
use std::borrow::Cow;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Parses the provided HTML into a markup tree.
///
/// # Arguments
///
/// * `html_content` - A string slice containing the HTML to parse.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = PruneTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content)
}

/// Parses `html_content` and feeds the result to `handler` as events.
pub fn replay_markup(html_content: &str, handler: &mut dyn MarkupHandler) {
    create_dom_tree(html_content).replay(handler);
}

/// A TreeSink that stores what html5ever builds, nothing more.
pub struct PruneTreeSink {
    document: dom_tree::Document,
    errors: Cell<usize>,
}

impl PruneTreeSink {
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
            errors: Cell::new(0),
        }
    }

    fn node_for(child: NodeOrText<Handle>) -> Handle {
        match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => Node::new(NodeData::Text(text.to_string())),
        }
    }
}

impl Default for PruneTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned element name handed back to html5ever.
#[derive(Debug)]
pub struct PruneElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for PruneElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for PruneTreeSink {
    type Handle = Handle;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = PruneElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        if self.errors.get() > 0 {
            debug!("markup parsed with {} recovered errors", self.errors.get());
        }
        self.document
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.errors.set(self.errors.get() + 1);
        debug!("markup parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &target.borrow().data {
            NodeData::Element(elem) => PruneElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            _ => panic!("elem_name called on non-element node"),
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect::<HashMap<String, String>>();
        Node::new(NodeData::Element(dom_tree::ElementNode::new(name, attributes)))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Node::new(NodeData::Comment(text.to_string()))
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        Node::new(NodeData::Comment(format!("{} {}", target, data)))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        // Adjacent text runs are merged so the event stream carries one text
        // event per run.
        if let NodeOrText::AppendText(text) = &child {
            if let Some(last) = parent.borrow().children.last() {
                if let NodeData::Text(existing) = &mut last.borrow_mut().data {
                    existing.push_str(text);
                    return;
                }
            }
        }
        dom_tree::append_child(parent, Self::node_for(child));
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if element.borrow().parent().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        dom_tree::insert_before(sibling, Self::node_for(child));
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        if let NodeData::Element(elem) = &mut target.borrow_mut().data {
            for attr in attrs {
                elem.attributes
                    .entry(attr.name.local.to_string())
                    .or_insert_with(|| attr.value.to_string());
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        dom_tree::detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children = std::mem::take(&mut node.borrow_mut().children);
        for child in children {
            child.borrow_mut().parent = None;
            dom_tree::append_child(new_parent, child);
        }
    }
}

/// Collects the event stream as an indented outline, one line per element
/// or non-blank text run.
#[derive(Debug, Default)]
pub struct OutlineRecorder {
    pub lines: Vec<String>,
    depth: usize,
}

impl MarkupHandler for OutlineRecorder {
    fn start(&mut self, tag: &str, attributes: &HashMap<String, String>) {
        let mut line = format!("{}<{}", "  ".repeat(self.depth), tag);
        let mut names: Vec<&String> = attributes.keys().collect();
        names.sort();
        for name in names {
            line.push_str(&format!(" {}=\"{}\"", name, attributes[name]));
        }
        line.push('>');
        self.lines.push(line);
        self.depth += 1;
    }

    fn end(&mut self, _tag: &str) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn text(&mut self, data: &str) {
        let trimmed = data.trim();
        if !trimmed.is_empty() {
            self.lines.push(format!("{}{}", "  ".repeat(self.depth), trimmed));
        }
    }
}
