use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::dom::dom_tree::MarkupHandler;
use crate::parser::html;

/// Handle of a [`DocumentNode`] inside a [`DocumentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The parts of an element that selectors can see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentNode {
    pub tag: Option<String>,
    pub classes: BTreeSet<String>,
    pub id: Option<String>,
    pub parent: Option<NodeId>,
    pub previous_sibling: Option<NodeId>,
}

impl DocumentNode {
    /// `tag.class1.class2#id`, classes sorted. Two elements with the same
    /// signature are interchangeable for matching.
    pub fn signature(&self) -> String {
        let mut signature = self.tag.clone().unwrap_or_default();
        if !self.classes.is_empty() {
            signature.push('.');
            let classes: Vec<&str> = self.classes.iter().map(String::as_str).collect();
            signature.push_str(&classes.join("."));
        }
        if let Some(id) = &self.id {
            signature.push('#');
            signature.push_str(id);
        }
        signature
    }
}

/// Every element of a document, plus the subset kept as matching candidates.
///
/// All nodes stay in the arena so parent and sibling links remain walkable,
/// but only the first node seen for each signature is *retained*. A later
/// element with the same tag, classes and id is never tried as a match
/// candidate on its own, even if its position differs.
#[derive(Debug, Default)]
pub struct DocumentTree {
    nodes: Vec<DocumentNode>,
    retained: Vec<NodeId>,
    signatures: HashMap<String, NodeId>,
}

impl DocumentTree {
    /// Build the tree for an HTML document.
    pub fn from_html(html_content: &str) -> Self {
        let mut builder = DocumentTreeBuilder::new();
        html::replay_markup(html_content, &mut builder);
        builder.finish()
    }

    pub fn node(&self, id: NodeId) -> &DocumentNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Matching candidates, in document order.
    pub fn retained(&self) -> &[NodeId] {
        &self.retained
    }

    /// First node registered under `signature`.
    pub fn representative(&self, signature: &str) -> Option<NodeId> {
        self.signatures.get(signature).copied()
    }

    fn insert(&mut self, node: DocumentNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        let signature = node.signature();
        self.nodes.push(node);
        if !self.signatures.contains_key(&signature) {
            self.signatures.insert(signature, id);
            self.retained.push(id);
        }
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    End,
}

/// Turns start/end events into a [`DocumentTree`] with parent and
/// previous-sibling links.
///
/// Relies on a well-nested event stream; html5ever's tree construction
/// provides one.
#[derive(Debug, Default)]
pub struct DocumentTreeBuilder {
    tree: DocumentTree,
    parent: Option<NodeId>,
    previous: Option<NodeId>,
    last_action: Option<Action>,
}

impl DocumentTreeBuilder {
    pub fn new() -> Self {
        DocumentTreeBuilder::default()
    }

    pub fn finish(self) -> DocumentTree {
        debug!(
            "document: {} elements, {} distinct signatures",
            self.tree.len(),
            self.tree.retained.len()
        );
        self.tree
    }
}

impl MarkupHandler for DocumentTreeBuilder {
    fn start(&mut self, tag: &str, attributes: &HashMap<String, String>) {
        // An element opened right after another start is its first child.
        let previous_sibling = match self.last_action {
            Some(Action::Start) => None,
            _ => self.previous,
        };
        let classes = attributes
            .get("class")
            .map(|value| {
                value
                    .split(' ')
                    .filter(|class| !class.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let node = DocumentNode {
            tag: Some(tag.to_string()),
            classes,
            id: attributes.get("id").cloned(),
            parent: self.parent,
            previous_sibling,
        };
        let id = self.tree.insert(node);
        self.parent = Some(id);
        self.last_action = Some(Action::Start);
    }

    fn end(&mut self, _tag: &str) {
        // The closed element is the previous sibling of whatever opens next
        // at its parent's level.
        self.previous = self.parent;
        self.parent = self.parent.and_then(|id| self.tree.node(id).parent);
        self.last_action = Some(Action::End);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn find(tree: &DocumentTree, signature: &str) -> NodeId {
        tree.representative(signature)
            .unwrap_or_else(|| panic!("no node with signature {signature}"))
    }

    #[test]
    fn test_parent_and_sibling_links() {
        let mut builder = DocumentTreeBuilder::new();
        builder.start("ul", &attrs(&[]));
        builder.start("li", &attrs(&[("class", "x")]));
        builder.text("one");
        builder.end("li");
        builder.start("li", &attrs(&[("class", "y")]));
        builder.start("b", &attrs(&[]));
        builder.end("b");
        builder.end("li");
        builder.end("ul");
        let tree = builder.finish();

        let ul = find(&tree, "ul");
        let x = find(&tree, "li.x");
        let y = find(&tree, "li.y");
        let b = find(&tree, "b");
        assert_eq!(tree.node(x).parent, Some(ul));
        assert_eq!(tree.node(x).previous_sibling, None);
        assert_eq!(tree.node(y).previous_sibling, Some(x));
        assert_eq!(tree.node(b).parent, Some(y));
        assert_eq!(tree.node(b).previous_sibling, None);
    }

    #[test]
    fn test_sibling_after_nested_subtree() {
        let mut builder = DocumentTreeBuilder::new();
        builder.start("div", &attrs(&[]));
        builder.start("section", &attrs(&[]));
        builder.start("p", &attrs(&[]));
        builder.end("p");
        builder.end("section");
        builder.start("aside", &attrs(&[]));
        builder.end("aside");
        builder.end("div");
        let tree = builder.finish();

        let section = find(&tree, "section");
        let aside = find(&tree, "aside");
        assert_eq!(tree.node(aside).previous_sibling, Some(section));
        assert_eq!(tree.node(aside).parent, Some(find(&tree, "div")));
    }

    #[test]
    fn test_signature_sorts_classes() {
        let mut builder = DocumentTreeBuilder::new();
        builder.start("div", &attrs(&[("class", "b  a"), ("id", "main")]));
        builder.end("div");
        let tree = builder.finish();
        assert!(tree.representative("div.a.b#main").is_some());
    }

    #[test]
    fn test_duplicate_signature_is_not_retained() {
        let mut builder = DocumentTreeBuilder::new();
        builder.start("p", &attrs(&[("class", "a")]));
        builder.end("p");
        builder.start("p", &attrs(&[("class", "a")]));
        builder.end("p");
        let tree = builder.finish();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.retained().len(), 1);
    }

    #[test]
    fn test_from_html_includes_implied_elements() {
        let tree = DocumentTree::from_html("<p class=\"x\">hi</p>");
        let p = find(&tree, "p.x");
        let body = find(&tree, "body");
        assert_eq!(tree.node(p).parent, Some(body));
        assert!(tree.representative("html").is_some());
        assert!(tree.representative("head").is_some());
    }
}
