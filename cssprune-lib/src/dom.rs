use html5ever::QualName;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub mod dom_tree {
    use super::*;

    pub type Handle = Rc<RefCell<Node>>;

    /// Receives a document as a flat stream of structural events, in
    /// document order.
    pub trait MarkupHandler {
        fn start(&mut self, tag: &str, attributes: &HashMap<String, String>);
        fn end(&mut self, tag: &str);
        fn text(&mut self, _data: &str) {}
        fn comment(&mut self, _text: &str) {}
    }

    #[derive(Debug, Clone)]
    pub enum NodeData {
        DocumentRoot,
        Element(ElementNode),
        Text(String),
        Comment(String),
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: HashMap<String, String>,
    }

    #[derive(Debug)]
    pub struct Node {
        pub data: NodeData,
        pub parent: Option<Weak<RefCell<Node>>>,
        pub children: Vec<Handle>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: Handle,
    }

    impl Node {
        pub fn new(data: NodeData) -> Handle {
            Rc::new(RefCell::new(Node {
                data,
                parent: None,
                children: Vec::new(),
            }))
        }

        pub fn parent(&self) -> Option<Handle> {
            self.parent.as_ref().and_then(Weak::upgrade)
        }
    }

    impl ElementNode {
        pub fn new(qual_name: QualName, attributes: HashMap<String, String>) -> Self {
            ElementNode {
                tag: qual_name.local.to_string(),
                qual_name,
                attributes,
            }
        }
    }

    /// Attach `child` as the last child of `parent`.
    pub fn append_child(parent: &Handle, child: Handle) {
        detach(&child);
        child.borrow_mut().parent = Some(Rc::downgrade(parent));
        parent.borrow_mut().children.push(child);
    }

    /// Attach `child` right before `sibling` under the same parent.
    pub fn insert_before(sibling: &Handle, child: Handle) {
        let Some(parent) = sibling.borrow().parent() else {
            return;
        };
        detach(&child);
        child.borrow_mut().parent = Some(Rc::downgrade(&parent));
        let mut parent_node = parent.borrow_mut();
        let index = parent_node
            .children
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(index, child);
    }

    /// Remove `node` from its parent's children, if it has a parent.
    pub fn detach(node: &Handle) {
        let parent = node.borrow_mut().parent.take().and_then(|weak| weak.upgrade());
        if let Some(parent) = parent {
            parent
                .borrow_mut()
                .children
                .retain(|child| !Rc::ptr_eq(child, node));
        }
    }

    /// Replay the subtree under `node` as start/end/text/comment events.
    ///
    /// Uses an explicit stack, so nesting depth is bounded by memory rather
    /// than by the thread's stack.
    pub fn walk(node: &Handle, handler: &mut dyn MarkupHandler) {
        if !open(node, handler) {
            return;
        }
        let mut stack: Vec<(Handle, usize)> = vec![(Rc::clone(node), 0)];
        while let Some((current, index)) = stack.last_mut() {
            let child = current.borrow().children.get(*index).cloned();
            *index += 1;
            match child {
                Some(child) => {
                    if open(&child, handler) {
                        stack.push((child, 0));
                    }
                }
                None => {
                    if let Some((done, _)) = stack.pop() {
                        if let NodeData::Element(elem) = &done.borrow().data {
                            handler.end(&elem.tag);
                        }
                    }
                }
            }
        }
    }

    /// Emits the event that opens `node`; true if its children follow.
    fn open(node: &Handle, handler: &mut dyn MarkupHandler) -> bool {
        match &node.borrow().data {
            NodeData::DocumentRoot => true,
            NodeData::Element(elem) => {
                handler.start(&elem.tag, &elem.attributes);
                true
            }
            NodeData::Text(text) => {
                handler.text(text);
                false
            }
            NodeData::Comment(text) => {
                handler.comment(text);
                false
            }
        }
    }

    impl Drop for Node {
        // Unlinks descendants one level at a time instead of letting each
        // `Rc` drop its children recursively.
        fn drop(&mut self) {
            let mut pending = std::mem::take(&mut self.children);
            while let Some(child) = pending.pop() {
                if let Ok(cell) = Rc::try_unwrap(child) {
                    let mut node = cell.into_inner();
                    pending.append(&mut node.children);
                }
            }
        }
    }

    impl Document {
        pub fn replay(&self, handler: &mut dyn MarkupHandler) {
            walk(&self.root, handler);
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Node::new(NodeData::DocumentRoot),
        }
    }
}
