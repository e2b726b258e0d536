use crate::parser::document_tree::{DocumentTree, NodeId};
use crate::style::selector::{Combinator, SelectorArena, SelectorId, SelectorNode};

/// Decides whether selector chains apply to nodes of one document.
///
/// Matching proceeds right to left: the chain head is tested against the
/// candidate, then the combinator decides which neighbouring node has to
/// satisfy the segment on the left.
pub struct Matcher<'a> {
    document: &'a DocumentTree,
    selectors: &'a SelectorArena,
}

impl<'a> Matcher<'a> {
    pub fn new(document: &'a DocumentTree, selectors: &'a SelectorArena) -> Self {
        Matcher {
            document,
            selectors,
        }
    }

    /// True if at least one retained node satisfies the chain headed by `rule`.
    pub fn is_used(&self, rule: SelectorId) -> bool {
        self.document
            .retained()
            .iter()
            .any(|&node| self.satisfies(node, rule))
    }

    /// Returns true if `node` satisfies the chain headed by `rule`.
    pub fn satisfies(&self, node: NodeId, rule: SelectorId) -> bool {
        let segment = self.selectors.get(rule);
        // Attribute and pseudo-class text is not evaluated, so a segment made
        // only of those matches anything.
        if !segment.has_qualifiers() {
            return true;
        }
        if !self.matches_compound(node, segment) {
            return false;
        }
        let Some(parent_rule) = segment.combinator_parent else {
            return true;
        };
        let element = self.document.node(node);

        match segment.combinator {
            Combinator::AdjacentSibling => element
                .previous_sibling
                .is_some_and(|sibling| self.satisfies(sibling, parent_rule)),
            Combinator::Child => element
                .parent
                .is_some_and(|parent| self.satisfies(parent, parent_rule)),
            Combinator::GeneralSibling => {
                let mut sibling = element.previous_sibling;
                while let Some(current) = sibling {
                    if self.satisfies(current, parent_rule) {
                        return true;
                    }
                    sibling = self.document.node(current).previous_sibling;
                }
                false
            }
            Combinator::Descendant => self.matches_descendant(element.parent, parent_rule),
        }
    }

    /// Walks up from `start` to the nearest ancestor satisfying `parent_rule`.
    /// Only that ancestor is considered: the rest of the chain is checked one
    /// level above it and a farther ancestor is never tried instead.
    fn matches_descendant(&self, start: Option<NodeId>, parent_rule: SelectorId) -> bool {
        let grandparent_rule = self.selectors.get(parent_rule).combinator_parent;
        let mut ancestor = start;
        while let Some(current) = ancestor {
            if self.satisfies(current, parent_rule) {
                return match grandparent_rule {
                    None => true,
                    Some(rule) => self
                        .document
                        .node(current)
                        .parent
                        .is_some_and(|above| self.satisfies(above, rule)),
                };
            }
            ancestor = self.document.node(current).parent;
        }
        false
    }

    /// Checks id, classes and tag of a single segment against `node`.
    pub fn matches_compound(&self, node: NodeId, segment: &SelectorNode) -> bool {
        let element = self.document.node(node);
        if let Some(ref id) = segment.id {
            if element.id.as_ref() != Some(id) {
                return false;
            }
        }
        if !segment
            .classes
            .iter()
            .all(|class| element.classes.contains(class))
        {
            return false;
        }
        if let Some(ref tag) = segment.tag {
            // `*` places no constraint on the tag.
            if tag != "*" && !element.tag.as_ref().is_some_and(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree::MarkupHandler;
    use crate::parser::document_tree::DocumentTreeBuilder;
    use std::collections::HashMap;

    /// Parses a whitespace-separated chain like `div > .a` into the arena.
    fn chain(arena: &mut SelectorArena, text: &str) -> SelectorId {
        let mut head = None;
        let mut combinator = Combinator::Descendant;
        for token in text.split_whitespace() {
            match token {
                ">" => combinator = Combinator::Child,
                "+" => combinator = Combinator::AdjacentSibling,
                "~" => combinator = Combinator::GeneralSibling,
                _ => {
                    let node = SelectorNode::parse(token, head, combinator).unwrap();
                    head = Some(arena.push(node));
                    combinator = Combinator::Descendant;
                }
            }
        }
        head.unwrap()
    }

    /// Builds a tree from a compact outline: `tag.class#id` opens, `/` closes.
    fn tree(outline: &str) -> DocumentTree {
        let mut builder = DocumentTreeBuilder::new();
        for token in outline.split_whitespace() {
            if token == "/" {
                builder.end("");
                continue;
            }
            let node = SelectorNode::parse(token, None, Combinator::Descendant).unwrap();
            let mut attributes = HashMap::new();
            if !node.classes.is_empty() {
                attributes.insert("class".to_string(), node.classes.join(" "));
            }
            if let Some(id) = node.id {
                attributes.insert("id".to_string(), id);
            }
            builder.start(node.tag.as_deref().unwrap_or("div"), &attributes);
        }
        builder.finish()
    }

    fn used(outline: &str, selector: &str) -> bool {
        let document = tree(outline);
        let mut arena = SelectorArena::new();
        let head = chain(&mut arena, selector);
        Matcher::new(&document, &arena).is_used(head)
    }

    #[test]
    fn test_qualifier_free_rule_matches_everything() {
        assert!(used("p /", "[href]"));
        assert!(used("p /", ":hover"));
        assert!(used("p /", "a > :first-child"));
    }

    #[test]
    fn test_compound_matching() {
        assert!(used("p.a.b#x /", "p.b.a#x"));
        assert!(used("p.a.b /", ".a"));
        assert!(!used("p.a /", ".a.b"));
        assert!(!used("p#x /", "#y"));
        assert!(!used("p /", "span"));
        assert!(used("p /", "P"));
        assert!(used("p /", "*"));
    }

    #[test]
    fn test_child_combinator() {
        assert!(used("div span.a / /", "div > .a"));
        assert!(!used("div b span.a / / /", "div > .a"));
    }

    #[test]
    fn test_adjacent_sibling_combinator() {
        assert!(used("body p.x / p.y / /", ".x + .y"));
        assert!(!used("body p.y / p.x / /", ".x + .y"));
        assert!(!used("body p.x / i / p.y / /", ".x + .y"));
    }

    #[test]
    fn test_general_sibling_combinator() {
        assert!(used("body p.x / i / b / p.y / /", ".x ~ .y"));
        assert!(!used("body p.y / p.x / /", ".x ~ .y"));
    }

    #[test]
    fn test_descendant_any_depth() {
        assert!(used("div#main section ul li.item / / / /", "#main .item"));
        assert!(!used("div#other li.item / /", "#main .item"));
    }

    #[test]
    fn test_descendant_stops_at_nearest_ancestor() {
        // The nearest `.wrap` above `.item` sits inside `.outer`, not directly
        // inside `#main`; the farther `.wrap` is not tried.
        let outline = "div#main div.wrap div.outer div.wrap p.item / / / / /";
        assert!(!used(outline, "#main .wrap .item"));
        assert!(used("div#main div.wrap p.item / / /", "#main .wrap .item"));
    }
}
