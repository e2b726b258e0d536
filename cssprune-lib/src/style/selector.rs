//! Simple-selector segments and the arena that links them into chains.
//!
//! A chain is read right to left: the head is the rightmost segment, and each
//! node points at the segment on its left through `combinator_parent`.

use crate::error::SegmentError;

/// Supported combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    /// Descendant combinator (a space).
    #[default]
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

impl Combinator {
    /// The separator written between a segment and its combinator parent.
    pub fn separator(self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::AdjacentSibling => " + ",
            Combinator::GeneralSibling => " ~ ",
        }
    }
}

/// Index of a [`SelectorNode`] inside a [`SelectorArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectorId(usize);

/// One simple-selector segment, e.g. `a.nav.active` or `input[type=text]:focus`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorNode {
    pub tag: Option<String>,
    /// Source order, no duplicates.
    pub classes: Vec<String>,
    pub id: Option<String>,
    /// Raw `[...]` text, never interpreted.
    pub bracket_content: String,
    /// Everything from the first `:` of the segment on.
    pub pseudo_state: Option<String>,
    pub combinator: Combinator,
    pub combinator_parent: Option<SelectorId>,
    /// Whitespace that followed the `,` after this chain in a selector list.
    pub trailing_whitespace: Option<String>,
}

/// Characters allowed in tag, class and id names.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '*' | '%')
}

/// Characters that may appear inside one simple-selector segment.
pub fn is_segment_char(c: char) -> bool {
    is_name_char(c) || matches!(c, '.' | '#' | '(' | ')' | '[' | ']' | '=' | ':' | '"' | '\'')
}

/// Length in bytes of the longest prefix of `text` made of `accept` characters.
pub fn run_length(text: &str, accept: fn(char) -> bool) -> usize {
    text.char_indices()
        .find(|&(_, c)| !accept(c))
        .map_or(text.len(), |(index, _)| index)
}

impl SelectorNode {
    /// Parse a single segment (no whitespace, no combinators) into a node
    /// linked to `parent` through `combinator`.
    pub fn parse(
        segment: &str,
        parent: Option<SelectorId>,
        combinator: Combinator,
    ) -> Result<SelectorNode, SegmentError> {
        let mut node = SelectorNode {
            combinator,
            combinator_parent: parent,
            ..SelectorNode::default()
        };
        let mut rest = segment;

        while let Some(c) = rest.chars().next() {
            match c {
                '.' => {
                    let len = run_length(&rest[1..], is_name_char);
                    if len == 0 {
                        return Err(SegmentError::EmptyClass);
                    }
                    let class = &rest[1..1 + len];
                    if !node.classes.iter().any(|known| known == class) {
                        node.classes.push(class.to_string());
                    }
                    rest = &rest[1 + len..];
                }
                '#' => {
                    let len = run_length(&rest[1..], is_name_char);
                    if len == 0 {
                        return Err(SegmentError::EmptyId);
                    }
                    node.id = Some(rest[1..1 + len].to_string());
                    rest = &rest[1 + len..];
                }
                ':' => {
                    node.pseudo_state = Some(rest.to_string());
                    break;
                }
                '[' => {
                    let close = rest.find(']').ok_or(SegmentError::UnterminatedBracket)?;
                    if close > 1 {
                        node.bracket_content.push_str(&rest[..=close]);
                    }
                    rest = &rest[close + 1..];
                }
                '(' => {
                    let close = rest.find(')').ok_or(SegmentError::UnterminatedParen)?;
                    rest = &rest[close + 1..];
                }
                _ => {
                    let len = run_length(rest, is_name_char);
                    if len == 0 {
                        return Err(SegmentError::UnexpectedSymbol(c));
                    }
                    node.tag = Some(rest[..len].to_string());
                    rest = &rest[len..];
                }
            }
        }
        Ok(node)
    }

    /// True when the segment carries nothing to match or print.
    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.classes.is_empty()
            && self.id.is_none()
            && self.pseudo_state.is_none()
            && self.bracket_content.is_empty()
    }

    /// True when the segment constrains the element itself (tag, class or id).
    /// Attribute and pseudo-class text alone never does.
    pub fn has_qualifiers(&self) -> bool {
        self.tag.is_some() || !self.classes.is_empty() || self.id.is_some()
    }

    /// Serialize this segment alone: tag, classes, brackets, id, pseudo state.
    fn write_segment(&self, out: &mut String, sort_classes: bool) {
        if let Some(tag) = &self.tag {
            out.push_str(tag);
        }
        if !self.classes.is_empty() {
            let mut classes: Vec<&str> = self.classes.iter().map(String::as_str).collect();
            if sort_classes {
                classes.sort_unstable();
            }
            out.push('.');
            out.push_str(&classes.join("."));
        }
        out.push_str(&self.bracket_content);
        if let Some(id) = &self.id {
            out.push('#');
            out.push_str(id);
        }
        if let Some(state) = &self.pseudo_state {
            out.push_str(state);
        }
    }
}

/// Owner of every selector node parsed from one stylesheet.
#[derive(Debug, Default)]
pub struct SelectorArena {
    nodes: Vec<SelectorNode>,
}

impl SelectorArena {
    pub fn new() -> Self {
        SelectorArena::default()
    }

    pub fn push(&mut self, node: SelectorNode) -> SelectorId {
        self.nodes.push(node);
        SelectorId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: SelectorId) -> &SelectorNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: SelectorId) -> &mut SelectorNode {
        &mut self.nodes[id.0]
    }

    /// Key used to unify selectors: classes sorted at every level.
    pub fn canonical_key(&self, head: SelectorId) -> String {
        let mut out = String::new();
        self.write_chain(head, &mut out, true);
        out
    }

    /// The chain as it should appear in the rewritten stylesheet.
    pub fn display(&self, head: SelectorId) -> String {
        let mut out = String::new();
        self.write_chain(head, &mut out, false);
        out
    }

    fn write_chain(&self, id: SelectorId, out: &mut String, sort_classes: bool) {
        let node = self.get(id);
        if let Some(parent) = node.combinator_parent {
            self.write_chain(parent, out, sort_classes);
            out.push_str(node.combinator.separator());
        }
        node.write_segment(out, sort_classes);
    }
}
