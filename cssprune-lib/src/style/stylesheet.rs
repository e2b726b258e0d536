//! In-memory model of a stylesheet: the rule structure needed to write it back
//! out, and the registry of distinct selector chains.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::error::{CssWarning, Position};
use crate::parser::document_tree::DocumentTree;
use crate::style::block_extractor::BlockExtractor;
use crate::style::css_matcher::Matcher;
use crate::style::selector::{
    is_segment_char, run_length, Combinator, SelectorArena, SelectorId, SelectorNode,
};

/// At-rules whose body is not a list of style rules. They are copied through
/// as written.
const VERBATIM_AT_RULES: &[&str] = &[
    "font-face",
    "page",
    "keyframes",
    "counter-style",
    "property",
    "font-feature-values",
    "font-palette-values",
    "viewport",
    "view-transition",
    "position-try",
];

/// A style rule: selector list plus the untouched declaration text.
#[derive(Debug, Clone)]
pub struct Block {
    pub selector_chains: Vec<SelectorId>,
    pub declaration_text: String,
}

#[derive(Debug, Clone)]
pub enum MetaItem {
    Rule(Block),
    /// A conditional group nested inside another one.
    Group(MetaBlock),
    /// An at-rule kept exactly as written (`@import ...;`, `@font-face {...}`).
    Verbatim(String),
}

/// A group of rules under one at-rule title, or the implicit top-level group
/// when `title` is empty.
#[derive(Debug, Clone, Default)]
pub struct MetaBlock {
    pub title: String,
    pub blocks: Vec<MetaItem>,
}

/// Parsed stylesheet plus the registry of distinct selector chains.
#[derive(Debug, Default)]
pub struct StyleModel {
    selectors: SelectorArena,
    /// canonical key -> first chain seen with that key
    registry: BTreeMap<String, SelectorId>,
    sheet: Vec<MetaBlock>,
    warnings: Vec<CssWarning>,
}

impl StyleModel {
    pub fn parse(source: &str) -> Self {
        let mut model = StyleModel::default();
        let items = model.parse_items(source, Position::default());
        for item in items {
            model.push_top_level(item);
        }
        info!(
            "stylesheet: {} groups, {} distinct selectors, {} warnings",
            model.sheet.len(),
            model.registry.len(),
            model.warnings.len()
        );
        model
    }

    pub fn selectors(&self) -> &SelectorArena {
        &self.selectors
    }

    pub fn sheet(&self) -> &[MetaBlock] {
        &self.sheet
    }

    pub fn warnings(&self) -> &[CssWarning] {
        &self.warnings
    }

    /// Number of distinct selector chains still registered.
    pub fn selector_count(&self) -> usize {
        self.registry.len()
    }

    /// Canonical keys of the registered chains, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.registry.keys().map(String::as_str)
    }

    /// True if the chain's canonical key is still registered.
    pub fn is_registered(&self, head: SelectorId) -> bool {
        self.registry.contains_key(&self.selectors.canonical_key(head))
    }

    /// Removes every chain no retained node of `document` satisfies and
    /// returns how many were removed.
    pub fn prune_unused(&mut self, document: &DocumentTree) -> usize {
        let matcher = Matcher::new(document, &self.selectors);
        let unused: Vec<String> = self
            .registry
            .iter()
            .filter(|&(_, &head)| !matcher.is_used(head))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &unused {
            debug!("unused selector: {}", key);
            self.registry.remove(key);
        }
        unused.len()
    }

    /// Records a finished chain under its canonical key; the first chain
    /// seen for a key stays the representative.
    fn register(&mut self, head: SelectorId) {
        let key = self.selectors.canonical_key(head);
        self.registry.entry(key).or_insert(head);
    }

    fn warn(&mut self, warning: CssWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn push_top_level(&mut self, item: MetaItem) {
        match item {
            MetaItem::Group(meta) => self.sheet.push(meta),
            item => match self.sheet.last_mut() {
                Some(meta) if meta.title.is_empty() => meta.blocks.push(item),
                _ => self.sheet.push(MetaBlock {
                    title: String::new(),
                    blocks: vec![item],
                }),
            },
        }
    }

    fn parse_items(&mut self, source: &str, origin: Position) -> Vec<MetaItem> {
        let mut items = Vec::new();
        for extracted in BlockExtractor::starting_at(source, origin) {
            match extracted {
                Ok(raw) => self.parse_block(&raw.text, raw.position, &mut items),
                Err(warning) => self.warn(warning),
            }
        }
        items
    }

    /// Parses one raw top-level group (selectors, `{`, body, `}`) and appends
    /// what it produced to `items`. Malformed groups append nothing.
    fn parse_block(&mut self, text: &str, start: Position, items: &mut Vec<MetaItem>) {
        let mut rest = text;
        let mut position = start;
        let mut chains: Vec<SelectorId> = Vec::new();
        let mut head: Option<SelectorId> = None;
        let mut combinator = Combinator::Descendant;

        loop {
            let len = run_length(rest, is_segment_char);
            if len > 0 {
                let segment = &rest[..len];
                match SelectorNode::parse(segment, head, combinator) {
                    Ok(node) if node.is_empty() => head = None,
                    Ok(node) => head = Some(self.selectors.push(node)),
                    Err(reason) => {
                        self.warn(CssWarning::MalformedSelector {
                            segment: segment.to_string(),
                            reason,
                            position,
                        });
                        return;
                    }
                }
                position = position.after(segment);
                rest = &rest[len..];
                combinator = Combinator::Descendant;
                continue;
            }

            let Some(c) = rest.chars().next() else {
                if head.is_some() || !chains.is_empty() {
                    self.warn(CssWarning::MissingBody { position: start });
                }
                return;
            };

            let Some(current) = head else {
                if c == '@' && chains.is_empty() {
                    self.parse_at_rule(rest, position, items);
                } else {
                    self.warn(CssWarning::UnexpectedSymbol {
                        symbol: c,
                        position,
                    });
                }
                return;
            };

            match c {
                '>' => combinator = Combinator::Child,
                '+' => combinator = Combinator::AdjacentSibling,
                '~' => combinator = Combinator::GeneralSibling,
                ',' => {
                    let after = &rest[1..];
                    let whitespace = &after[..after.len() - after.trim_start().len()];
                    self.selectors.get_mut(current).trailing_whitespace =
                        Some(whitespace.to_string());
                    self.register(current);
                    chains.push(current);
                    head = None;
                    combinator = Combinator::Descendant;
                    position = position.after(&rest[..1 + whitespace.len()]);
                    rest = &after[whitespace.len()..];
                    continue;
                }
                '{' => {
                    self.register(current);
                    chains.push(current);
                    let body = &rest[1..];
                    let body = body.strip_suffix('}').unwrap_or(body);
                    // The chains stay registered even though the rule is not
                    // written back.
                    if body.trim().is_empty() {
                        debug!("skipping rule with empty body ({})", start);
                        return;
                    }
                    items.push(MetaItem::Rule(Block {
                        selector_chains: chains,
                        declaration_text: body.to_string(),
                    }));
                    return;
                }
                // Whitespace between segments, and anything else the
                // grammar does not know, is skipped.
                _ => {}
            }
            position.advance(c);
            rest = &rest[c.len_utf8()..];
        }
    }

    /// Handles text starting with `@`: statements, verbatim at-rules and
    /// conditional groups whose rules are parsed recursively.
    fn parse_at_rule(&mut self, text: &str, position: Position, items: &mut Vec<MetaItem>) {
        let brace = text.find('{');
        let semicolon = text
            .find(';')
            .filter(|&semi| brace.map_or(true, |open| semi < open));

        if let Some(semi) = semicolon {
            items.push(MetaItem::Verbatim(text[..=semi].to_string()));
            let after = &text[semi + 1..];
            let remainder = after.trim_start();
            if !remainder.is_empty() {
                let skipped = &text[..text.len() - remainder.len()];
                self.parse_block(remainder, position.after(skipped), items);
            }
            return;
        }

        let (Some(open), Some(close)) = (brace, text.rfind('}')) else {
            self.warn(CssWarning::MissingBody { position });
            return;
        };
        if close < open {
            self.warn(CssWarning::MissingBody { position });
            return;
        }

        let title = &text[..open];
        if is_verbatim_at_rule(title) {
            items.push(MetaItem::Verbatim(text.to_string()));
            return;
        }
        let inner_origin = position.after(&text[..=open]);
        let blocks = self.parse_items(&text[open + 1..close], inner_origin);
        items.push(MetaItem::Group(MetaBlock {
            title: title.to_string(),
            blocks,
        }));
    }
}

/// `@font-face`, `@-webkit-keyframes x` and the like.
fn is_verbatim_at_rule(title: &str) -> bool {
    let name: String = title
        .trim_start_matches('@')
        .chars()
        .take_while(|&c| c.is_ascii_alphanumeric() || c == '-')
        .collect::<String>()
        .to_ascii_lowercase();
    let name = match name.strip_prefix('-') {
        Some(prefixed) => prefixed.split_once('-').map_or("", |(_, rest)| rest),
        None => name.as_str(),
    };
    VERBATIM_AT_RULES.contains(&name)
}
