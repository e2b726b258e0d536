//! Writes a [`StyleModel`] back out, keeping only registered selector chains.

use crate::style::selector::SelectorId;
use crate::style::stylesheet::{Block, MetaBlock, MetaItem, StyleModel};

const INDENT: &str = "  ";

/// Serialize the stylesheet with every unregistered chain removed.
///
/// Rules left without selectors disappear, and so do at-rule groups left
/// without rules. Declaration bodies and at-rules kept verbatim are copied
/// unchanged.
pub fn rewrite(model: &StyleModel) -> String {
    let mut out = String::new();
    for meta in model.sheet() {
        write_meta(model, meta, 0, &mut out);
    }
    out
}

fn write_meta(model: &StyleModel, meta: &MetaBlock, depth: usize, out: &mut String) {
    if meta.title.is_empty() {
        write_items(model, &meta.blocks, depth, out);
        return;
    }
    let mut body = String::new();
    write_items(model, &meta.blocks, depth + 1, &mut body);
    if body.is_empty() {
        return;
    }
    let indent = INDENT.repeat(depth);
    out.push_str(&indent);
    out.push_str(&meta.title);
    out.push_str("{\n");
    out.push_str(&body);
    out.push_str(&indent);
    out.push_str("}\n");
}

fn write_items(model: &StyleModel, items: &[MetaItem], depth: usize, out: &mut String) {
    for item in items {
        match item {
            MetaItem::Rule(block) => write_block(model, block, depth, out),
            MetaItem::Group(meta) => write_meta(model, meta, depth, out),
            MetaItem::Verbatim(text) => {
                out.push_str(&INDENT.repeat(depth));
                out.push_str(text);
                out.push('\n');
            }
        }
    }
}

fn write_block(model: &StyleModel, block: &Block, depth: usize, out: &mut String) {
    let surviving: Vec<SelectorId> = block
        .selector_chains
        .iter()
        .copied()
        .filter(|&head| model.is_registered(head))
        .collect();
    let Some((&last, leading)) = surviving.split_last() else {
        return;
    };

    let selectors = model.selectors();
    out.push_str(&INDENT.repeat(depth));
    for &head in leading {
        out.push_str(&selectors.display(head));
        out.push(',');
        if let Some(whitespace) = &selectors.get(head).trailing_whitespace {
            out.push_str(whitespace);
        }
    }
    out.push_str(&selectors.display(last));
    out.push_str(" {");
    out.push_str(&block.declaration_text);
    out.push_str("}\n");
}
