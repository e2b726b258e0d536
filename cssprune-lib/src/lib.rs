pub mod dom;
pub mod error;
pub mod prune;

pub mod parser {
    pub mod document_tree;
    pub mod html;
}

pub mod style {
    pub mod block_extractor;
    pub mod css_matcher;
    pub mod rewriter;
    pub mod selector;
    pub mod stylesheet;
}

pub use error::{CssWarning, PruneError};
pub use prune::{prune, run, PruneOptions, PruneReport};
