use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{CssWarning, PruneError};
use crate::parser::document_tree::DocumentTree;
use crate::style::rewriter;
use crate::style::stylesheet::StyleModel;

/// Appended to the stylesheet path when no output path is given.
pub const DEFAULT_SUFFIX: &str = ".fixed";

/// Where to read the inputs from and where the result goes.
#[derive(Debug, Clone)]
pub struct PruneOptions {
    pub stylesheet: PathBuf,
    pub markup: PathBuf,
    pub output: Option<PathBuf>,
    pub suffix: String,
}

impl PruneOptions {
    pub fn new(stylesheet: impl Into<PathBuf>, markup: impl Into<PathBuf>) -> Self {
        PruneOptions {
            stylesheet: stylesheet.into(),
            markup: markup.into(),
            output: None,
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }

    /// The explicit output path, or the stylesheet path with the suffix
    /// appended (`site.css` -> `site.css.fixed`).
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let mut path = OsString::from(self.stylesheet.as_os_str());
        path.push(&self.suffix);
        PathBuf::from(path)
    }

    /// Both inputs must be existing files before anything is read.
    pub fn check_inputs(&self) -> Result<(), PruneError> {
        if !self.stylesheet.is_file() {
            return Err(PruneError::MissingStylesheet {
                path: self.stylesheet.clone(),
            });
        }
        if !self.markup.is_file() {
            return Err(PruneError::MissingMarkup {
                path: self.markup.clone(),
            });
        }
        Ok(())
    }
}

/// Outcome of one pruning run.
#[derive(Debug)]
pub struct PruneReport {
    /// Distinct selector chains found in the stylesheet.
    pub selectors: usize,
    /// Chains no element of the document satisfies.
    pub unused: usize,
    /// The rewritten stylesheet.
    pub output: String,
    pub warnings: Vec<CssWarning>,
}

/// Prunes `css` against the HTML document `html`.
pub fn prune(css: &str, html: &str) -> PruneReport {
    let document = DocumentTree::from_html(html);
    prune_document(css, &document)
}

/// Prunes `css` against an already built document tree.
pub fn prune_document(css: &str, document: &DocumentTree) -> PruneReport {
    let mut model = StyleModel::parse(css);
    let selectors = model.selector_count();
    let unused = model.prune_unused(document);
    info!("{} of {} selectors unused", unused, selectors);

    PruneReport {
        selectors,
        unused,
        output: rewriter::rewrite(&model),
        warnings: model.warnings().to_vec(),
    }
}

/// Reads both inputs named by `options` and prunes the stylesheet.
///
/// Nothing is written; see [`write_output`].
pub fn run(options: &PruneOptions) -> Result<PruneReport, PruneError> {
    options.check_inputs()?;
    let css = read(&options.stylesheet)?;
    let html = read(&options.markup)?;
    Ok(prune(&css, &html))
}

/// Writes the rewritten stylesheet to the output path of `options`.
pub fn write_output(options: &PruneOptions, report: &PruneReport) -> Result<PathBuf, PruneError> {
    let path = options.output_path();
    fs::write(&path, &report.output).map_err(|source| PruneError::Write {
        path: path.clone(),
        source,
    })?;
    info!("wrote {}", path.display());
    Ok(path)
}

fn read(path: &Path) -> Result<String, PruneError> {
    fs::read_to_string(path).map_err(|source| PruneError::Read {
        path: path.to_path_buf(),
        source,
    })
}
