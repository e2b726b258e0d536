use std::fmt;
use std::path::PathBuf;

/// A 1-based line/column location inside a stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }

    /// Moves past `ch`, starting a new line on `'\n'`.
    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Position reached after consuming all of `text` from here.
    pub fn after(mut self, text: &str) -> Self {
        for ch in text.chars() {
            self.advance(ch);
        }
        self
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Why a single selector segment could not be parsed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("empty class name")]
    EmptyClass,

    #[error("empty id")]
    EmptyId,

    #[error("unterminated '['")]
    UnterminatedBracket,

    #[error("unterminated '('")]
    UnterminatedParen,

    #[error("unexpected symbol '{0}'")]
    UnexpectedSymbol(char),
}

/// Recoverable stylesheet problems. None of these stop the run: the offending
/// block is skipped and scanning continues.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CssWarning {
    #[error("excessive '}}' ({position})")]
    ExcessiveClosingBrace { position: Position },

    #[error("unclosed block at end of input ({position})")]
    UnclosedBlock { position: Position },

    #[error("malformed selector '{segment}': {reason} ({position})")]
    MalformedSelector {
        segment: String,
        reason: SegmentError,
        position: Position,
    },

    #[error("unexpected symbol '{symbol}' ({position})")]
    UnexpectedSymbol { symbol: char, position: Position },

    #[error("rule without declaration block ({position})")]
    MissingBody { position: Position },
}

impl CssWarning {
    pub fn position(&self) -> Position {
        match self {
            CssWarning::ExcessiveClosingBrace { position }
            | CssWarning::UnclosedBlock { position }
            | CssWarning::MalformedSelector { position, .. }
            | CssWarning::UnexpectedSymbol { position, .. }
            | CssWarning::MissingBody { position } => *position,
        }
    }
}

/// Fatal errors of a pruning run.
///
/// - **Precondition errors** (exit code 2): an input file is missing or unreadable
/// - **Output errors** (exit code 1): the rewritten stylesheet could not be written
#[derive(thiserror::Error, Debug)]
pub enum PruneError {
    #[error("wrong CSS file path: {}", .path.display())]
    MissingStylesheet { path: PathBuf },

    #[error("wrong HTML file path: {}", .path.display())]
    MissingMarkup { path: PathBuf },

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PruneError {
    pub fn exit_code(&self) -> i32 {
        match self {
            PruneError::MissingStylesheet { .. }
            | PruneError::MissingMarkup { .. }
            | PruneError::Read { .. } => 2,
            PruneError::Write { .. } => 1,
        }
    }
}
