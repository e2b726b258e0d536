//! Splits raw stylesheet text into top-level `{ ... }` groups.
//!
//! Comments are removed while the scanner sits at nesting depth 0, so text that
//! looks like a comment inside a declaration body is kept as written. Nested
//! groups (the rules inside `@media`, for example) are not re-split here; the
//! selector driver extracts them again from the group's inner text.

use crate::error::{CssWarning, Position};
use std::str::SplitInclusive;

/// One top-level group as it appeared in the source, braces included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub text: String,
    /// Where the first non-blank character of the group sits.
    pub position: Position,
}

/// Lazy iterator over the top-level groups of a stylesheet.
///
/// Structural problems are reported in-stream as `Err` items; the iterator
/// keeps going after each of them.
pub struct BlockExtractor<'a> {
    lines: SplitInclusive<'a, char>,
    origin: Position,
    line_number: usize,
    in_comment: bool,
    nested: usize,
    buffer: String,
    buffer_start: Position,
    pending: Vec<char>,
    cursor: usize,
    finished: bool,
}

impl<'a> BlockExtractor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::starting_at(source, Position::default())
    }

    /// Extracts from `source` as if it started at `origin` of a larger file,
    /// so positions of nested groups point into the full stylesheet.
    pub fn starting_at(source: &'a str, origin: Position) -> Self {
        BlockExtractor {
            lines: source.split_inclusive('\n'),
            origin,
            line_number: 0,
            in_comment: false,
            nested: 0,
            buffer: String::new(),
            buffer_start: origin,
            pending: Vec::new(),
            cursor: 0,
            finished: false,
        }
    }

    /// Removes comment text from one line, carrying the open-comment state
    /// over to the next line.
    fn strip_comments(&mut self, line: &str) -> String {
        let mut kept = String::with_capacity(line.len());
        let mut rest = line;
        loop {
            if self.in_comment {
                match rest.find("*/") {
                    Some(end) => {
                        rest = &rest[end + 2..];
                        self.in_comment = false;
                    }
                    None => return kept,
                }
            } else {
                match rest.find("/*") {
                    Some(start) => {
                        kept.push_str(&rest[..start]);
                        rest = &rest[start + 2..];
                        self.in_comment = true;
                    }
                    None => {
                        kept.push_str(rest);
                        return kept;
                    }
                }
            }
        }
    }

    /// Column of the character at `self.cursor` on the current line.
    ///
    /// Comment stripping shifts characters to the left, so this is the column
    /// inside the cleaned line; good enough for pointing at a rule.
    fn current_position(&self) -> Position {
        if self.line_number == 1 {
            Position::new(self.origin.line, self.origin.column + self.cursor)
        } else {
            Position::new(self.origin.line + self.line_number - 1, self.cursor + 1)
        }
    }

    fn load_next_line(&mut self) -> bool {
        match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                let line = if self.nested == 0 {
                    self.strip_comments(line)
                } else {
                    line.to_string()
                };
                self.pending = line.chars().collect();
                self.cursor = 0;
                true
            }
            None => false,
        }
    }

    fn finish(&mut self) -> Option<Result<RawBlock, CssWarning>> {
        self.finished = true;
        let text = std::mem::take(&mut self.buffer);
        if self.nested > 0 {
            return Some(Err(CssWarning::UnclosedBlock {
                position: self.buffer_start,
            }));
        }
        if text.trim().is_empty() {
            return None;
        }
        Some(Ok(RawBlock {
            text: text.trim_end().to_string(),
            position: self.buffer_start,
        }))
    }
}

impl Iterator for BlockExtractor<'_> {
    type Item = Result<RawBlock, CssWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            if self.cursor >= self.pending.len() && !self.load_next_line() {
                return self.finish();
            }
            while self.cursor < self.pending.len() {
                let c = self.pending[self.cursor];
                let position = self.current_position();
                self.cursor += 1;

                if self.nested == 0 && self.buffer.is_empty() {
                    if c.is_whitespace() {
                        continue;
                    }
                    self.buffer_start = position;
                }
                self.buffer.push(c);

                match c {
                    '{' => self.nested += 1,
                    '}' if self.nested == 0 => {
                        self.buffer.clear();
                        return Some(Err(CssWarning::ExcessiveClosingBrace { position }));
                    }
                    '}' => {
                        self.nested -= 1;
                        if self.nested == 0 {
                            let text = std::mem::take(&mut self.buffer);
                            return Some(Ok(RawBlock {
                                text,
                                position: self.buffer_start,
                            }));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        BlockExtractor::new(source)
            .filter_map(Result::ok)
            .map(|block| block.text)
            .collect()
    }

    #[test]
    fn test_splits_top_level_groups() {
        let blocks = texts("a{color:red}\n  .b { margin: 0 }\n");
        assert_eq!(blocks, vec!["a{color:red}", ".b { margin: 0 }"]);
    }

    #[test]
    fn test_keeps_nested_groups_together() {
        let blocks = texts("@media print {\n  a { color: red }\n}\np{x:y}");
        assert_eq!(
            blocks,
            vec!["@media print {\n  a { color: red }\n}", "p{x:y}"]
        );
    }

    #[test]
    fn test_strips_comment_before_rule() {
        let blocks = texts("/* .ghost{display:none} */a{color:red}");
        assert_eq!(blocks, vec!["a{color:red}"]);
    }

    #[test]
    fn test_strips_multiline_comment() {
        let blocks = texts("/* first\n.ghost { display: none }\nlast */\nb{c:d}");
        assert_eq!(blocks, vec!["b{c:d}"]);
    }

    #[test]
    fn test_comment_inside_body_is_kept() {
        let blocks = texts("a {\n  /* keep */ color: red;\n}");
        assert_eq!(blocks, vec!["a {\n  /* keep */ color: red;\n}"]);
    }

    #[test]
    fn test_excess_closing_brace_is_reported_and_skipped() {
        let items: Vec<_> = BlockExtractor::new("a{b:c}\n}\nd{e:f}").collect();
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[1],
            Err(CssWarning::ExcessiveClosingBrace {
                position: Position::new(2, 1)
            })
        );
        assert_eq!(items[2].as_ref().map(|b| b.text.as_str()), Ok("d{e:f}"));
    }

    #[test]
    fn test_block_position_points_at_first_character() {
        let blocks: Vec<_> = BlockExtractor::new("a{b:c}\n\n   .x{y:z}")
            .filter_map(Result::ok)
            .collect();
        assert_eq!(blocks[1].position, Position::new(3, 4));
    }

    #[test]
    fn test_trailing_statement_is_yielded() {
        let blocks = texts("a{b:c}\n@import url(print.css);\n");
        assert_eq!(blocks, vec!["a{b:c}", "@import url(print.css);"]);
    }

    #[test]
    fn test_unclosed_block_is_reported() {
        let items: Vec<_> = BlockExtractor::new("a{b:c").collect();
        assert_eq!(
            items,
            vec![Err(CssWarning::UnclosedBlock {
                position: Position::new(1, 1)
            })]
        );
    }
}
