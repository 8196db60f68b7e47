/*!
# Source location types (Pos, Loc, LineIndex)

`Pos` and `Loc` are the location records emitted by the front end and carried
unchanged onto every linked node. `LineIndex` maps byte offsets of a payload
text to lines and columns so decode failures can point into the input.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Byte range inside a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub begin: u64,
    pub end: u64,
}

impl Pos {
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source location of a node: byte range, file index into `AstFile.files`,
/// line and column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Loc {
    pub pos: Pos,
    pub file: u64,
    pub line: u64,
    pub col: u64,
}

impl Loc {
    pub fn new(pos: Pos, file: u64, line: u64, col: u64) -> Self {
        Self { pos, file, line, col }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Line index for offset <-> (line, column) mapping over a payload text.
/// Lines and columns are zero-based here; callers add one for display.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets where each line starts.
    line_starts: Arc<Vec<usize>>,
    text_len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = Vec::with_capacity(text.len() / 32 + 1);
        starts.push(0usize);
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { line_starts: Arc::new(starts), text_len: text.len() }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Zero-based (line, column) of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text_len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        (line, offset - self.line_starts[line])
    }

    /// Byte offset of a zero-based (line, column); clamped to the text.
    pub fn offset(&self, line: usize, col: usize) -> usize {
        match self.line_starts.get(line) {
            Some(start) => (start + col).min(self.line_end(line)),
            None => self.text_len,
        }
    }

    /// The text of one line without its terminator.
    pub fn line_text<'a>(&self, text: &'a str, line: usize) -> &'a str {
        let Some(&start) = self.line_starts.get(line) else { return "" };
        let end = self.line_end(line);
        text.get(start..end).unwrap_or("").trim_end_matches('\r')
    }

    fn line_end(&self, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.text_len,
        }
    }
}
