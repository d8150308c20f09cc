// ============================================================
// Layer 3: Character Spans
// ============================================================
// Answer spans are stored as [start, end) CHARACTER offsets,
// the way annotated QA datasets count positions. Rust strings
// index by BYTE, so every slice through the context goes via
// a CharOffsets converter.
//
//   Text:  "Zürich is"
//   chars:  Z ü r i c h _ i s
//           0 1 2 3 4 5 6 7 8
//   bytes:  0 1-2 3 4 5 6 7 8 9
//
// Reference: Rust Book §8.2 (Storing UTF-8 Encoded Text)

use serde::{Deserialize, Serialize};

/// A half-open [start, end) range of character offsets.
///
/// Serialised as a two-element array `[start, end]` so the
/// JSONL wire format matches the normalised dataset files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Span {
    pub start: usize,
    pub end:   usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

impl From<Span> for (usize, usize) {
    fn from(s: Span) -> Self {
        (s.start, s.end)
    }
}

/// Converts between byte and character offsets for one text.
///
/// Pure-ASCII texts take a fast path where both coordinate
/// systems coincide.
pub struct CharOffsets {
    /// Byte offset of every char, plus one trailing entry for text.len()
    char_to_byte: Vec<usize>,
    is_ascii:     bool,
}

impl CharOffsets {
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self { char_to_byte: Vec::new(), is_ascii: true };
        }
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self { char_to_byte, is_ascii: false }
    }

    /// Byte offset of a char offset, or None past the end of the text
    pub fn char_to_byte(&self, text: &str, char_idx: usize) -> Option<usize> {
        if self.is_ascii {
            return (char_idx <= text.len()).then_some(char_idx);
        }
        self.char_to_byte.get(char_idx).copied()
    }

    /// Char offset of a byte offset that lies on a char boundary
    pub fn byte_to_char(&self, byte_idx: usize) -> usize {
        if self.is_ascii {
            return byte_idx;
        }
        // Boundaries are sorted, so a binary search finds the char index
        match self.char_to_byte.binary_search(&byte_idx) {
            Ok(i)  => i,
            Err(i) => i,
        }
    }

    /// Slice `text` by a character span. None if the span is out of bounds.
    pub fn slice<'a>(&self, text: &'a str, span: Span) -> Option<&'a str> {
        if span.start > span.end {
            return None;
        }
        let start = self.char_to_byte(text, span.start)?;
        let end   = self.char_to_byte(text, span.end)?;
        text.get(start..end)
    }
}

/// Number of characters in `text`
pub fn char_len(text: &str) -> usize {
    if text.is_ascii() { text.len() } else { text.chars().count() }
}
