//! Text documents and editor positions
//!
//! Offsets are byte offsets into the document text unless named `utf16`.
//! Positions follow the editor protocol: zero-based lines and UTF-16 code
//! unit columns. The formatter counts `rangeStart`/`rangeEnd` in UTF-16 units.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

/// URI scheme of documents backed by a file
pub const FILE_SCHEME: &str = "file";

/// Line/column position in a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// Span between two positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }
}

/// Replacement of a range with new text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// Snapshot of an open document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub uri: Url,
    pub language_id: String,
    pub text: String,
}

impl TextDocument {
    pub fn new(uri: Url, language_id: impl Into<String>, text: impl Into<String>) -> Self {
        TextDocument {
            uri,
            language_id: language_id.into(),
            text: text.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        self.uri.scheme()
    }

    /// Filesystem path for `file:` documents
    pub fn fs_path(&self) -> Option<PathBuf> {
        if self.scheme() != FILE_SCHEME {
            return None;
        }
        self.uri.to_file_path().ok()
    }

    /// Position of byte `offset`, clamped to the document and to a char boundary
    pub fn position_at(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &self.text[..offset];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line = before.matches('\n').count() as u32;
        let character = before[line_start..].encode_utf16().count() as u32;
        Position { line, character }
    }

    /// Byte offset of `position`, clamped to its line
    pub fn offset_at(&self, position: Position) -> usize {
        let mut line_start = 0;
        for _ in 0..position.line {
            match self.text[line_start..].find('\n') {
                Some(i) => line_start += i + 1,
                None => return self.text.len(),
            }
        }

        let line_end = self.text[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(self.text.len());

        let mut units = 0u32;
        for (i, c) in self.text[line_start..line_end].char_indices() {
            if units >= position.character {
                return line_start + i;
            }
            units += c.len_utf16() as u32;
        }
        line_end
    }

    /// UTF-16 code units before byte `offset`, clamped like [`Self::position_at`]
    pub fn utf16_offset(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        self.text[..offset].encode_utf16().count()
    }

    /// UTF-16 code units before `position`
    pub fn utf16_offset_at(&self, position: Position) -> usize {
        self.utf16_offset(self.offset_at(position))
    }

    /// Range covering the whole document
    pub fn full_range(&self) -> Range {
        Range::new(Position::default(), self.position_at(self.text.len()))
    }
}
