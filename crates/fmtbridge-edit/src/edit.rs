//! Turning formatter output into document edits

use tracing::debug;

use crate::document::{Range, TextDocument, TextEdit};

/// How formatter output is applied back to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Replace only the span that differs
    Minimal,
    /// Replace the whole document
    FullDocument,
}

/// A byte-span replacement within the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Replacement {
    /// Apply to `original`, which must be the text the span was computed on
    pub fn apply(&self, original: &str) -> String {
        let mut out = String::with_capacity(original.len() - (self.end - self.start) + self.text.len());
        out.push_str(&original[..self.start]);
        out.push_str(&self.text);
        out.push_str(&original[self.end..]);
        out
    }
}

/// Smallest single replacement turning `original` into `formatted`
///
/// The common prefix and the common suffix (not overlapping the prefix) are
/// kept; only the middle differs. `None` when the texts are identical.
pub fn minimal_replacement(original: &str, formatted: &str) -> Option<Replacement> {
    if original == formatted {
        return None;
    }

    let prefix = original
        .char_indices()
        .zip(formatted.chars())
        .find(|((_, a), b)| a != b)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| original.len().min(formatted.len()));

    let suffix: usize = original[prefix..]
        .chars()
        .rev()
        .zip(formatted[prefix..].chars().rev())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum();

    Some(Replacement {
        start: prefix,
        end: original.len() - suffix,
        text: formatted[prefix..formatted.len() - suffix].to_string(),
    })
}

/// Replacement of the whole of `original`, `None` when nothing changed
pub fn full_replacement(original: &str, formatted: &str) -> Option<Replacement> {
    if original == formatted {
        return None;
    }
    Some(Replacement {
        start: 0,
        end: original.len(),
        text: formatted.to_string(),
    })
}

/// Edits for one format request
///
/// `NoOp` tells the caller nothing changed and other formatters may be tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditResult {
    NoOp,
    Replace(TextEdit),
}

impl EditResult {
    pub fn is_noop(&self) -> bool {
        matches!(self, EditResult::NoOp)
    }

    /// Edits as a list: empty, or exactly one replacement
    pub fn into_edits(self) -> Vec<TextEdit> {
        match self {
            EditResult::NoOp => Vec::new(),
            EditResult::Replace(edit) => vec![edit],
        }
    }
}

/// Converts formatter output into an [`EditResult`] for a document
#[derive(Debug, Clone, Copy, Default)]
pub struct EditComputer;

impl EditComputer {
    pub fn compute(&self, document: &TextDocument, formatted: &str, mode: EditMode) -> EditResult {
        let replacement = match mode {
            EditMode::Minimal => minimal_replacement(&document.text, formatted),
            EditMode::FullDocument => full_replacement(&document.text, formatted),
        };
        let Some(replacement) = replacement else {
            debug!(uri = %document.uri, "Formatter output identical to input");
            return EditResult::NoOp;
        };

        EditResult::Replace(TextEdit {
            range: Range::new(
                document.position_at(replacement.start),
                document.position_at(replacement.end),
            ),
            new_text: replacement.text,
        })
    }
}
