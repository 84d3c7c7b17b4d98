//! Parser selection for a document

use std::path::Path;

use fmtbridge_module::{FileInfo, FormatterModuleHandle, SupportLanguage};
use tracing::{debug, warn};

use crate::error::{FormatError, FormatResult};

/// Language identifier that never maps to a parser
pub const PLAIN_TEXT: &str = "plaintext";

/// Editor language identifiers for JSX/TSX variants and the base language
/// whose table entry covers them
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("javascriptreact", "javascript"),
    ("javascript.jsx", "javascript"),
    ("typescriptreact", "typescript"),
    ("typescript.jsx", "typescript"),
    ("typescript.tsx", "typescript"),
];

fn by_language_id<'a>(
    languages: &'a [SupportLanguage],
    language_id: &str,
    file_name: Option<&str>,
) -> Option<&'a SupportLanguage> {
    languages.iter().find(|lang| {
        lang.vscode_language_ids.iter().any(|id| id == language_id)
            // filename-only languages apply to their listed files
            && (!lang.extensions.is_empty()
                || file_name.map_or(false, |name| lang.filenames.iter().any(|f| f == name)))
    })
}

fn by_file_name<'a>(languages: &'a [SupportLanguage], path: &Path) -> Option<&'a SupportLanguage> {
    let name = path.file_name()?.to_str()?;
    if let Some(lang) = languages.iter().find(|lang| lang.filenames.iter().any(|f| f == name)) {
        return Some(lang);
    }
    let extension = format!(".{}", path.extension()?.to_str()?);
    languages
        .iter()
        .find(|lang| lang.extensions.iter().any(|e| *e == extension))
}

/// Parser for `language_id` from the formatter's language table
///
/// Tries the language identifier, then the file name and extension, then the
/// JSX/TSX alias of the identifier.
pub fn parser_from_language_id(
    languages: &[SupportLanguage],
    path: Option<&Path>,
    language_id: &str,
) -> Option<String> {
    if language_id == PLAIN_TEXT {
        return None;
    }
    let file_name = path.and_then(|p| p.file_name()).and_then(|n| n.to_str());

    let language = by_language_id(languages, language_id, file_name)
        .or_else(|| path.and_then(|p| by_file_name(languages, p)))
        .or_else(|| {
            LANGUAGE_ALIASES
                .iter()
                .find(|(alias, _)| *alias == language_id)
                .and_then(|(_, base)| by_language_id(languages, base, file_name))
        })?;
    language.parsers.first().cloned()
}

/// Chooses the parser for a document
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserSelector;

impl ParserSelector {
    /// Inferred parser from `file_info`, else the language table fallback
    ///
    /// Fails when neither yields a parser; there is no default parser.
    pub async fn select(
        &self,
        handle: &FormatterModuleHandle,
        path: Option<&Path>,
        language_id: &str,
        file_info: Option<&FileInfo>,
        plugins: &[String],
    ) -> FormatResult<String> {
        if let Some(parser) = file_info.and_then(|info| info.inferred_parser.clone()) {
            debug!(parser = %parser, "Using inferred parser");
            return Ok(parser);
        }

        let unresolvable = || {
            FormatError::ParserUnresolvable(
                path.map(|p| p.display().to_string())
                    .unwrap_or_else(|| language_id.to_string()),
            )
        };
        if language_id == PLAIN_TEXT {
            return Err(unresolvable());
        }

        warn!("Parser not inferred, trying language {}", language_id);
        let info = handle.support_info(plugins).await?;
        parser_from_language_id(&info.languages, path, language_id).ok_or_else(unresolvable)
    }
}
