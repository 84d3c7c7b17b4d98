//! Document selectors deciding which documents the formatter handles

use std::path::Path;

use fmtbridge_module::SupportInfo;
use globset::{Glob, GlobMatcher};
use serde::Serialize;
use tracing::debug;

use crate::document::{TextDocument, FILE_SCHEME};
use crate::settings::Settings;

/// Languages for which range formatting is offered
pub const RANGE_LANGUAGES: &[&str] = &[
    "javascript",
    "javascriptreact",
    "typescript",
    "typescriptreact",
    "json",
    "jsonc",
    "graphql",
];

/// A declarative document pattern
///
/// Every field that is set must match. The score is the best of the matching
/// fields: 10 for an exact match, 5 for a `*` wildcard. File patterns are
/// compiled once when the filter is built.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(skip)]
    matcher: Option<GlobMatcher>,
}

impl PartialEq for DocumentFilter {
    fn eq(&self, other: &Self) -> bool {
        self.language == other.language
            && self.scheme == other.scheme
            && self.pattern == other.pattern
    }
}

impl Eq for DocumentFilter {}

impl DocumentFilter {
    pub fn language(language: impl Into<String>) -> Self {
        DocumentFilter {
            language: Some(language.into()),
            ..Default::default()
        }
    }

    /// Filter on `file:` documents whose path matches `pattern`
    ///
    /// An invalid pattern is logged and matches nothing.
    pub fn file_pattern(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let matcher = match Glob::new(&pattern) {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                debug!("Invalid document selector pattern {}: {}", pattern, e);
                None
            }
        };
        DocumentFilter {
            scheme: Some(FILE_SCHEME.to_string()),
            pattern: Some(pattern),
            matcher,
            ..Default::default()
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn score(&self, document: &TextDocument) -> u32 {
        let mut score = 0;

        if let Some(language) = &self.language {
            match field_score(language, &document.language_id) {
                0 => return 0,
                s => score = score.max(s),
            }
        }
        if let Some(scheme) = &self.scheme {
            match field_score(scheme, document.scheme()) {
                0 => return 0,
                s => score = score.max(s),
            }
        }
        if self.pattern.is_some() {
            let matched = match (&self.matcher, document.fs_path()) {
                (Some(matcher), Some(path)) => matcher.is_match(path),
                _ => false,
            };
            if !matched {
                return 0;
            }
            score = score.max(10);
        }
        score
    }
}

fn field_score(expected: &str, actual: &str) -> u32 {
    if expected == actual {
        10
    } else if expected == "*" {
        5
    } else {
        0
    }
}

/// Full-document and range selectors registered together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selectors {
    pub language: Vec<DocumentFilter>,
    pub range: Vec<DocumentFilter>,
}

impl Selectors {
    /// Best score of `document` against the full-document selectors
    pub fn score(&self, document: &TextDocument) -> u32 {
        best_score(&self.language, document)
    }

    /// Best score of `document` against the range selectors
    pub fn range_score(&self, document: &TextDocument) -> u32 {
        best_score(&self.range, document)
    }
}

fn best_score(filters: &[DocumentFilter], document: &TextDocument) -> u32 {
    filters.iter().map(|f| f.score(document)).max().unwrap_or(0)
}

/// Build selectors from the formatter's language table and the settings
///
/// Workspace-scoped selectors (user `documentSelectors` and the extension
/// pattern) are only produced when `root` is known. Languages listed in
/// `disableLanguages` are dropped from both sets.
pub fn build_selectors(info: &SupportInfo, root: Option<&Path>, settings: &Settings) -> Selectors {
    let mut languages: Vec<&str> = Vec::new();
    let mut extensions: Vec<&str> = Vec::new();
    for lang in &info.languages {
        for id in &lang.vscode_language_ids {
            if !languages.contains(&id.as_str()) {
                languages.push(id.as_str());
            }
        }
        for ext in &lang.extensions {
            let ext = ext.trim_start_matches('.');
            if !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }
    }

    let mut language = Vec::new();
    if let Some(root) = root {
        let root = root.display().to_string();
        let root = root.trim_end_matches('/');
        for pattern in &settings.document_selectors {
            language.push(DocumentFilter::file_pattern(format!("{}/{}", root, pattern)));
        }
        if !extensions.is_empty() {
            language.push(DocumentFilter::file_pattern(format!(
                "{}/**/*.{{{}}}",
                root,
                extensions.join(",")
            )));
        }
    }
    language.extend(languages.into_iter().map(DocumentFilter::language));

    let mut range: Vec<DocumentFilter> = RANGE_LANGUAGES
        .iter()
        .map(|l| DocumentFilter::language(*l))
        .collect();

    if !settings.disable_languages.is_empty() {
        let enabled = |filter: &DocumentFilter| {
            filter
                .language
                .as_deref()
                .map_or(true, |l| !settings.is_language_disabled(l))
        };
        language.retain(enabled);
        range.retain(enabled);
    }

    Selectors { language, range }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmtbridge_module::SupportLanguage;
    use url::Url;

    fn doc(uri: &str, language: &str) -> TextDocument {
        TextDocument::new(Url::parse(uri).unwrap(), language, "")
    }

    fn info() -> SupportInfo {
        SupportInfo {
            languages: vec![
                SupportLanguage {
                    name: "TypeScript".into(),
                    parsers: vec!["typescript".into()],
                    extensions: vec![".ts".into(), ".mts".into()],
                    vscode_language_ids: vec!["typescript".into()],
                    ..Default::default()
                },
                SupportLanguage {
                    name: "Markdown".into(),
                    parsers: vec!["markdown".into()],
                    extensions: vec![".md".into()],
                    vscode_language_ids: vec!["markdown".into()],
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_filter_scores() {
        let ts = doc("file:///ws/a.ts", "typescript");
        assert_eq!(DocumentFilter::language("typescript").score(&ts), 10);
        assert_eq!(DocumentFilter::language("*").score(&ts), 5);
        assert_eq!(DocumentFilter::language("markdown").score(&ts), 0);
        assert_eq!(DocumentFilter::file_pattern("/ws/**/*.ts").score(&ts), 10);
        assert_eq!(DocumentFilter::file_pattern("/other/**/*.ts").score(&ts), 0);

        let untitled = doc("untitled:Untitled-1", "typescript");
        assert_eq!(DocumentFilter::file_pattern("/ws/**/*.ts").score(&untitled), 0);

        let invalid = DocumentFilter::file_pattern("/ws/[a.ts");
        assert_eq!(invalid.pattern(), Some("/ws/[a.ts"));
        assert_eq!(invalid.score(&ts), 0);
    }

    #[test]
    fn test_build_selectors_for_workspace() {
        let settings = Settings {
            document_selectors: vec!["**/*.mdx".into()],
            ..Default::default()
        };
        let selectors = build_selectors(&info(), Some(Path::new("/ws")), &settings);

        assert_eq!(selectors.language[0].pattern(), Some("/ws/**/*.mdx"));
        assert_eq!(selectors.language[1].pattern(), Some("/ws/**/*.{ts,mts,md}"));
        assert!(selectors.language.contains(&DocumentFilter::language("markdown")));
        assert_eq!(selectors.range.len(), RANGE_LANGUAGES.len());

        // custom extension registered only through its pattern
        assert!(selectors.score(&doc("file:///ws/docs/page.mdx", "mdx")) > 0);
        assert_eq!(selectors.score(&doc("file:///ws/a.rs", "rust")), 0);
    }

    #[test]
    fn test_disabled_languages_removed() {
        let settings = Settings {
            disable_languages: vec!["markdown".into(), "json".into()],
            ..Default::default()
        };
        let selectors = build_selectors(&info(), None, &settings);
        assert_eq!(selectors.language, vec![DocumentFilter::language("typescript")]);
        assert!(!selectors.range.contains(&DocumentFilter::language("json")));
        assert_eq!(selectors.range.len(), RANGE_LANGUAGES.len() - 1);
    }
}
