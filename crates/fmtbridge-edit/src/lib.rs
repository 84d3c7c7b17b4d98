//! Editor-facing formatting pipeline for fmtbridge
//!
//! Turns a document and the editor's settings into formatter output: resolves
//! the formatter module, merges project and editor configuration, honors
//! ignore files, picks a parser, and converts the result into a single text
//! edit. [`FormatService`] ties the pieces together and reports a
//! [`FormatterStatus`] after every attempt.

pub mod config_resolver;
pub mod document;
pub mod edit;
pub mod error;
pub mod ignore_file;
pub mod parser;
pub mod registration;
pub mod selector;
pub mod service;
pub mod settings;
pub mod status;
pub mod template;
pub mod watch;
pub mod workspace;

// Re-export public API
pub use config_resolver::{
    ConfigResolution, ConfigResolver, ProjectConfig, Provenance, RequestOptions, ResolvedConfig,
};
pub use document::{Position, Range, TextDocument, TextEdit};
pub use edit::{full_replacement, minimal_replacement, EditComputer, EditMode, EditResult, Replacement};
pub use error::{FormatError, FormatResult};
pub use ignore_file::{IgnoreMatcher, IgnoreMatcherCache};
pub use parser::{parser_from_language_id, ParserSelector};
pub use registration::{NoopRegistrar, ProviderRegistrar, RegistrationCache, WorkspaceRegistration};
pub use selector::{build_selectors, DocumentFilter, Selectors};
pub use service::{FormatRequest, FormatService};
pub use settings::{EditorDefaults, Settings, SettingsProvider, StaticSettings};
pub use status::{FormatterStatus, Readiness, StatusBar, StatusSink};
pub use template::TemplateService;
pub use watch::{
    FileWatcher, ManualWatcher, NotifyWatcher, WatchEvent, WatchEventKind, WatchPattern,
    WatchSubscription,
};
pub use workspace::WorkspaceFolders;
