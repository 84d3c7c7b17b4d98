//! Formatter module resolution for fmtbridge
//!
//! Locates an installed formatter package (project-local, explicitly configured,
//! globally installed, or bundled), loads it behind the [`FormatterModule`]
//! capability trait, and caches the resulting handles per project root.
//! Project configuration discovery (`.prettierrc*`, `package.json`,
//! `.editorconfig`) lives here too, since the process-backed module resolves
//! configuration natively.

pub mod editorconfig;
pub mod error;
pub mod global;
pub mod install;
pub mod module;
pub mod paths;
pub mod process;
pub mod project_config;
pub mod resolver;
pub mod types;

pub use error::{ModuleError, ModuleResult};
pub use global::PackageManager;
pub use install::{find_local_install, project_root, read_install, MANIFEST_FILE, MODULES_DIR};
pub use module::{FormatterModule, FormatterModuleHandle, ModuleInstall, ModuleLoader};
pub use paths::expand_setting_path;
pub use process::{ProcessModule, ProcessModuleLoader};
pub use project_config::{
    find_config_file, resolve_project_config, watched_config_files, CONFIG_FILES,
};
pub use resolver::{ModuleResolver, ResolverSettings, DEFAULT_PACKAGE};
pub use types::{
    Capabilities, Capability, FileInfo, FileInfoOptions, ModuleOrigin, OptionMap,
    ResolveConfigOptions, SupportInfo, SupportLanguage,
};
