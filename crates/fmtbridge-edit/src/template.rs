//! Starter configuration file

use std::path::{Path, PathBuf};

use fmtbridge_module::{FormatterModuleHandle, OptionMap};
use serde_json::json;
use tracing::info;

use crate::error::FormatResult;

/// File name written by [`TemplateService::write_config_file`]
pub const TEMPLATE_FILE: &str = ".prettierrc";

/// Writes a starter configuration formatted by the formatter itself
pub struct TemplateService {
    module: FormatterModuleHandle,
}

impl TemplateService {
    pub fn new(module: FormatterModuleHandle) -> Self {
        TemplateService { module }
    }

    /// Write `.prettierrc` into `folder`, returning its path
    pub async fn write_config_file(&self, folder: &Path) -> FormatResult<PathBuf> {
        let settings = json!({ "tabWidth": 2, "useTabs": false });
        let output = folder.join(TEMPLATE_FILE);

        let mut options = OptionMap::new();
        options.insert("filepath".into(), json!(output.display().to_string()));
        options.insert("tabWidth".into(), settings["tabWidth"].clone());
        options.insert("useTabs".into(), settings["useTabs"].clone());

        let source = self
            .module
            .format(&serde_json::to_string_pretty(&settings)?, &options)
            .await?;

        info!("Writing {} to {}", TEMPLATE_FILE, output.display());
        tokio::fs::write(&output, source).await?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fmtbridge_module::{
        FormatterModule, ModuleInstall, ModuleOrigin, ModuleResult, SupportInfo,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        options: Mutex<Option<OptionMap>>,
    }

    #[async_trait]
    impl FormatterModule for Recorder {
        async fn format(&self, text: &str, options: &OptionMap) -> ModuleResult<String> {
            *self.options.lock() = Some(options.clone());
            Ok(format!("{}\n", text))
        }

        async fn support_info(&self, _plugins: &[String]) -> ModuleResult<SupportInfo> {
            Ok(SupportInfo::default())
        }
    }

    #[tokio::test]
    async fn test_writes_formatted_template() {
        let temp = TempDir::new().unwrap();
        let recorder = Arc::new(Recorder::default());
        let install = ModuleInstall {
            path: PathBuf::from("/opt/prettier"),
            version: None,
            entry: None,
            origin: ModuleOrigin::Bundled,
        };
        let service = TemplateService::new(FormatterModuleHandle::new(&install, recorder.clone()));

        let written = service.write_config_file(temp.path()).await.unwrap();
        assert_eq!(written, temp.path().join(".prettierrc"));

        let content = std::fs::read_to_string(&written).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, json!({"tabWidth": 2, "useTabs": false}));

        let options = recorder.options.lock().clone().unwrap();
        assert_eq!(options.get("tabWidth"), Some(&json!(2)));
        assert_eq!(
            options.get("filepath"),
            Some(&json!(written.display().to_string()))
        );
    }
}
