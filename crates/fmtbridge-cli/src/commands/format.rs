//! Format command - format one file

use std::path::PathBuf;

use fmtbridge_edit::{FormatRequest, FormatterStatus};
use tracing::info;

use crate::commands::{Command, Context, GlobalOptions};
use crate::error::{CliError, CliResult};

/// Parse a `START:END` byte range
pub fn parse_range(raw: &str) -> CliResult<std::ops::Range<usize>> {
    let (start, end) = raw
        .split_once(':')
        .ok_or_else(|| CliError::invalid_argument(format!("range must be START:END, got '{}'", raw)))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<usize>()
            .map_err(|_| CliError::invalid_argument(format!("invalid range offset '{}'", value)))
    };
    let (start, end) = (parse(start)?, parse(end)?);
    if start > end {
        return Err(CliError::invalid_argument(format!(
            "range start {} is after end {}",
            start, end
        )));
    }
    Ok(start..end)
}

/// Format command handler
pub struct FormatCommand {
    options: GlobalOptions,
    file: PathBuf,
    write: bool,
    force: bool,
    range: Option<String>,
    language: Option<String>,
}

impl FormatCommand {
    pub fn new(options: GlobalOptions, file: PathBuf) -> Self {
        Self {
            options,
            file,
            write: false,
            force: false,
            range: None,
            language: None,
        }
    }

    pub fn with_write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_range(mut self, range: Option<String>) -> Self {
        self.range = range;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

#[async_trait::async_trait]
impl Command for FormatCommand {
    async fn execute(&self) -> CliResult<()> {
        let range = self.range.as_deref().map(parse_range).transpose()?;
        let context = Context::build(&self.options).await?;
        let document = context
            .document(&self.file, self.language.as_deref())
            .await?;

        let mut request = FormatRequest::new(document.clone());
        if let Some(range) = range {
            request = request.with_range(range);
        }
        if self.force {
            request = request.forced();
        }

        let formatted = context.service.format(&request).await;
        let status = context.status.current();
        if status == Some(FormatterStatus::Error) {
            return Err(CliError::Internal(format!(
                "formatting {} failed, see the log for details",
                self.file.display()
            )));
        }

        if self.write {
            if formatted != document.text {
                tokio::fs::write(&self.file, &formatted).await?;
                info!("Wrote {}", self.file.display());
            }
        } else {
            print!("{}", formatted);
        }
        Ok(())
    }
}
