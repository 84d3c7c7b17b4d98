//! Formatter status signal

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of the most recent resolution or format attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterStatus {
    Ready,
    Success,
    Warn,
    Error,
    Ignored,
    Disabled,
}

impl FormatterStatus {
    /// Marker appended to the status item text
    pub fn marker(&self) -> &'static str {
        match self {
            FormatterStatus::Ready | FormatterStatus::Success => "",
            FormatterStatus::Warn => "Warn",
            FormatterStatus::Error => "Error",
            FormatterStatus::Ignored | FormatterStatus::Disabled => "x",
        }
    }
}

impl std::fmt::Display for FormatterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormatterStatus::Ready => "ready",
            FormatterStatus::Success => "success",
            FormatterStatus::Warn => "warn",
            FormatterStatus::Error => "error",
            FormatterStatus::Ignored => "ignored",
            FormatterStatus::Disabled => "disabled",
        };
        write!(f, "{}", name)
    }
}

/// Per-document readiness computed when the active document changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Disabled,
    Ignored,
}

impl Readiness {
    pub fn status(&self) -> FormatterStatus {
        match self {
            Readiness::Ready => FormatterStatus::Ready,
            Readiness::Disabled => FormatterStatus::Disabled,
            Readiness::Ignored => FormatterStatus::Ignored,
        }
    }
}

/// Receives status updates for display
pub trait StatusSink: Send + Sync {
    /// Show `status`
    fn update(&self, status: FormatterStatus);

    /// Hide the status surface
    fn hide(&self);
}

#[derive(Debug, Default)]
struct StatusState {
    current: Option<FormatterStatus>,
    visible: bool,
    history: Vec<FormatterStatus>,
}

/// In-memory status item, rendered as `<text> <marker>`
#[derive(Debug)]
pub struct StatusBar {
    text: String,
    state: Mutex<StatusState>,
}

impl StatusBar {
    pub fn new(text: impl Into<String>) -> Self {
        StatusBar {
            text: text.into(),
            state: Mutex::new(StatusState::default()),
        }
    }

    pub fn current(&self) -> Option<FormatterStatus> {
        self.state.lock().current
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    /// Every status shown so far, oldest first
    pub fn history(&self) -> Vec<FormatterStatus> {
        self.state.lock().history.clone()
    }

    /// Text of the status item, `None` while hidden
    pub fn render(&self) -> Option<String> {
        let state = self.state.lock();
        if !state.visible {
            return None;
        }
        let marker = state.current.map(|s| s.marker()).unwrap_or("");
        Some(format!("{} {}", self.text, marker).trim_end().to_string())
    }
}

impl StatusSink for StatusBar {
    fn update(&self, status: FormatterStatus) {
        debug!(%status, "Formatter status");
        let mut state = self.state.lock();
        state.current = Some(status);
        state.visible = true;
        state.history.push(status);
    }

    fn hide(&self) {
        self.state.lock().visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let bar = StatusBar::new("Prettier");
        assert_eq!(bar.render(), None);

        bar.update(FormatterStatus::Success);
        assert_eq!(bar.render().as_deref(), Some("Prettier"));

        bar.update(FormatterStatus::Error);
        assert_eq!(bar.render().as_deref(), Some("Prettier Error"));

        bar.hide();
        assert_eq!(bar.render(), None);
        assert_eq!(bar.current(), Some(FormatterStatus::Error));
        assert_eq!(
            bar.history(),
            vec![FormatterStatus::Success, FormatterStatus::Error]
        );
    }

    #[test]
    fn test_readiness_status() {
        assert_eq!(Readiness::Ignored.status(), FormatterStatus::Ignored);
        assert_eq!(Readiness::Ready.status(), FormatterStatus::Ready);
    }
}
