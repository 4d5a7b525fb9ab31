//! Terminal output
//!
//! - `Ui`: progress reporting for the loader, with a silent implementation
//!   for tests and an indicatif one for terminals
//! - `app`: the interactive explorer built on ratatui

pub mod app;
mod components;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

pub use app::ExplorerApp;

/// Loader phases
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Preparing,
    Loading,
    Committing,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Preparing => write!(f, "Preparing database"),
            Phase::Loading => write!(f, "Loading feeds"),
            Phase::Committing => write!(f, "Committing"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Trait for progress output - allows both terminal and silent/test modes
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
}

/// Progress bars on stderr, messages through tracing
#[derive(Default)]
pub struct ConsoleUi {
    bar: Option<ProgressBar>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self { bar: None }
    }

    fn new_bar(total: u64) -> ProgressBar {
        let bar = ProgressBar::new(total);
        let template = "{msg:24} [{bar:40.cyan/blue}] {pos}/{len}";
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar
    }
}

impl Ui for ConsoleUi {
    fn set_phase(&mut self, phase: Phase) {
        self.log(phase.to_string());
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        let bar = self.bar.get_or_insert_with(|| Self::new_bar(total));
        bar.set_length(total);
        bar.set_position(current);
        bar.set_message(label.into());
    }

    fn clear_progress(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &self.bar {
            Some(bar) => bar.suspend(|| info!("{}", message)),
            None => info!("{}", message),
        }
    }
}

/// Silent implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}
