//! # Progress Reporting Module
//!
//! Feedback visivo per l'utente durante la ricerca.
//!
//! ## Responsabilità:
//! - Spinner `indicatif` mentre ogni tentativo di encoding è in corso
//! - Righe di stato su stderr per ogni tentativo misurato
//! - Riepilogo finale con dimensione e verdetto
//!
//! ## Visual feedback:
//! ```text
//! ⠋ Attempt #3: VBR q:a 8, cut at 162.00s
//! 📏 Attempt #3: 187.42 KB > target 10.00 KB
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::encoder::{EncodeAttempt, EngineError};
use crate::file_manager::FileManager;
use crate::search::{ConversionFailure, ConversionResult, SearchReporter};

/// Console reporter with a spinner per attempt
pub struct ConsoleReporter {
    target_size: u64,
    spinner: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(target_size: u64) -> Self {
        Self {
            target_size,
            spinner: None,
        }
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    pub fn format_summary(result: &ConversionResult) -> String {
        let size = FileManager::format_size(result.final_size);
        match &result.failure {
            None => format!(
                "✅ Saved {} ({}) after {} attempt(s)",
                result.output_path.display(),
                size,
                result.encoder_invocations
            ),
            Some(ConversionFailure::SizeTargetUnmet) => format!(
                "⚠️  Could not reach the target, best effort {} left at {}",
                size,
                result.output_path.display()
            ),
            Some(ConversionFailure::EngineInvocation(e)) => {
                format!("❌ Encoder failed after {} attempt(s): {}", result.encoder_invocations, e)
            }
        }
    }
}

impl SearchReporter for ConsoleReporter {
    fn attempt_started(&mut self, number: u32, attempt: &EncodeAttempt) {
        self.spinner = Some(Self::spinner(&format!("Attempt #{}: {}", number, attempt.describe())));
    }

    fn attempt_finished(&mut self, number: u32, _attempt: &EncodeAttempt, size: u64) {
        self.clear_spinner();
        let relation = if size <= self.target_size { "<=" } else { ">" };
        eprintln!(
            "📏 Attempt #{}: {} {} target {}",
            number,
            FileManager::format_size(size),
            relation,
            FileManager::format_size(self.target_size)
        );
    }

    fn duration_trimmed(&mut self, ratio: f64, cap_secs: f64) {
        eprintln!(
            "✂️  Cutting to {:.2}% of the original duration ({:.1}s)",
            ratio * 100.0,
            cap_secs
        );
    }

    fn trim_skipped(&mut self, _ratio: f64) {
        eprintln!("⏩ Duration unknown, not cutting");
    }

    fn fallback_started(&mut self, kbps: u32) {
        eprintln!("🔄 Final attempt at {}kbps mono", kbps);
    }

    fn engine_failed(&mut self, number: u32, error: &EngineError) {
        self.clear_spinner();
        eprintln!("❌ Attempt #{} failed: {}", number, error);
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}
