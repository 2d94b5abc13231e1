//! Test doubles for the search loop.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use super::reporter::SearchReporter;
use crate::encoder::{EncodeAttempt, Encoder, EngineError, RateControl};

/// Outcome of one scripted encoder invocation
#[derive(Debug, Clone)]
pub enum Step {
    /// Write a file of this many bytes
    Size(u64),
    /// Exit with an error without touching the output
    Fail,
    /// Report success without writing anything
    NoOutput,
}

/// Encoder that plays a script; the last step repeats once exhausted
pub struct ScriptedEncoder {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Step>,
    cbr_size: Option<u64>,
    attempts: Mutex<Vec<EncodeAttempt>>,
}

impl ScriptedEncoder {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(Step::Fail),
            cbr_size: None,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Size produced by every constant-bitrate attempt
    pub fn with_cbr_size(mut self, size: u64) -> Self {
        self.cbr_size = Some(size);
        self
    }

    pub fn attempts(&self) -> Vec<EncodeAttempt> {
        self.attempts.lock().unwrap().clone()
    }

    fn next_step(&self, attempt: &EncodeAttempt) -> Step {
        if let (RateControl::Cbr { .. }, Some(size)) = (attempt.rate, self.cbr_size) {
            return Step::Size(size);
        }
        let mut last = self.last.lock().unwrap();
        if let Some(step) = self.steps.lock().unwrap().pop_front() {
            *last = step;
        }
        last.clone()
    }
}

#[async_trait]
impl Encoder for ScriptedEncoder {
    async fn encode(
        &self,
        _input: &Path,
        output: &Path,
        attempt: &EncodeAttempt,
    ) -> Result<(), EngineError> {
        self.attempts.lock().unwrap().push(attempt.clone());
        match self.next_step(attempt) {
            Step::Size(size) => {
                tokio::fs::write(output, vec![0u8; size as usize]).await.unwrap();
                Ok(())
            }
            Step::Fail => Err(EngineError::Exited {
                code: Some(1),
                stderr: "scripted failure".to_string(),
            }),
            Step::NoOutput => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub started: Vec<u32>,
    pub sizes: Vec<u64>,
    pub trims: Vec<(f64, f64)>,
    pub skipped_trims: Vec<f64>,
    pub fallbacks: Vec<u32>,
    pub failures: Vec<u32>,
}

impl SearchReporter for RecordingReporter {
    fn attempt_started(&mut self, number: u32, _attempt: &EncodeAttempt) {
        self.started.push(number);
    }

    fn attempt_finished(&mut self, _number: u32, _attempt: &EncodeAttempt, size: u64) {
        self.sizes.push(size);
    }

    fn duration_trimmed(&mut self, ratio: f64, cap_secs: f64) {
        self.trims.push((ratio, cap_secs));
    }

    fn trim_skipped(&mut self, ratio: f64) {
        self.skipped_trims.push(ratio);
    }

    fn fallback_started(&mut self, kbps: u32) {
        self.fallbacks.push(kbps);
    }

    fn engine_failed(&mut self, number: u32, _error: &EngineError) {
        self.failures.push(number);
    }
}

/// A placeholder source file inside `dir`
pub async fn input_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("in.wav");
    tokio::fs::write(&path, b"RIFF....WAVE").await.unwrap();
    path
}
