//! Osservatore degli eventi della ricerca.

use crate::encoder::{EncodeAttempt, EngineError};

/// Receives search events; every method defaults to doing nothing
pub trait SearchReporter {
    /// `number` counts encoder invocations, starting at 1
    fn attempt_started(&mut self, _number: u32, _attempt: &EncodeAttempt) {}

    fn attempt_finished(&mut self, _number: u32, _attempt: &EncodeAttempt, _size: u64) {}

    fn duration_trimmed(&mut self, _ratio: f64, _cap_secs: f64) {}

    /// The trim condition held but no usable duration was known
    fn trim_skipped(&mut self, _ratio: f64) {}

    fn fallback_started(&mut self, _kbps: u32) {}

    fn engine_failed(&mut self, _number: u32, _error: &EngineError) {}
}

#[derive(Debug, Default)]
pub struct NoopReporter;

impl SearchReporter for NoopReporter {}
