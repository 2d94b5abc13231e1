//! # Size Search
//!
//! Loop di ricerca limitato sopra un `Encoder` a scatola chiusa.
//!
//! ## Algoritmo:
//! 1. Tentativo iniziale VBR q:a 4; se rientra nel budget ci si ferma
//! 2. Fino a 9 tentativi di raffinamento: qualità +2 se la dimensione supera
//!    il doppio del target, altrimenti +1 (massimo 9); da q:a 7 in su, se la
//!    dimensione supera 1.5× il target, si taglia la durata al
//!    `target / dimensione * 0.9` dell'originale
//! 3. Se il budget non è ancora rispettato: tentativo finale CBR mono a
//!    `max(8, target_kb * 8 / 1.5)` kbps
//!
//! Ogni tentativo sovrascrive lo stesso file di output. Un errore del motore
//! interrompe subito la ricerca, senza altri tentativi.

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::policy::{self, FALLBACK_CHANNELS, INITIAL_QUALITY, MAX_VBR_ATTEMPTS};
use super::reporter::SearchReporter;
use crate::encoder::{EncodeAttempt, Encoder, EngineError};
use crate::error::ConvertError;
use crate::file_manager::FileManager;
use crate::probe::MediaInfo;

/// One conversion job
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Budget in bytes, must be positive
    pub target_size: u64,
}

impl ConversionRequest {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        target_size: u64,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            target_size,
        }
    }

    /// Budget expressed in KiB
    pub fn from_kb(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        target_size_kb: u64,
    ) -> Self {
        Self::new(input_path, output_path, target_size_kb.saturating_mul(1024))
    }

    async fn check_preconditions(&self, info: Option<&MediaInfo>) -> Result<(), ConvertError> {
        if self.target_size == 0 {
            return Err(ConvertError::precondition("target size must be greater than zero"));
        }

        match tokio::fs::metadata(&self.input_path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => {
                return Err(ConvertError::precondition(format!(
                    "input is not a file: {}",
                    self.input_path.display()
                )))
            }
            Err(_) => {
                return Err(ConvertError::precondition(format!(
                    "input file does not exist: {}",
                    self.input_path.display()
                )))
            }
        }

        // Only trust a probe that actually listed streams
        if let Some(info) = info {
            if !info.streams.is_empty() && !info.has_audio() {
                return Err(ConvertError::precondition(format!(
                    "input has no audio stream: {}",
                    self.input_path.display()
                )));
            }
        }

        Ok(())
    }
}

/// Why a conversion did not succeed
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionFailure {
    /// The encoder could not be run or exited with an error
    EngineInvocation(String),
    /// Every attempt ran fine but the output is still over budget
    SizeTargetUnmet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub succeeded: bool,
    /// Size of the artifact left at `output_path`, in bytes
    pub final_size: u64,
    pub output_path: PathBuf,
    pub failure: Option<ConversionFailure>,
    pub encoder_invocations: u32,
    /// Parameters of the last encoder invocation
    pub final_attempt: Option<EncodeAttempt>,
}

impl ConversionResult {
    pub fn is_engine_failure(&self) -> bool {
        matches!(self.failure, Some(ConversionFailure::EngineInvocation(_)))
    }
}

struct SearchRun<'a> {
    request: &'a ConversionRequest,
    encoder: &'a dyn Encoder,
    reporter: &'a mut dyn SearchReporter,
    invocations: u32,
    /// Size of the last artifact this run measured
    last_size: Option<u64>,
}

impl SearchRun<'_> {
    /// Encodes once and measures the artifact
    async fn run(&mut self, attempt: &EncodeAttempt) -> Result<u64, EngineError> {
        self.invocations += 1;
        let number = self.invocations;
        debug!("Attempt #{}: {}", number, attempt.describe());
        self.reporter.attempt_started(number, attempt);

        let outcome = match self
            .encoder
            .encode(&self.request.input_path, &self.request.output_path, attempt)
            .await
        {
            Ok(()) => measure(&self.request.output_path).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(size) => {
                info!(
                    "Attempt #{}: {} bytes with {} (target {})",
                    number, size, attempt.describe(), self.request.target_size
                );
                self.reporter.attempt_finished(number, attempt, size);
                self.last_size = Some(size);
                Ok(size)
            }
            Err(e) => {
                error!("Attempt #{} failed: {}", number, e);
                self.reporter.engine_failed(number, &e);
                Err(e)
            }
        }
    }

    fn finish(&self, final_size: u64, attempt: EncodeAttempt) -> ConversionResult {
        let succeeded = final_size <= self.request.target_size;
        ConversionResult {
            succeeded,
            final_size,
            output_path: self.request.output_path.clone(),
            failure: (!succeeded).then_some(ConversionFailure::SizeTargetUnmet),
            encoder_invocations: self.invocations,
            final_attempt: Some(attempt),
        }
    }

    async fn abort(&self, error: EngineError, attempt: EncodeAttempt) -> ConversionResult {
        // A file from an earlier run is not this run's artifact
        let final_size = match self.last_size {
            Some(_) => measure(&self.request.output_path).await.unwrap_or(0),
            None => 0,
        };
        ConversionResult {
            succeeded: false,
            final_size,
            output_path: self.request.output_path.clone(),
            failure: Some(ConversionFailure::EngineInvocation(error.to_string())),
            encoder_invocations: self.invocations,
            final_attempt: Some(attempt),
        }
    }
}

async fn measure(path: &Path) -> Result<u64, EngineError> {
    FileManager::file_size(path)
        .await
        .map_err(|_| EngineError::MissingOutput(path.to_path_buf()))
}

/// Runs the bounded search for `request`
///
/// Returns `Err` only for precondition violations; engine failures and an
/// unmet budget are reported through `ConversionResult::failure`.
pub async fn search(
    request: &ConversionRequest,
    info: Option<&MediaInfo>,
    encoder: &dyn Encoder,
    reporter: &mut dyn SearchReporter,
) -> Result<ConversionResult, ConvertError> {
    request.check_preconditions(info).await?;

    let target = request.target_size;
    let mut run = SearchRun {
        request,
        encoder,
        reporter,
        invocations: 0,
        last_size: None,
    };

    let mut quality = INITIAL_QUALITY;
    let mut attempt = EncodeAttempt::vbr(quality);
    let mut size = match run.run(&attempt).await {
        Ok(size) => size,
        Err(e) => return Ok(run.abort(e, attempt).await),
    };

    if size <= target {
        return Ok(run.finish(size, attempt));
    }

    let mut attempt_count = 1;
    while size > target && attempt_count < MAX_VBR_ATTEMPTS {
        quality = policy::next_quality(quality, size, target);
        attempt = EncodeAttempt::vbr(quality);

        if let Some(ratio) = policy::trim_ratio(quality, size, target) {
            match policy::duration_cap(ratio, info) {
                Some(cap) => {
                    info!(
                        "Cutting duration to {:.2}% of the original ({:.2}s)",
                        ratio * 100.0,
                        cap
                    );
                    run.reporter.duration_trimmed(ratio, cap);
                    attempt = attempt.with_duration_cap(cap);
                }
                None => {
                    warn!("No usable duration, skipping the duration cut");
                    run.reporter.trim_skipped(ratio);
                }
            }
        }

        size = match run.run(&attempt).await {
            Ok(size) => size,
            Err(e) => return Ok(run.abort(e, attempt).await),
        };
        attempt_count += 1;
    }

    if size <= target {
        return Ok(run.finish(size, attempt));
    }

    let kbps = policy::fallback_bitrate_kbps(target);
    info!("Quality scale exhausted, final pass at {}k mono", kbps);
    run.reporter.fallback_started(kbps);

    attempt = EncodeAttempt::cbr(kbps).with_channels(FALLBACK_CHANNELS);
    size = match run.run(&attempt).await {
        Ok(size) => size,
        Err(e) => return Ok(run.abort(e, attempt).await),
    };

    let result = run.finish(size, attempt);
    if !result.succeeded {
        warn!("Could not fit under {} bytes, best effort is {} bytes", target, size);
    }
    Ok(result)
}
