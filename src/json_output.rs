//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso da script
//! o da altri processi.
//!
//! ## Responsabilità:
//! - Emette un oggetto JSON per riga su stdout per ogni evento
//! - Implementa `SearchReporter` per seguire i tentativi della ricerca
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio conversione
//! - `probe`: Risultato dell'analisi della sorgente
//! - `attempt`: Tentativo di encoding misurato
//! - `trim`: Taglio di durata applicato o saltato
//! - `fallback`: Inizio del tentativo finale a bitrate fisso
//! - `complete`: Verdetto finale
//! - `error`: Errore che ha impedito la conversione

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::encoder::{EncodeAttempt, EngineError, RateControl};
use crate::probe::MediaInfo;
use crate::search::{ConversionFailure, ConversionResult, SearchReporter};

/// Tipo di messaggio JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    #[serde(rename = "start")]
    Start {
        input: PathBuf,
        output: PathBuf,
        target_size: u64,
    },

    #[serde(rename = "probe")]
    Probe {
        available: bool,
        duration_seconds: Option<f64>,
        channels: Option<u8>,
    },

    #[serde(rename = "attempt")]
    Attempt {
        number: u32,
        quality: Option<u8>,
        bitrate_kbps: Option<u32>,
        channels: Option<u8>,
        duration_cap: Option<f64>,
        size: Option<u64>,
        error: Option<String>,
    },

    #[serde(rename = "trim")]
    Trim {
        ratio: f64,
        /// None when no usable duration was known
        cap_seconds: Option<f64>,
    },

    #[serde(rename = "fallback")]
    Fallback { bitrate_kbps: u32, channels: u8 },

    #[serde(rename = "complete")]
    Complete {
        succeeded: bool,
        final_size: u64,
        output_path: PathBuf,
        encoder_invocations: u32,
        failure: Option<String>,
    },

    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn probe(info: Option<&MediaInfo>) -> Self {
        Self::Probe {
            available: info.is_some(),
            duration_seconds: info.and_then(MediaInfo::duration_secs),
            channels: info.and_then(MediaInfo::channels),
        }
    }

    pub fn attempt(number: u32, attempt: &EncodeAttempt, outcome: Result<u64, String>) -> Self {
        let (quality, bitrate_kbps) = match attempt.rate {
            RateControl::Vbr(q) => (Some(q.value()), None),
            RateControl::Cbr { kbps } => (None, Some(kbps)),
        };
        let (size, error) = match outcome {
            Ok(size) => (Some(size), None),
            Err(e) => (None, Some(e)),
        };
        Self::Attempt {
            number,
            quality,
            bitrate_kbps,
            channels: attempt.channels,
            duration_cap: attempt.duration_cap,
            size,
            error,
        }
    }

    pub fn complete(result: &ConversionResult) -> Self {
        let failure = result.failure.as_ref().map(|f| match f {
            ConversionFailure::EngineInvocation(e) => format!("engine_invocation: {}", e),
            ConversionFailure::SizeTargetUnmet => "size_target_unmet".to_string(),
        });
        Self::Complete {
            succeeded: result.succeeded,
            final_size: result.final_size,
            output_path: result.output_path.clone(),
            encoder_invocations: result.encoder_invocations,
            failure,
        }
    }

    pub fn error(message: impl Into<String>, details: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            details,
        }
    }
}

/// Emits search events as JSON lines
#[derive(Debug, Default)]
pub struct JsonReporter;

impl SearchReporter for JsonReporter {
    fn attempt_finished(&mut self, number: u32, attempt: &EncodeAttempt, size: u64) {
        JsonMessage::attempt(number, attempt, Ok(size)).emit();
    }

    fn duration_trimmed(&mut self, ratio: f64, cap_secs: f64) {
        JsonMessage::Trim {
            ratio,
            cap_seconds: Some(cap_secs),
        }
        .emit();
    }

    fn trim_skipped(&mut self, ratio: f64) {
        JsonMessage::Trim {
            ratio,
            cap_seconds: None,
        }
        .emit();
    }

    fn fallback_started(&mut self, kbps: u32) {
        JsonMessage::Fallback {
            bitrate_kbps: kbps,
            channels: crate::search::policy::FALLBACK_CHANNELS,
        }
        .emit();
    }

    fn engine_failed(&mut self, number: u32, error: &EngineError) {
        JsonMessage::Error {
            message: format!("attempt #{} failed", number),
            details: Some(error.to_string()),
        }
        .emit();
    }
}
