//! # Audio Size Fitter Library
//!
//! Converte un file audio qualsiasi in un MP3 che non supera un budget in
//! byte, invocando ffmpeg come motore a scatola chiusa.
//!
//! ## Architettura dei moduli:
//! - `search`: Loop di ricerca limitato e politica di aggiustamento parametri
//! - `encoder`: Confine con il motore di encoding (trait `Encoder`, ffmpeg)
//! - `probe`: Analisi best-effort della sorgente con ffprobe
//! - `converter`: Punto di ingresso che collega probe, ricerca e reporting
//! - `config`: Configurazione e validazione parametri
//! - `error`: Tipi di errore
//! - `tool_resolver`: Ricerca dei binari esterni
//! - `file_manager`: Path di output e formattazione dimensioni
//! - `progress` / `json_output`: Feedback su console e in JSON
//! - `interactive`: Driver interattivo
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use audio_size_fitter::{Config, Converter};
//!
//! let converter = Converter::from_config(&Config::default())?;
//! let result = converter.convert(&input, &output, 100).await?;
//! ```

pub mod config;
pub mod converter;
pub mod encoder;
pub mod error;
pub mod file_manager;
pub mod interactive;
pub mod json_output;
pub mod probe;
pub mod progress;
pub mod search;
pub mod tool_resolver;

pub use config::Config;
pub use converter::{convert, Converter, ReportMode};
pub use encoder::{EncodeAttempt, Encoder, EngineError, FfmpegEncoder, QualityLevel, RateControl};
pub use error::ConvertError;
pub use probe::{MediaInfo, Prober};
pub use search::{search, ConversionFailure, ConversionRequest, ConversionResult, SearchReporter};
