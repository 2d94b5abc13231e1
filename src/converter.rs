//! # Converter Module
//!
//! Punto di ingresso verso l'esterno: collega probe, ricerca e reporting.
//!
//! ## Flusso:
//! 1. Probe opzionale della sorgente (mai fatale)
//! 2. Ricerca limitata sull'encoder
//! 3. Reporting del verdetto (console, JSON o nessuno)
//!
//! ## Esempio:
//! ```rust,ignore
//! let converter = Converter::from_config(&Config::default())?;
//! let result = converter.convert(Path::new("song.flac"), Path::new("song.mp3"), 100).await?;
//! println!("{} bytes, ok = {}", result.final_size, result.succeeded);
//! ```

use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::encoder::{Encoder, FfmpegEncoder};
use crate::error::ConvertError;
use crate::json_output::{JsonMessage, JsonReporter};
use crate::probe::{probe_media, FfprobeProber, Prober};
use crate::progress::ConsoleReporter;
use crate::search::{self, ConversionRequest, ConversionResult, NoopReporter, SearchReporter};
use crate::tool_resolver::{ToolPathResolver, FFMPEG};

/// Where conversion progress goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    #[default]
    Silent,
    Console,
    Json,
}

/// Converts audio files into size-bounded MP3s
pub struct Converter {
    encoder: Box<dyn Encoder>,
    prober: Option<Box<dyn Prober>>,
    report_mode: ReportMode,
}

impl Converter {
    pub fn new(encoder: Box<dyn Encoder>, prober: Option<Box<dyn Prober>>) -> Self {
        Self {
            encoder,
            prober,
            report_mode: ReportMode::Silent,
        }
    }

    /// Builds an ffmpeg-backed converter; ffprobe is optional
    pub fn from_config(config: &Config) -> Result<Self, ConvertError> {
        let resolver = ToolPathResolver::from_config(config);
        let ffmpeg = resolver
            .check_tool_with_instructions(FFMPEG)
            .map_err(ConvertError::MissingDependency)?;

        let prober = match resolver.ffprobe() {
            Some(path) => Some(Box::new(FfprobeProber::new(path)) as Box<dyn Prober>),
            None => {
                warn!("ffprobe not found, converting without media info");
                None
            }
        };

        let encoder = FfmpegEncoder::new(ffmpeg).with_timeout(config.encode_timeout());
        let report_mode = if config.json_output {
            ReportMode::Json
        } else {
            ReportMode::Silent
        };

        Ok(Self::new(Box::new(encoder), prober).with_report_mode(report_mode))
    }

    pub fn with_report_mode(mut self, report_mode: ReportMode) -> Self {
        self.report_mode = report_mode;
        self
    }

    /// Converts `input` into `output` under `target_size_kb` KiB
    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        target_size_kb: u64,
    ) -> Result<ConversionResult, ConvertError> {
        let request = ConversionRequest::from_kb(input, output, target_size_kb);
        match self.report_mode {
            ReportMode::Silent => self.convert_request(&request, &mut NoopReporter).await,
            ReportMode::Console => {
                let mut reporter = ConsoleReporter::new(request.target_size);
                self.convert_request(&request, &mut reporter).await
            }
            ReportMode::Json => {
                JsonMessage::Start {
                    input: request.input_path.clone(),
                    output: request.output_path.clone(),
                    target_size: request.target_size,
                }
                .emit();
                let outcome = self.convert_request(&request, &mut JsonReporter).await;
                match &outcome {
                    Ok(result) => JsonMessage::complete(result).emit(),
                    Err(e) => {
                        JsonMessage::error("conversion not started", Some(e.to_string())).emit()
                    }
                }
                outcome
            }
        }
    }

    /// Probe and search for an already built request
    pub async fn convert_request(
        &self,
        request: &ConversionRequest,
        reporter: &mut dyn SearchReporter,
    ) -> Result<ConversionResult, ConvertError> {
        info!(
            "Converting {} -> {} (target {} bytes)",
            request.input_path.display(),
            request.output_path.display(),
            request.target_size
        );

        let info = probe_media(self.prober.as_deref(), &request.input_path).await;
        if self.report_mode == ReportMode::Json {
            JsonMessage::probe(info.as_ref()).emit();
        }

        let result = search::search(request, info.as_ref(), self.encoder.as_ref(), reporter).await?;
        if result.succeeded {
            info!("Conversion done: {} bytes", result.final_size);
        } else {
            error!("Conversion did not meet the target: {:?}", result.failure);
        }
        Ok(result)
    }
}

/// Converts with ffmpeg from the PATH; true when the output fits the budget
pub async fn convert(input: &Path, output: &Path, target_size_kb: u64) -> bool {
    let converter = match Converter::from_config(&Config::default()) {
        Ok(converter) => converter,
        Err(e) => {
            error!("{}", e);
            return false;
        }
    };

    match converter.convert(input, output, target_size_kb).await {
        Ok(result) => result.succeeded,
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{MediaInfo, ProbeError, StreamInfo};
    use crate::search::testing::{input_file, ScriptedEncoder, Step};
    use crate::search::ConversionFailure;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::TempDir;

    const KB: u64 = 1024;

    struct FixedProber(Result<MediaInfo, ()>);

    #[async_trait]
    impl Prober for FixedProber {
        async fn probe(&self, _input: &Path) -> Result<MediaInfo, ProbeError> {
            self.0
                .clone()
                .map_err(|_| ProbeError::Parse("scripted".to_string()))
        }
    }

    /// Lets a test keep a handle on the encoder the converter owns
    struct Shared(Arc<ScriptedEncoder>);

    #[async_trait]
    impl Encoder for Shared {
        async fn encode(
            &self,
            input: &Path,
            output: &Path,
            attempt: &crate::encoder::EncodeAttempt,
        ) -> Result<(), crate::encoder::EngineError> {
            self.0.encode(input, output, attempt).await
        }
    }

    fn stereo_hour() -> MediaInfo {
        MediaInfo {
            duration: Some("3600".to_string()),
            streams: vec![StreamInfo {
                codec_type: "audio".to_string(),
                channels: Some(2),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_convert_uses_kb_budget() {
        let dir = TempDir::new().unwrap();
        let input = input_file(&dir).await;
        let output = dir.path().join("out.mp3");
        let converter = Converter::new(Box::new(ScriptedEncoder::new([Step::Size(85 * KB)])), None);

        let result = converter.convert(&input, &output, 100).await.unwrap();

        assert!(result.succeeded);
        assert_eq!(result.final_size, 85 * KB);
        assert_eq!(result.output_path, output);
    }

    #[tokio::test]
    async fn test_probe_failure_is_absorbed() {
        let dir = TempDir::new().unwrap();
        let input = input_file(&dir).await;
        let encoder = Arc::new(ScriptedEncoder::new([Step::Size(200 * KB)]).with_cbr_size(9 * KB));
        let converter = Converter::new(
            Box::new(Shared(encoder.clone())),
            Some(Box::new(FixedProber(Err(())))),
        );

        let result = converter.convert(&input, &dir.path().join("out.mp3"), 10).await.unwrap();

        assert!(result.succeeded);
        assert!(encoder.attempts().iter().all(|a| a.duration_cap.is_none()));
    }

    #[tokio::test]
    async fn test_probe_duration_enables_trim() {
        let dir = TempDir::new().unwrap();
        let input = input_file(&dir).await;
        let encoder = Arc::new(ScriptedEncoder::new([Step::Size(200 * KB)]).with_cbr_size(9 * KB));
        let converter = Converter::new(
            Box::new(Shared(encoder.clone())),
            Some(Box::new(FixedProber(Ok(stereo_hour())))),
        );

        converter.convert(&input, &dir.path().join("out.mp3"), 10).await.unwrap();

        assert!(encoder.attempts().iter().any(|a| a.duration_cap.is_some()));
    }

    #[tokio::test]
    async fn test_engine_failure_is_a_result() {
        let dir = TempDir::new().unwrap();
        let input = input_file(&dir).await;
        let converter = Converter::new(Box::new(ScriptedEncoder::new([Step::Fail])), None);

        let result = converter.convert(&input, &dir.path().join("out.mp3"), 100).await.unwrap();

        assert!(!result.succeeded);
        assert!(matches!(result.failure, Some(ConversionFailure::EngineInvocation(_))));
    }

    #[tokio::test]
    async fn test_zero_budget_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = input_file(&dir).await;
        let converter = Converter::new(Box::new(ScriptedEncoder::new([Step::Size(KB)])), None);

        let err = converter.convert(&input, &dir.path().join("out.mp3"), 0).await.unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_missing_ffmpeg_is_missing_dependency() {
        let config = Config {
            ffmpeg_path: Some("/nonexistent/ffmpeg".into()),
            ..Default::default()
        };
        assert!(matches!(
            Converter::from_config(&config),
            Err(ConvertError::MissingDependency(_))
        ));
    }
}
