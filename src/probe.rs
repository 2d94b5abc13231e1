//! # Metadata Probe Module
//!
//! Analisi della sorgente con ffprobe, sempre best-effort.
//!
//! ## Responsabilità:
//! - Esegue `ffprobe -v quiet -print_format json -show_format -show_streams`
//! - Converte l'output JSON in `MediaInfo`
//! - Assorbe qualsiasi errore: la ricerca procede senza durata
//!
//! La durata resta nella forma originale riportata da ffprobe e viene
//! interpretata solo quando serve (`MediaInfo::duration_secs`), così un
//! valore illeggibile fa saltare solo il taglio di durata.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Structural information about a source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    /// Duration exactly as the probe reported it
    pub duration: Option<String>,
    pub format_name: Option<String>,
    pub streams: Vec<StreamInfo>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamInfo {
    pub codec_type: String,
    pub codec_name: Option<String>,
    pub channels: Option<u8>,
    pub sample_rate: Option<u32>,
}

impl MediaInfo {
    /// Duration in seconds, if present and a finite positive number
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams.iter().filter(|s| s.codec_type == "audio")
    }

    pub fn has_audio(&self) -> bool {
        self.audio_streams().next().is_some()
    }

    /// Channel count of the first audio stream
    pub fn channels(&self) -> Option<u8> {
        self.audio_streams().find_map(|s| s.channels)
    }

    /// Parses `ffprobe -print_format json` output
    pub fn from_ffprobe_json(output: &str) -> Result<Self, ProbeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: Option<ProbeFormat>,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: Option<String>,
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            codec_name: Option<String>,
            channels: Option<u8>,
            sample_rate: Option<String>,
        }

        if output.trim().is_empty() {
            return Err(ProbeError::Parse("empty output".to_string()));
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ProbeError::Parse(e.to_string()))?;

        let (duration, format_name) = match probe.format {
            Some(format) => (format.duration, format.format_name),
            None => (None, None),
        };

        let streams = probe
            .streams
            .into_iter()
            .map(|s| StreamInfo {
                codec_type: s.codec_type.unwrap_or_else(|| "unknown".to_string()),
                codec_name: s.codec_name,
                channels: s.channels,
                sample_rate: s.sample_rate.and_then(|r| r.parse().ok()),
            })
            .collect();

        Ok(Self {
            duration,
            format_name,
            streams,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("probe exited with code {0:?}")]
    Exited(Option<i32>),

    #[error("failed to parse probe output: {0}")]
    Parse(String),
}

/// Read-only inspection of a source file
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, input: &Path) -> Result<MediaInfo, ProbeError>;
}

#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    async fn probe(&self, input: &Path) -> Result<MediaInfo, ProbeError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(input)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|source| ProbeError::Launch {
                program: self.ffprobe_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Exited(output.status.code()));
        }

        MediaInfo::from_ffprobe_json(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Runs the probe and downgrades every failure to `None`
pub async fn probe_media(prober: Option<&dyn Prober>, input: &Path) -> Option<MediaInfo> {
    let prober = match prober {
        Some(prober) => prober,
        None => {
            debug!("No probe available, continuing without media info");
            return None;
        }
    };

    match prober.probe(input).await {
        Ok(info) => {
            debug!(
                "Probed {}: duration={:?}, {} stream(s)",
                input.display(),
                info.duration,
                info.streams.len()
            );
            Some(info)
        }
        Err(e) => {
            warn!("Media info unavailable for {} ({}), continuing without it", input.display(), e);
            None
        }
    }
}
