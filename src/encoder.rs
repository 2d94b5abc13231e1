//! # Encoding Engine Module
//!
//! Questo modulo è il confine con il motore di encoding esterno (ffmpeg).
//!
//! ## Responsabilità:
//! - Definisce `EncodeAttempt`, il set di parametri di un singolo tentativo
//! - Definisce il trait `Encoder`, unico punto di contatto della ricerca
//!   con il motore
//! - Implementa `FfmpegEncoder` con libmp3lame
//!
//! ## Contratto col motore:
//! - Dato (input, output, parametri) produce un file in output o fallisce
//! - L'output esistente viene sempre sovrascritto (`-y`)
//! - Nessun output interattivo o diagnostico (`-nostdin`, `-loglevel error`)
//! - Nessun feedback oltre a successo/fallimento: la dimensione si misura
//!   dopo, sul file lasciato su disco
//!
//! ## Comando generato:
//! ```text
//! ffmpeg -hide_banner -nostdin -loglevel error -y -i <in> [-t <sec>] -vn \
//!        -acodec libmp3lame (-q:a N | -b:a Nk) [-ac N] -f mp3 <out>
//! ```

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// LAME VBR quality ordinal: 0 is the best quality, 9 the smallest output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QualityLevel(u8);

impl QualityLevel {
    pub const WORST: QualityLevel = QualityLevel(9);

    /// Builds a level, clamping anything above 9
    pub const fn new(level: u8) -> Self {
        if level > Self::WORST.0 {
            Self::WORST
        } else {
            Self(level)
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Moves `steps` towards the worst setting, saturating at 9
    pub fn degrade(self, steps: u8) -> Self {
        Self::new(self.0.saturating_add(steps))
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the encoder chooses its bitrate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateControl {
    /// Encoder-chosen bitrate driven by a quality ordinal
    Vbr(QualityLevel),
    /// Explicit constant bitrate in kbit/s
    Cbr { kbps: u32 },
}

/// Parameter set for one encoder invocation
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeAttempt {
    pub rate: RateControl,
    /// Forced output channel count (None keeps the source layout)
    pub channels: Option<u8>,
    /// Hard stop time in seconds
    pub duration_cap: Option<f64>,
}

impl EncodeAttempt {
    pub fn vbr(quality: QualityLevel) -> Self {
        Self {
            rate: RateControl::Vbr(quality),
            channels: None,
            duration_cap: None,
        }
    }

    pub fn cbr(kbps: u32) -> Self {
        Self {
            rate: RateControl::Cbr { kbps },
            channels: None,
            duration_cap: None,
        }
    }

    pub fn with_channels(mut self, channels: u8) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn with_duration_cap(mut self, seconds: f64) -> Self {
        self.duration_cap = Some(seconds);
        self
    }

    pub fn quality(&self) -> Option<QualityLevel> {
        match self.rate {
            RateControl::Vbr(q) => Some(q),
            RateControl::Cbr { .. } => None,
        }
    }

    /// Short human readable description for logs
    pub fn describe(&self) -> String {
        let mut text = match self.rate {
            RateControl::Vbr(q) => format!("VBR q:a {}", q),
            RateControl::Cbr { kbps } => format!("CBR {}k", kbps),
        };
        if let Some(channels) = self.channels {
            text.push_str(&format!(", {} channel(s)", channels));
        }
        if let Some(cap) = self.duration_cap {
            text.push_str(&format!(", cut at {:.2}s", cap));
        }
        text
    }
}

/// Failures of a single encoder invocation
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder exited with code {code:?}: {stderr}")]
    Exited { code: Option<i32>, stderr: String },

    #[error("encoder timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("encoder reported success but left no file at {0}")]
    MissingOutput(PathBuf),
}

/// Black-box audio encoder
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Encodes `input` into `output`, overwriting whatever is there
    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        attempt: &EncodeAttempt,
    ) -> Result<(), EngineError>;
}

/// ffmpeg + libmp3lame encoder
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the ffmpeg argument list for an attempt
    pub fn build_args(input: &Path, output: &Path, attempt: &EncodeAttempt) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(input.to_string_lossy().to_string());

        if let Some(cap) = attempt.duration_cap {
            args.push("-t".to_string());
            args.push(format!("{:.3}", cap));
        }

        // Attached cover art would otherwise be muxed into the MP3
        args.push("-vn".to_string());
        args.push("-acodec".to_string());
        args.push("libmp3lame".to_string());

        match attempt.rate {
            RateControl::Vbr(quality) => {
                args.push("-q:a".to_string());
                args.push(quality.to_string());
            }
            RateControl::Cbr { kbps } => {
                args.push("-b:a".to_string());
                args.push(format!("{}k", kbps));
            }
        }

        if let Some(channels) = attempt.channels {
            args.push("-ac".to_string());
            args.push(channels.to_string());
        }

        args.push("-f".to_string());
        args.push("mp3".to_string());
        args.push(output.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        attempt: &EncodeAttempt,
    ) -> Result<(), EngineError> {
        let args = Self::build_args(input, output, attempt);
        debug!("Running {} {:?}", self.ffmpeg_path.display(), args);

        let child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Launch {
                program: self.ffmpeg_path.clone(),
                source,
            })?;

        let start_time = std::time::Instant::now();
        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| EngineError::Timeout {
                    timeout_secs: limit.as_secs(),
                })?,
            None => child.wait_with_output().await,
        };
        let output_data = waited.map_err(|source| EngineError::Launch {
            program: self.ffmpeg_path.clone(),
            source,
        })?;
        debug!("ffmpeg finished in {:.1}s", start_time.elapsed().as_secs_f64());

        if !output_data.status.success() {
            return Err(EngineError::Exited {
                code: output_data.status.code(),
                stderr: String::from_utf8_lossy(&output_data.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(args: &[String], flag: &str) -> Option<usize> {
        args.iter().position(|a| a == flag)
    }

    #[test]
    fn test_quality_level_clamps_at_worst() {
        assert_eq!(QualityLevel::new(12), QualityLevel::WORST);
        assert_eq!(QualityLevel::new(8).degrade(2).value(), 9);
        assert_eq!(QualityLevel::new(4).degrade(2).value(), 6);
    }

    #[test]
    fn test_vbr_args() {
        let args = FfmpegEncoder::build_args(
            Path::new("in.wav"),
            Path::new("out.mp3"),
            &EncodeAttempt::vbr(QualityLevel::new(4)),
        );

        let q = position(&args, "-q:a").unwrap();
        assert_eq!(args[q + 1], "4");
        assert!(position(&args, "-y").is_some());
        assert!(position(&args, "-b:a").is_none());
        assert!(position(&args, "-ac").is_none());
        assert!(position(&args, "-t").is_none());
        assert_eq!(args.last().unwrap(), "out.mp3");

        let input = position(&args, "-i").unwrap();
        assert_eq!(args[input + 1], "in.wav");
    }

    #[test]
    fn test_duration_cap_is_an_output_option() {
        let attempt = EncodeAttempt::vbr(QualityLevel::new(8)).with_duration_cap(12.5);
        let args = FfmpegEncoder::build_args(Path::new("in.flac"), Path::new("out.mp3"), &attempt);

        let input = position(&args, "-i").unwrap();
        let cap = position(&args, "-t").unwrap();
        assert!(cap > input);
        assert_eq!(args[cap + 1], "12.500");
    }

    #[test]
    fn test_cbr_mono_args() {
        let attempt = EncodeAttempt::cbr(53).with_channels(1);
        let args = FfmpegEncoder::build_args(Path::new("in.wav"), Path::new("out.mp3"), &attempt);

        let b = position(&args, "-b:a").unwrap();
        assert_eq!(args[b + 1], "53k");
        let ac = position(&args, "-ac").unwrap();
        assert_eq!(args[ac + 1], "1");
        assert!(position(&args, "-q:a").is_none());
    }

    #[test]
    fn test_describe() {
        let attempt = EncodeAttempt::vbr(QualityLevel::new(7)).with_duration_cap(3.0);
        assert_eq!(attempt.describe(), "VBR q:a 7, cut at 3.00s");
        assert_eq!(EncodeAttempt::cbr(8).with_channels(1).describe(), "CBR 8k, 1 channel(s)");
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg-binary");
        let result = encoder
            .encode(
                Path::new("in.wav"),
                Path::new("out.mp3"),
                &EncodeAttempt::vbr(QualityLevel::new(4)),
            )
            .await;
        assert!(matches!(result, Err(EngineError::Launch { .. })));
    }
}
