//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con i parametri operativi della conversione
//! - Validazione dei parametri di input
//! - Caricamento/salvataggio da/verso file JSON
//! - Valori di default sensati
//!
//! ## Parametri di configurazione:
//! - `target_size_kb`: Budget del file MP3 in KB (default: 100)
//! - `encode_timeout_secs`: Timeout per singola invocazione (default: 600)
//! - `ffmpeg_path` / `ffprobe_path`: Binari espliciti (default: ricerca nel PATH)
//! - `output_suffix`: Suffisso del nome di output di default (default: "_compressed")
//! - `json_output`: Eventi JSON su stdout (default: false)
//!
//! I parametri dell'algoritmo di ricerca (qualità iniziale, numero di
//! tentativi, margini) non sono configurabili: vivono in `search::policy`.
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     target_size_kb: 250,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for audio conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size budget of the MP3 in KiB
    pub target_size_kb: u64,
    /// Wall-clock limit per encoder invocation (None = unlimited)
    pub encode_timeout_secs: Option<u64>,
    /// Explicit ffmpeg binary
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe binary
    pub ffprobe_path: Option<PathBuf>,
    /// Appended to the input stem when no output name is given
    pub output_suffix: String,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_size_kb: 100,
            encode_timeout_secs: Some(600),
            ffmpeg_path: None,
            ffprobe_path: None,
            output_suffix: "_compressed".to_string(),
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.target_size_kb == 0 {
            return Err(anyhow::anyhow!("Target size must be greater than 0 KB"));
        }

        if self.encode_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("Encode timeout must be greater than 0 seconds"));
        }

        if self.output_suffix.is_empty() {
            return Err(anyhow::anyhow!("Output suffix must not be empty"));
        }

        if self.output_suffix.contains(['/', '\\']) {
            return Err(anyhow::anyhow!("Output suffix must not contain path separators"));
        }

        for path in [&self.ffmpeg_path, &self.ffprobe_path].into_iter().flatten() {
            if !path.is_file() {
                return Err(anyhow::anyhow!("Tool path is not a file: {}", path.display()));
            }
        }

        Ok(())
    }

    pub fn encode_timeout(&self) -> Option<Duration> {
        self.encode_timeout_secs.map(Duration::from_secs)
    }

    /// Default config file location (`<config dir>/mp3-fit/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mp3-fit").join("config.json"))
    }

    /// Load configuration from file, falling back to defaults when missing
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
