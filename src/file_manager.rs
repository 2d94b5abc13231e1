//! # File Management Module
//!
//! Operazioni sui path e sulle dimensioni dei file.
//!
//! ## Responsabilità:
//! - Calcolo del path di output di default (`<stem>_compressed.mp3`
//!   nella stessa directory dell'input)
//! - Normalizzazione dei path incollati dall'utente (virgolette)
//! - Formattazione human-readable delle dimensioni
//!
//! ## Esempio:
//! ```rust,ignore
//! let output = FileManager::default_output_path(Path::new("/music/song.flac"), "_compressed");
//! assert_eq!(output, PathBuf::from("/music/song_compressed.mp3"));
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};

pub struct FileManager;

impl FileManager {
    /// Size of a file in bytes
    pub async fn file_size(path: &Path) -> Result<u64> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read metadata for {}: {}", path.display(), e))?;
        Ok(metadata.len())
    }

    /// Directory that receives the output, the current one when `input` has none
    pub fn output_dir(input: &Path) -> PathBuf {
        match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// `<input dir>/<input stem><suffix>.mp3`
    pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        Self::output_dir(input).join(format!("{}{}.mp3", stem, suffix))
    }

    /// Output next to `input` named `name`, or the default name when `name` is blank
    pub fn output_path_for_name(input: &Path, name: &str, suffix: &str) -> PathBuf {
        let name = name.trim();
        if name.is_empty() {
            return Self::default_output_path(input, suffix);
        }
        Self::output_dir(input).join(Self::ensure_mp3_extension(name))
    }

    /// Appends `.mp3` unless the name already ends with it (any case)
    pub fn ensure_mp3_extension(name: &str) -> String {
        if name.to_lowercase().ends_with(".mp3") {
            name.to_string()
        } else {
            format!("{}.mp3", name)
        }
    }

    /// Removes one pair of matching surrounding quotes
    pub fn strip_quotes(raw: &str) -> &str {
        let trimmed = raw.trim();
        for quote in ['"', '\''] {
            if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
                return &trimmed[1..trimmed.len() - 1];
            }
        }
        trimmed
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
