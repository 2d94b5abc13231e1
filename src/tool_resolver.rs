//! # Tool Path Resolver
//!
//! Trova i binari esterni (`ffmpeg`, `ffprobe`) in quest'ordine:
//! - Path esplicito dalla configurazione o dalla command line
//! - Directory indicata dalla variabile d'ambiente `TOOLS_DIR`
//! - PATH di sistema

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Config;

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

/// Tool path resolver for the encoder binaries
#[derive(Debug, Clone, Default)]
pub struct ToolPathResolver {
    ffmpeg_override: Option<PathBuf>,
    ffprobe_override: Option<PathBuf>,
    tools_dir: Option<PathBuf>,
}

impl ToolPathResolver {
    pub fn new() -> Self {
        Self {
            tools_dir: env::var_os("TOOLS_DIR").map(PathBuf::from),
            ..Default::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            ffmpeg_override: config.ffmpeg_path.clone(),
            ffprobe_override: config.ffprobe_path.clone(),
            ..Self::new()
        }
    }

    pub fn with_tools_dir(mut self, tools_dir: Option<PathBuf>) -> Self {
        self.tools_dir = tools_dir;
        self
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        let explicit = match tool_name {
            FFMPEG => self.ffmpeg_override.as_ref(),
            FFPROBE => self.ffprobe_override.as_ref(),
            _ => None,
        };
        if let Some(path) = explicit {
            debug!("Using configured {}: {:?}", tool_name, path);
            return path.is_file().then(|| path.clone());
        }

        if let Some(ref tools_dir) = self.tools_dir {
            let bundled = tools_dir.join(executable_name(tool_name));
            if bundled.is_file() {
                debug!("Using {} from TOOLS_DIR: {:?}", tool_name, bundled);
                return Some(bundled);
            }
            debug!("{} not in TOOLS_DIR {:?}", tool_name, tools_dir);
        }

        let found = find_in_system_path(tool_name);
        if found.is_none() {
            warn!("Tool not found: {}", tool_name);
        }
        found
    }

    pub fn ffmpeg(&self) -> Option<PathBuf> {
        self.resolve_tool(FFMPEG)
    }

    pub fn ffprobe(&self) -> Option<PathBuf> {
        self.resolve_tool(FFPROBE)
    }

    /// Check if a tool is available and provide installation instructions if not
    pub fn check_tool_with_instructions(&self, tool_name: &str) -> Result<PathBuf, String> {
        self.resolve_tool(tool_name).ok_or_else(|| {
            format!(
                "Tool '{}' not found.\nInstall FFmpeg:\n\
                 - macOS: brew install ffmpeg\n\
                 - Ubuntu/Debian: sudo apt install ffmpeg\n\
                 - Arch: sudo pacman -S ffmpeg\n\
                 - Windows: winget install ffmpeg\n\
                 or download from https://ffmpeg.org/download.html",
                tool_name
            )
        })
    }

    /// Get a report of tool availability
    pub fn get_tools_report(&self) -> String {
        let mut report = String::from("Tool availability:\n");
        for (tool, role) in [(FFMPEG, "required, encoder"), (FFPROBE, "optional, media info")] {
            match self.resolve_tool(tool) {
                Some(path) => {
                    report.push_str(&format!("  ✅ {} ({}) -> {}\n", tool, role, path.display()))
                }
                None => report.push_str(&format!("  ❌ {} ({}) not found\n", tool, role)),
            }
        }
        if let Some(ref dir) = self.tools_dir {
            report.push_str(&format!("TOOLS_DIR: {}\n", dir.display()));
        }
        report
    }
}

fn executable_name(tool_name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", tool_name)
    } else {
        tool_name.to_string()
    }
}

/// Find tool in system PATH
fn find_in_system_path(tool_name: &str) -> Option<PathBuf> {
    let name = executable_name(tool_name);
    env::split_paths(&env::var_os("PATH")?)
        .map(|dir| dir.join(&name))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_wins() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("my-ffmpeg");
        std::fs::write(&fake, b"").unwrap();

        let config = Config {
            ffmpeg_path: Some(fake.clone()),
            ..Default::default()
        };
        let resolver = ToolPathResolver::from_config(&config);
        assert_eq!(resolver.ffmpeg(), Some(fake));
    }

    #[test]
    fn test_missing_explicit_path_is_not_replaced() {
        let config = Config {
            ffprobe_path: Some(PathBuf::from("/nonexistent/ffprobe")),
            ..Default::default()
        };
        let resolver = ToolPathResolver::from_config(&config);
        assert_eq!(resolver.ffprobe(), None);
    }

    #[test]
    fn test_tools_dir_lookup() {
        let dir = TempDir::new().unwrap();
        let tool = dir.path().join(executable_name(FFPROBE));
        std::fs::write(&tool, b"").unwrap();

        let resolver = ToolPathResolver::default().with_tools_dir(Some(dir.path().to_path_buf()));
        assert_eq!(resolver.ffprobe(), Some(tool));
    }

    #[test]
    fn test_unknown_tool_reports_instructions() {
        let resolver = ToolPathResolver::default();
        let message = resolver
            .check_tool_with_instructions("definitely-not-a-real-tool-name")
            .unwrap_err();
        assert!(message.contains("definitely-not-a-real-tool-name"));
        assert!(message.contains("ffmpeg.org"));
    }

    #[test]
    fn test_tools_report_lists_both_tools() {
        let report = ToolPathResolver::default().get_tools_report();
        assert!(report.contains(FFMPEG));
        assert!(report.contains(FFPROBE));
    }
}
