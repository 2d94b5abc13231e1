//! # Interactive Driver
//!
//! Loop interattivo: chiede il file di input e il nome di output, converte,
//! ricomincia. `q` per uscire.

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;
use crate::converter::Converter;
use crate::file_manager::FileManager;
use crate::progress::ConsoleReporter;

/// What the user typed at the input prompt
#[derive(Debug, PartialEq)]
pub enum InputChoice {
    Quit,
    Missing(PathBuf),
    File(PathBuf),
}

/// Interprets the raw input prompt answer
pub fn parse_input_choice(raw: &str) -> InputChoice {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("q") {
        return InputChoice::Quit;
    }
    let path = PathBuf::from(FileManager::strip_quotes(trimmed));
    if path.exists() {
        InputChoice::File(path)
    } else {
        InputChoice::Missing(path)
    }
}

pub async fn run(converter: &Converter, config: &Config) -> Result<()> {
    eprintln!(
        "=== Audio to MP3 converter (output no larger than {} KB) ===",
        config.target_size_kb
    );
    let theme = ColorfulTheme::default();

    loop {
        eprintln!("\n{}", "=".repeat(50));

        let raw: String = Input::with_theme(&theme)
            .with_prompt("Audio file path (or 'q' to quit)")
            .interact_text()?;

        let input = match parse_input_choice(&raw) {
            InputChoice::Quit => break,
            InputChoice::Missing(path) => {
                eprintln!("❌ File '{}' does not exist", path.display());
                continue;
            }
            InputChoice::File(path) => path,
        };

        let name: String = Input::with_theme(&theme)
            .with_prompt("Output MP3 name (empty for default)")
            .allow_empty(true)
            .interact_text()?;
        let output = FileManager::output_path_for_name(&input, &name, &config.output_suffix);

        convert_one(converter, &input, &output, config.target_size_kb).await;
    }

    info!("Interactive session finished");
    Ok(())
}

async fn convert_one(converter: &Converter, input: &Path, output: &Path, target_size_kb: u64) {
    eprintln!("🎵 Processing: {}", input.display());
    eprintln!("💾 Output: {}", output.display());

    match converter.convert(input, output, target_size_kb).await {
        Ok(result) => eprintln!("{}", ConsoleReporter::format_summary(&result)),
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("Check that the input is a valid audio file.");
        }
    }
}
