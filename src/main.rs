//! # mp3-fit - Main Entry Point
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del logging con `tracing` (su stderr)
//! - Caricamento della configurazione e override da command line
//! - Conversione singola oppure loop interattivo se manca l'input
//!
//! ## Esempio di utilizzo:
//! ```bash
//! mp3-fit song.flac --target-kb 250 --verbose
//! mp3-fit                      # interattivo
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use audio_size_fitter::file_manager::FileManager;
use audio_size_fitter::progress::ConsoleReporter;
use audio_size_fitter::tool_resolver::ToolPathResolver;
use audio_size_fitter::{interactive, Config, Converter, ReportMode};

#[derive(Parser)]
#[command(name = "mp3-fit")]
#[command(about = "Convert audio to an MP3 no larger than a size budget")]
struct Args {
    /// Audio file to convert (prompts interactively when omitted)
    input: Option<PathBuf>,

    /// Output MP3 path (default: <input dir>/<stem>_compressed.mp3)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Size budget in KB
    #[arg(short, long)]
    target_kb: Option<u64>,

    /// Per-attempt encoder timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary
    #[arg(long)]
    ffprobe: Option<PathBuf>,

    /// Config file (default: <config dir>/mp3-fit/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit JSON events on stdout
    #[arg(long)]
    json: bool,

    /// Print which tools were found and exit
    #[arg(long)]
    check_tools: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply_to(&self, config: &mut Config) {
        if let Some(target_kb) = self.target_kb {
            config.target_size_kb = target_kb;
        }
        if let Some(timeout) = self.timeout {
            config.encode_timeout_secs = Some(timeout);
        }
        if self.ffmpeg.is_some() {
            config.ffmpeg_path = self.ffmpeg.clone();
        }
        if self.ffprobe.is_some() {
            config.ffprobe_path = self.ffprobe.clone();
        }
        if self.json {
            config.json_output = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = match config_path {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    args.apply_to(&mut config);
    config.validate()?;
    debug!("Effective config: {:?}", config);

    if args.check_tools {
        print!("{}", ToolPathResolver::from_config(&config).get_tools_report());
        return Ok(ExitCode::SUCCESS);
    }

    let report_mode = if config.json_output {
        ReportMode::Json
    } else {
        ReportMode::Console
    };
    let converter = Converter::from_config(&config)?.with_report_mode(report_mode);

    let input = match args.input {
        Some(input) => input,
        None => {
            interactive::run(&converter, &config).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let output = args
        .output
        .unwrap_or_else(|| FileManager::default_output_path(&input, &config.output_suffix));

    let result = converter.convert(&input, &output, config.target_size_kb).await?;
    if report_mode == ReportMode::Console {
        eprintln!("{}", ConsoleReporter::format_summary(&result));
    }
    info!("Finished with {} bytes at {}", result.final_size, result.output_path.display());

    Ok(if result.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
