// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use autocaption::app_config::{Config, LogLevel};
use autocaption::app_controller::{Controller, GenerateOptions, ReviewMode};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcribe, translate and caption a video
    Generate {
        /// Input video file
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        /// Pause after generation so the subtitle file can be edited
        #[arg(short, long)]
        review: bool,

        /// Write the subtitle file only
        #[arg(long)]
        no_embed: bool,

        /// Output directory (defaults to the video's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Embed an existing SRT file into a video
    Embed {
        /// Input video file
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        /// Subtitle file to embed
        #[arg(value_name = "SRT")]
        srt: PathBuf,

        /// Output directory (defaults to the video's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Validate an SRT file and print a summary
    Inspect {
        /// Subtitle file to check
        #[arg(value_name = "SRT")]
        srt: PathBuf,
    },

    /// List models offered by the configured service
    Models,

    /// Generate shell completions for autocaption
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// autocaption - automatic bilingual subtitles for videos
#[derive(Parser, Debug)]
#[command(name = "autocaption")]
#[command(version)]
#[command(about = "Speech-to-text subtitles with optional translation and embedding")]
#[command(long_about = "autocaption extracts the audio of a video, transcribes it, translates each caption and \
burns or muxes the result back into the video.

EXAMPLES:
    autocaption generate talk.mp4                  # Bilingual subtitles burned into talk_with_subtitles.mp4
    autocaption -t none generate talk.mp4          # Transcription only
    autocaption generate --review talk.mp4         # Edit the SRT before embedding
    autocaption generate --no-embed talk.mp4       # Only write talk_subtitles.srt
    autocaption embed talk.mp4 fixed.srt           # Embed an existing subtitle file
    autocaption inspect talk_subtitles.srt         # Validate and summarize
    autocaption completions bash > autocaption.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// API key for the transcription and translation service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Spoken language code, or 'auto'
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Translation target code (e.g. 'zh', 'fr'), or 'none'
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Chat model used for translation
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Show both languages in each caption
    #[arg(long, global = true)]
    bilingual: Option<bool>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set via set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "autocaption", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    run_command(&controller, cli.command).await
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(api_key) = &cli.api_key {
        config.provider.api_key = api_key.clone();
    }
    if let Some(source_lang) = &cli.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &cli.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(model) = &cli.model {
        config.provider.translation_model = model.clone();
    }
    if let Some(bilingual) = cli.bilingual {
        config.bilingual = bilingual;
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_command(controller: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            video,
            review,
            no_embed,
            output_dir,
            force_overwrite,
        } => {
            let options = GenerateOptions {
                output_dir: output_dir.unwrap_or_else(|| parent_dir(&video)),
                review: if review { ReviewMode::Interactive } else { ReviewMode::Skip },
                embed: !no_embed,
                force_overwrite,
            };
            if let Some(report) = controller.generate(&video, &options).await? {
                info!("Success: {:?}", report.subtitle_path);
                if let Some(video_path) = report.video_path {
                    info!("Success: {:?}", video_path);
                }
            }
        }
        Commands::Embed { video, srt, output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| parent_dir(&video));
            let report = controller.embed(&video, &srt, &output_dir).await?;
            if let Some(video_path) = report.video_path {
                info!("Success: {:?}", video_path);
            }
        }
        Commands::Inspect { srt } => {
            let summary = controller.inspect(&srt)?;
            let scripts: Vec<&str> = summary.scripts.iter().map(|s| s.name()).collect();
            println!("Segments:         {}", summary.segment_count);
            println!("Duration:         {}", summary.formatted_duration);
            println!("Average segment:  {} ms", summary.average_segment_ms);
            println!("Scripts:          {}", if scripts.is_empty() { "-".to_string() } else { scripts.join(", ") });
        }
        Commands::Models => {
            let catalog = controller.list_models().await?;
            println!("Translation models:");
            for model in &catalog.chat {
                println!("  {}", model);
            }
            println!("Transcription models:");
            for model in &catalog.whisper {
                println!("  {}", model);
            }
        }
        Commands::Completions { .. } => {}
    }
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().unwrap_or(Path::new(".")).to_path_buf()
}
