use clap::{Parser, Subcommand};
use sheet2midi::{validate_input, Config, SheetToMidi};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sheet Music to MIDI Converter
#[derive(Parser)]
#[command(name = "sheet2midi")]
#[command(about = "Convert a sheet music image to MIDI and annotate it")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Custom configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image file without the file picker.
    ///
    /// Running with no subcommand opens the file picker instead; that and
    /// `--annotate` need a build with `--features gui`.
    Convert {
        /// Input sheet music image
        input: PathBuf,

        /// Output MIDI file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Note template image
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Write QA artifacts to this directory
        #[arg(long)]
        qa_dir: Option<PathBuf>,

        /// Open the annotation window after converting (needs `--features gui`)
        #[arg(long)]
        annotate: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Quiet output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        #[arg(value_name = "CONFIG")]
        path: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn init_tracing(default_level: &str) {
    let directives = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("sheet2midi={}", default_level));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::builder().parse_lossy(directives))
        .init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(config_path) => sheet2midi::config::load_config(config_path)?,
        None => Config::default(),
    })
}

#[cfg(feature = "gui")]
fn annotate(image: &Path, config: &Config) -> anyhow::Result<()> {
    let annotations = sheet2midi::gui::run_overlay(image, &config.annotation)?;
    tracing::info!(count = annotations.len(), "Annotations kept for this session only");
    Ok(())
}

#[cfg(not(feature = "gui"))]
fn annotate(_image: &Path, _config: &Config) -> anyhow::Result<()> {
    anyhow::bail!("the annotation window requires building with `--features gui`")
}

#[cfg(feature = "gui")]
fn run_interactive(config: Config) -> anyhow::Result<()> {
    // Template first so a missing file fails before any dialog opens
    let processor = SheetToMidi::new(config)?;

    let mut picker = sheet2midi::gui::FltkImagePicker::default();
    let Some(report) = processor.process_picked(&mut picker)? else {
        return Ok(());
    };

    annotate(&report.input_path, processor.config())
}

#[cfg(not(feature = "gui"))]
fn run_interactive(_config: Config) -> anyhow::Result<()> {
    anyhow::bail!(
        "interactive mode requires building with `--features gui`; use `sheet2midi convert <INPUT>`"
    )
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            init_tracing("info");
            let config = load_config(cli.config)?;
            run_interactive(config)?;
        }
        Some(Commands::Convert {
            input,
            output,
            template,
            qa_dir,
            annotate: open_overlay,
            verbose,
            quiet,
        }) => {
            if verbose && quiet {
                anyhow::bail!("Cannot specify both --verbose and --quiet");
            }
            init_tracing(if verbose {
                "debug"
            } else if quiet {
                "warn"
            } else {
                "info"
            });

            // Load configuration and apply overrides
            let mut config = load_config(cli.config)?;
            if let Some(output) = output {
                config.midi.output_path = output;
            }
            if let Some(template) = template {
                config.detection.template_path = template;
            }
            if let Some(qa_dir) = qa_dir {
                config.qa.generate_artifacts = true;
                config.qa.output_dir = qa_dir;
            }

            // Validate input
            validate_input(&input, &config)?;

            // Create processor
            let processor = SheetToMidi::new(config)?;

            if !quiet {
                println!("Processing {}...", input.display());
            }

            let report = processor.process(&input)?;

            if open_overlay {
                annotate(&report.input_path, processor.config())?;
            }
        }
        Some(Commands::ValidateConfig { path }) => {
            let config = sheet2midi::config::load_config(path)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Some(Commands::ShowConfig) => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}
