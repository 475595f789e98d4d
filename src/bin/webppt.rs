use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use webppt_tools::{
    compiler, extract_document, render_snapshot, Document, FidelityMode, RenderConfig,
    RenderConfigBuilder,
};

#[derive(Parser)]
#[command(
    name = "webppt",
    version,
    about = "Turn rendered HTML slides into editable deck primitives"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a document dump and write the deck call sequence
    Render {
        /// Path to the document dump (JSON)
        snapshot: PathBuf,

        /// Write the call sequence to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Fidelity mode: minimal, smart, maximal (or 1, 2, 3)
        #[arg(short, long, value_name = "MODE", value_parser = parse_mode)]
        mode: Option<FidelityMode>,

        /// JSON configuration file; flags override its values
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Pixels captured around isolated elements
        #[arg(long, value_name = "PX")]
        padding: Option<f64>,

        /// Width multiplier for single-line text boxes
        #[arg(long, value_name = "FACTOR")]
        text_width_factor: Option<f64>,
    },
    /// Print the extracted slide model of a document dump
    Extract {
        /// Path to the document dump (JSON)
        snapshot: PathBuf,
    },
    /// Compile slide markup to an HTML page
    Compile {
        /// Path to the markup file
        input: PathBuf,

        /// Output path; defaults to the input with an `.html` extension
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn parse_mode(value: &str) -> std::result::Result<FidelityMode, String> {
    value.parse().map_err(|e: webppt_tools::DeckError| e.to_string())
}

fn load_config(
    path: Option<PathBuf>,
    mode: Option<FidelityMode>,
    padding: Option<f64>,
    text_width_factor: Option<f64>,
) -> Result<RenderConfig> {
    let base = match path {
        Some(path) => RenderConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    let mut builder = RenderConfigBuilder::from_config(base);
    if let Some(mode) = mode {
        builder = builder.set_mode(mode);
    }
    if let Some(padding) = padding {
        builder = builder.set_capture_padding(padding);
    }
    if let Some(factor) = text_width_factor {
        builder = builder.set_text_width_factor(factor);
    }
    Ok(builder.build()?)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_or_print(output: Option<PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match Cli::parse().command {
        Commands::Render {
            snapshot,
            output,
            mode,
            config,
            padding,
            text_width_factor,
        } => {
            let config = load_config(config, mode, padding, text_width_factor)?;
            info!("Processing {} with {} mode", snapshot.display(), config.mode);
            let recorder = render_snapshot(&read(&snapshot)?, &config)
                .with_context(|| format!("Failed to render {}", snapshot.display()))?;
            write_or_print(output, &recorder.to_json()?)
        }
        Commands::Extract { snapshot } => {
            let mut document = Document::from_json(&read(&snapshot)?)?;
            let slides = extract_document(&mut document)?;
            println!("{}", serde_json::to_string_pretty(&slides)?);
            Ok(())
        }
        Commands::Compile { input, output } => {
            let html = compiler::compile(&read(&input)?)
                .with_context(|| format!("Failed to compile {}", input.display()))?;
            let output = output.unwrap_or_else(|| input.with_extension("html"));
            write_or_print(Some(output), &html)
        }
    }
}
