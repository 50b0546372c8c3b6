//! # Phone List CLI (`phonelist`)
//!
//! Runs the contact-list pipeline on local files or serves it over HTTP.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `phonelist serve` | Start the HTTP upload server |
//! | `phonelist process <file>` | Clean a spreadsheet and write the zip archive |
//! | `phonelist inspect <file>` | Show detected columns and contact counts |
//!
//! ## Examples
//!
//! ```bash
//! # Split into files of 200 contacts each
//! phonelist process contatos.xlsx --chunk-size 200
//!
//! # One spreadsheet with every contact, duplicates kept
//! phonelist process contatos.csv --grouped --keep-duplicates -o lista.zip
//!
//! # Serve POST /api/upload with settings from a config file
//! phonelist --config ./config/phonelist.toml serve
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use phone_list::config::{self, Config};
use phone_list::models::{DownloadType, ProcessOptions};
use phone_list::{pipeline, server, stats};

/// Phone List: detects phone and name columns in contact spreadsheets,
/// normalizes the numbers and exports them as zipped `.xlsx` files.
#[derive(Parser)]
#[command(name = "phonelist", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/phonelist.toml`. Built-in defaults are used
    /// when the file does not exist.
    #[arg(long, global = true, default_value = "./config/phonelist.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP upload server.
    ///
    /// Binds to `[server].bind` and serves `POST /api/upload` and `GET /health`.
    Serve,

    /// Clean a local spreadsheet and write the resulting zip archive.
    Process {
        /// Input spreadsheet (`.xlsx`, `.xls`, `.ods` or `.csv`).
        input: PathBuf,

        /// Where to write the archive. Defaults to the generated archive
        /// name in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep every row, even when its phone was already seen.
        #[arg(long)]
        keep_duplicates: bool,

        /// Write a single spreadsheet instead of chunked files.
        #[arg(long)]
        grouped: bool,

        /// Contacts per spreadsheet (1-1000). Defaults to `[processing].chunk_size`.
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Show the detected header, chosen columns and contact counts.
    Inspect {
        /// Input spreadsheet.
        input: PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> anyhow::Result<(Vec<u8>, Option<String>)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read input: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    Ok((bytes, name))
}

fn resolve_options(
    cfg: &Config,
    keep_duplicates: bool,
    grouped: bool,
    chunk_size: Option<usize>,
) -> ProcessOptions {
    let mut options = cfg.processing.options();
    if keep_duplicates {
        options.remove_duplicates = false;
    }
    if grouped {
        options.download_type = DownloadType::Grouped;
    }
    if let Some(size) = chunk_size {
        options.chunk_size = size;
    }
    options
}

fn run_process(
    input: &Path,
    output: Option<PathBuf>,
    options: ProcessOptions,
) -> anyhow::Result<()> {
    let (bytes, name) = read_input(input)?;
    let archive = pipeline::process_upload(&bytes, name.as_deref(), &options)
        .map_err(|e| anyhow::anyhow!("{} ({})", e.public_message(), e))?;

    let output = output.unwrap_or_else(|| PathBuf::from(&archive.file_name));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&output, &archive.bytes)
        .with_context(|| format!("Failed to write archive: {}", output.display()))?;

    print!("{}", stats::render_report(&archive.statistics));
    println!();
    println!("  Archive:  {}", output.display());
    for entry in &archive.entries {
        println!("    {}", entry);
    }
    Ok(())
}

fn run_inspect(cfg: &Config, input: &Path) -> anyhow::Result<()> {
    let (bytes, name) = read_input(input)?;
    let found = pipeline::inspect_upload(&bytes, name.as_deref(), &cfg.processing.options())
        .map_err(|e| anyhow::anyhow!("{} ({})", e.public_message(), e))?;

    println!("Header:");
    for (index, label) in found.header.iter().enumerate() {
        let mut marks = Vec::new();
        if index == found.number_column.index {
            marks.push(format!("phone via {}", found.number_column.stage.as_str()));
        }
        if index == found.name_column.index {
            marks.push(format!("name via {}", found.name_column.stage.as_str()));
        }
        let suffix = if marks.is_empty() {
            String::new()
        } else {
            format!("  <- {}", marks.join(", "))
        };
        println!("  [{}] {:?}{}", index, label, suffix);
    }
    println!();
    println!("  Rows read:       {}", found.rows_read);
    println!("  Valid contacts:  {}", found.contacts.len());
    println!("  Discarded:       {}", found.discarded);
    println!("  Duplicates:      {}", found.duplicates);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Process {
            input,
            output,
            keep_duplicates,
            grouped,
            chunk_size,
        } => {
            let options = resolve_options(&cfg, keep_duplicates, grouped, chunk_size);
            run_process(&input, output, options)?;
        }
        Commands::Inspect { input } => {
            run_inspect(&cfg, &input)?;
        }
    }

    Ok(())
}
