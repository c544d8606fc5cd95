//! pxdgen CLI
//!
//! Translates the Slurm C headers into Cython `.pxi` declaration files.

use anyhow::{Context, Result};
use clap::Parser;
use pxdgen_codegen::Generator;
use pxdgen_core::config::Config;
use pxdgen_core::{OutputMode, OutputTarget};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pxdgen")]
#[command(author, version, about = "Generate Cython declarations from the Slurm headers", long_about = None)]
struct Cli {
    /// Directory containing the Slurm headers
    #[arg(short = 'D', long, value_name = "DIR")]
    slurm_header_dir: PathBuf,

    /// Only list the macros that could not be translated
    #[arg(short = 'u', long)]
    show_unparsed_macros: bool,

    /// Only print the translated macros as Python constants
    #[arg(short = 'c', long)]
    generate_python_const: bool,

    /// Output directory for the generated files [default: pyslurm/slurm]
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Print everything to stdout instead of writing files
    #[arg(short, long)]
    stdout: bool,

    /// Include directory for the C preprocessor (repeatable)
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Configuration file (.json, .yaml or .yml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Parse headers without running them through clang
    #[arg(long)]
    no_clang: bool,

    /// Translate headers in parallel
    #[arg(short = 'j', long)]
    parallel: bool,

    /// Verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Headers to translate [default: slurm_errno.h slurm.h slurmdb.h]
    #[arg(value_name = "HEADER")]
    headers: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli)?;
    debug!("Configuration: {:?}", config);

    let generator = Generator::new(config)?;
    let summary = generator.run(std::io::stdout().lock())?;

    info!(
        "Translated {} headers, wrote {} files",
        summary.headers,
        summary.written.len()
    );
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Layer the command line over the configuration file
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let settings = &mut config.generator;

    settings.header_dir = cli.slurm_header_dir.clone();

    if !cli.headers.is_empty() {
        settings.headers = cli.headers.clone();
    }

    if cli.show_unparsed_macros {
        if cli.generate_python_const {
            warn!("Both -u and -c given, only listing unparsed macros");
        }
        settings.mode = OutputMode::Diagnostic;
    } else if cli.generate_python_const {
        settings.mode = OutputMode::Constant;
    }

    if cli.stdout {
        settings.target = OutputTarget::Stream;
    } else if let Some(dir) = &cli.output_dir {
        settings.target = OutputTarget::Files(dir.clone());
    }

    if !cli.include_dirs.is_empty() {
        settings.include_dirs = cli.include_dirs.clone();
    } else if settings.include_dirs.is_empty() {
        if let Some(paths) = std::env::var_os("C_INCLUDE_PATH") {
            settings.include_dirs = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
    }

    if let Ok(epoch) = std::env::var("SOURCE_DATE_EPOCH") {
        let epoch = epoch
            .trim()
            .parse()
            .with_context(|| format!("Invalid SOURCE_DATE_EPOCH {:?}", epoch))?;
        settings.source_date_epoch = Some(epoch);
    }

    if cli.parallel {
        settings.parallel = true;
    }

    if cli.no_clang {
        config.structural.use_clang = false;
    }

    Ok(config)
}
