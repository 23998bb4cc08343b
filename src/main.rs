use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use openapi_model_gen::error::{Error, Result};
use openapi_model_gen::schema::{SpecDocument, SpecFormat};
use openapi_model_gen::settings::{Settings, load_settings};

/// Generate normalizr entity models from OpenAPI schemas.
///
/// Reads an OpenAPI 3 or Swagger 2 document and writes one base module and
/// one hand-editable override module per tagged model, plus an index.
#[derive(Parser)]
#[command(name = "openapi-model-gen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Detect from the root keys.
    Auto,
    /// Definitions under `components.schemas`.
    Openapi3,
    /// Definitions under `definitions`, or the root itself.
    Swagger2,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a spec document and store it locally.
    #[cfg(feature = "download")]
    DownloadSpec {
        /// URL of the spec document.
        #[arg(long)]
        url: String,

        /// File to write the document to.
        #[arg(long)]
        output: PathBuf,
    },

    /// Generate model modules from a spec document.
    Generate {
        /// Spec document (.json, .yaml or .yml).
        #[arg(long, env = "OPENAPI_MODEL_GEN_SPEC")]
        spec: PathBuf,

        /// Output directory for generated modules.
        #[arg(long, env = "OPENAPI_MODEL_GEN_OUTPUT_DIR")]
        output_dir: PathBuf,

        /// JSON settings file overriding marker keys and naming.
        #[arg(long)]
        config: Option<PathBuf>,

        /// How model definitions are wrapped in the document.
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,

        /// Suppress non-error output.
        #[arg(long, short)]
        quiet: bool,
    },

    /// Print the descriptor of one model as JSON.
    Describe {
        /// Spec document (.json, .yaml or .yml).
        #[arg(long, env = "OPENAPI_MODEL_GEN_SPEC")]
        spec: PathBuf,

        /// Model name (marker value or definition key).
        #[arg(long)]
        model: String,

        /// JSON settings file overriding marker keys and naming.
        #[arg(long)]
        config: Option<PathBuf>,

        /// How model definitions are wrapped in the document.
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let quiet = matches!(cli.command, Commands::Generate { quiet: true, .. });
    let default_level = if quiet { "error" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        #[cfg(feature = "download")]
        Commands::DownloadSpec { url, output } => {
            let rt = tokio::runtime::Runtime::new().map_err(|e| Error::Download(e.to_string()))?;
            rt.block_on(openapi_model_gen::schema::download_spec(&url, &output))?;
            tracing::info!(path = %output.display(), "spec saved");
        }

        Commands::Generate {
            spec,
            output_dir,
            config,
            format,
            quiet: _,
        } => {
            let settings = settings_from(config.as_deref())?;
            let doc = open_spec(&spec, format)?;
            let stats = openapi_model_gen::codegen::generate(&doc, &settings, &output_dir)?;
            tracing::info!(
                overrides_created = stats.overrides_created,
                overrides_preserved = stats.overrides_preserved,
                ignored = stats.definitions_ignored,
                "Generated {} models into {}",
                stats.models_generated,
                output_dir.display()
            );
            if stats.models_skipped > 0 {
                tracing::warn!("Skipped {} models", stats.models_skipped);
            }
        }

        Commands::Describe {
            spec,
            model,
            config,
            format,
        } => {
            let settings = settings_from(config.as_deref())?;
            let doc = open_spec(&spec, format)?;
            let descriptor = openapi_model_gen::codegen::describe(&doc, &settings, &model)?
                .ok_or_else(|| Error::Spec(format!("no generatable model named '{model}'")))?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
    }

    Ok(())
}

fn settings_from(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => load_settings(path),
        None => Ok(Settings::default()),
    }
}

fn open_spec(path: &Path, format: FormatArg) -> Result<SpecDocument> {
    tracing::info!(path = %path.display(), "loading spec");
    let doc = openapi_model_gen::schema::load_spec(path)?;
    Ok(match format {
        FormatArg::Auto => doc,
        FormatArg::Openapi3 => SpecDocument::with_format(doc.into_root(), SpecFormat::OpenApi3),
        FormatArg::Swagger2 => SpecDocument::with_format(doc.into_root(), SpecFormat::Swagger2),
    })
}
