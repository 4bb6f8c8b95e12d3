use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use sightline_common::formatter::format_record;
use sightline_core::cli::{self, OnError, OutputHandlers};
use sightline_core::config::{ConfigLoader, EngineConfig};
use sightline_core::dom::{Document, DomTree};
use sightline_core::inspector::{Inspector, InspectorCommand};
use sightline_core::session::{OutputFormat, SessionClock, SessionExecutor};
use sightline_core::tracker::{Clock, ManualClock, SystemClock};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sightline", version, about = "Locator synthesis and resilience scoring")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Config file (defaults to ./sightline.yaml, then ~/.sightline/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Compose locators for one element of a document snapshot
    Inspect {
        /// JSON or YAML document snapshot
        #[arg(long)]
        document: PathBuf,
        /// CSS selector of the element to inspect
        #[arg(long)]
        target: String,
    },
    /// Interactive or scripted inspection session
    Session {
        /// Document snapshot to load at startup
        #[arg(long)]
        document: Option<PathBuf>,
        /// Script to execute instead of reading stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// Run the rest of the script after a failing line
        #[arg(long, requires = "file")]
        keep_going: bool,
        /// Start a manual clock at zero so `advance` controls time
        #[arg(long)]
        manual_clock: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sightline=info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref()).await?;
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match args.mode {
        Mode::Inspect { document, target } => inspect(config, &document, &target, format),
        Mode::Session {
            document,
            file,
            keep_going,
            manual_clock,
        } => {
            let on_error = if keep_going {
                OnError::Continue
            } else {
                OnError::Stop
            };
            let script = file.as_deref().map(|path| (path, on_error));
            session(config, document.as_deref(), script, manual_clock, format).await
        }
    }
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    Ok(config)
}

fn inspect(
    config: EngineConfig,
    document_path: &Path,
    target: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let document = Document::load(document_path)
        .with_context(|| format!("loading document {}", document_path.display()))?;
    let Some(node) = document.query(target)? else {
        bail!("no element matches {:?}", target);
    };

    let mut inspector = Inspector::new(config);
    inspector.apply(InspectorCommand::Start);
    let Some(record) = inspector.select(&document, node, SystemClock.now_ms()) else {
        bail!("inspector did not produce a record");
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => println!("{}", format_record(&record)),
    }
    Ok(())
}

async fn session(
    config: EngineConfig,
    document_path: Option<&Path>,
    script: Option<(&Path, OnError)>,
    manual_clock: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let clock = if manual_clock {
        SessionClock::Manual(ManualClock::new(0))
    } else {
        SessionClock::System(SystemClock)
    };
    let mut executor = SessionExecutor::new(config, clock, format);
    if let Some(path) = document_path {
        let document = Document::load(path)
            .with_context(|| format!("loading document {}", path.display()))?;
        tracing::info!(elements = document.elements().len(), "Loaded document");
        executor = executor.with_document(document);
    }

    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };

    match script {
        Some((path, on_error)) => {
            let summary = cli::run_script(&mut executor, output, path, on_error)
                .await
                .with_context(|| format!("executing {}", path.display()))?;
            if summary.failed > 0 {
                bail!(
                    "{} of {} commands in {} failed",
                    summary.failed,
                    summary.executed + summary.failed,
                    path.display()
                );
            }
        }
        None => {
            cli::run_repl(
                &mut executor,
                output,
                &[
                    "Sightline session. Commands: start, stop, reset, status, load, select, insert, remove, records, advance.",
                    "Type 'exit' or 'quit' to close.",
                ],
                "> ",
            )
            .await?;
        }
    }
    Ok(())
}
