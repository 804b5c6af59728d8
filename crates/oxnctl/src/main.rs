mod config;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use oxn_client::{DownloadKind, ExperimentApi, HttpTransport, Orchestrator, StatusRefresher};
use oxn_core::{parse_file_text, BatchDefinition, ExperimentMode, SelectedFile, Variations};
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Overrides, Settings};
use crate::output::{print_json, print_rows};

#[derive(Parser, Debug)]
#[command(name = "oxnctl", version, about = "Submit and track OXN experiments")]
struct Cli {
    /// Settings file; `oxn.toml` in the working directory is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, env = "OXN_BACKEND_URL", global = true)]
    backend: Option<String>,

    /// Print row producing commands as a tab separated table.
    #[arg(long, global = true)]
    table: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List experiments known to the backend
    List,
    /// Create an experiment and start it
    Submit {
        #[command(subcommand)]
        mode: SubmitCmd,
    },
    /// Preview the sub-experiments of a batch document without contacting the backend
    Expand {
        file: PathBuf,
        #[arg(long = "vary", value_name = "PATH=[VALUES]")]
        vary: Vec<String>,
    },
    /// Refresh one experiment's status
    Status { id: String },
    /// Flattened interactions of an experiment's report
    Report {
        id: String,
        /// One row per run with load generator totals instead
        #[arg(long)]
        summary: bool,
    },
    /// Fault detection results
    Faults { id: String },
    /// Raw detections
    Detections { id: String },
    /// Per-service metrics, or probabilities with --probability
    Analysis {
        id: Option<String>,
        #[arg(long)]
        probability: bool,
    },
    /// Save an experiment artifact to disk
    Download {
        id: String,
        #[arg(value_enum)]
        kind: Artifact,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum SubmitCmd {
    Single {
        file: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    Batch {
        file: PathBuf,
        #[arg(long = "vary", value_name = "PATH=[VALUES]")]
        vary: Vec<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    Suite {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long)]
    runs: Option<u32>,
    #[arg(long)]
    output_format: Option<String>,
    /// Create only
    #[arg(long)]
    no_run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Artifact {
    Config,
    Benchmark,
    Data,
}

impl From<Artifact> for DownloadKind {
    fn from(a: Artifact) -> Self {
        match a {
            Artifact::Config => DownloadKind::Config,
            Artifact::Benchmark => DownloadKind::Benchmark,
            Artifact::Data => DownloadKind::Data,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (runs, output_format) = match &cli.cmd {
        Cmd::Submit {
            mode:
                SubmitCmd::Single { run, .. }
                | SubmitCmd::Batch { run, .. }
                | SubmitCmd::Suite { run, .. },
        } => (run.runs, run.output_format.clone()),
        _ => (None, None),
    };
    let settings = Settings::load(cli.config.as_deref())?.apply(Overrides {
        backend_url: cli.backend.clone(),
        runs,
        output_format,
    });
    info!(backend = %settings.backend_url, "oxnctl");

    let transport = HttpTransport::new(&settings.backend_url);
    let api = ExperimentApi::new(transport.clone());

    match cli.cmd {
        Cmd::List => {
            let experiments = api.list_experiments().await.context("list experiments")?;
            print_rows(&experiments, cli.table)?;
        }
        Cmd::Submit { mode } => {
            let (mode, files, vary, no_run) = match mode {
                SubmitCmd::Single { file, run } => (ExperimentMode::Single, vec![file], vec![], run.no_run),
                SubmitCmd::Batch { file, vary, run } => (ExperimentMode::Batch, vec![file], vary, run.no_run),
                SubmitCmd::Suite { files, run } => (ExperimentMode::Suite, files, vec![], run.no_run),
            };
            let variations = parse_variations(&vary)?;
            submit(transport, &settings, mode, files, variations, no_run).await?;
        }
        Cmd::Expand { file, vary } => {
            let docs = expand(&file, parse_variations(&vary)?).await?;
            print_json(&docs)?;
        }
        Cmd::Status { id } => {
            let refresher = StatusRefresher::new(transport);
            refresher.load().await.context("list experiments")?;
            match refresher
                .refresh(&id)
                .await
                .with_context(|| format!("status of {id}"))?
            {
                Some(experiment) => print_json(&*experiment)?,
                None => bail!("no experiment with id {id}"),
            }
        }
        Cmd::Report { id, summary } => {
            let report = api.report(&id).await.with_context(|| format!("report of {id}"))?;
            if summary {
                print_rows(&report.run_summaries(), cli.table)?;
            } else {
                print_rows(&report.interaction_rows(), cli.table)?;
            }
        }
        Cmd::Faults { id } => {
            let rows = api
                .fault_detection(&id)
                .await
                .with_context(|| format!("fault detection of {id}"))?;
            print_rows(&rows, cli.table)?;
        }
        Cmd::Detections { id } => {
            let rows = api
                .raw_detections(&id)
                .await
                .with_context(|| format!("raw detections of {id}"))?;
            print_rows(&rows, cli.table)?;
        }
        Cmd::Analysis { id, probability } => {
            let data = api.analysis(id.as_deref()).await.context("analysis data")?;
            match (probability, cli.table) {
                (true, table) => print_rows(&data.probability_rows(), table)?,
                (false, true) => print_rows(&data.metrics_rows(), true)?,
                (false, false) => print_json(&json!({
                    "metrics": data.metrics_rows(),
                    "probability": data.probability_rows(),
                }))?,
            }
        }
        Cmd::Download { id, kind, dir } => {
            let path = api
                .download(&id, kind.into(), &dir)
                .await
                .with_context(|| format!("download {kind:?} of {id}"))?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

async fn submit(
    transport: HttpTransport,
    settings: &Settings,
    mode: ExperimentMode,
    files: Vec<PathBuf>,
    variations: Variations,
    no_run: bool,
) -> Result<()> {
    let mut orch = Orchestrator::new(transport, mode)
        .with_filter(settings.extension_filter())
        .with_options(settings.run_options())
        .with_variations(variations);

    let kept = orch.select_files(files.into_iter().map(SelectedFile::from_path).collect());
    if kept == 0 {
        bail!(
            "no file with an allowed extension ({})",
            settings.allowed_extensions.join(", ")
        );
    }

    let draft = orch.ingest().await.context("ingest files")?;
    for (file, failure) in draft.failures() {
        warn!(file = %file.name, "{failure}");
    }

    let ids = orch.create().await.context("create experiment")?;
    let result = if no_run {
        None
    } else {
        orch.start().await.context("start experiment")?
    };

    print_json(&json!({
        "mode": mode,
        "ids": ids.ids(),
        "experiments": orch.experiments(),
        "result": result,
    }))
}

async fn expand(file: &Path, variations: Variations) -> Result<Vec<Value>> {
    let selected = SelectedFile::from_path(file);
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("read {}", file.display()))?;
    let doc = parse_file_text(&selected, &text).with_context(|| format!("parse {}", selected.name))?;
    let def = BatchDefinition::from_document(&selected.name, &doc)?.with_variations(variations)?;
    let combinations = def.combination_count()?;
    info!(name = %def.name, combinations, "expanding batch");
    Ok(def.expand()?)
}

/// Parses `--vary path=[json, values]` arguments.
fn parse_variations(args: &[String]) -> Result<Variations> {
    let mut variations = Variations::new();
    for arg in args {
        let Some((path, values)) = arg.split_once('=') else {
            bail!("expected PATH=[VALUES], got {arg}");
        };
        let candidates: Vec<Value> = serde_json::from_str(values)
            .with_context(|| format!("candidates for {path} must be a JSON array"))?;
        variations.insert(path.trim(), candidates);
    }
    Ok(variations)
}
