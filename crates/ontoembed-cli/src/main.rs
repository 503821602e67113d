//! Ontoembed CLI - ontology artifact store and embedding cache

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ontoembed_core::commands::Workspace;
use ontoembed_core::config::Config;
use ontoembed_core::embedding::Algorithm;
use ontoembed_core::storage::Rows;
use ontoembed_core::Error;
use serde::Serialize;
use tracing::debug;

#[derive(Parser)]
#[command(name = "ontoembed")]
#[command(author, version, about = "Ontology artifact store and embedding cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored ontologies
    List,

    /// Show which artifacts and models exist for an ontology
    Show { ontology: String },

    /// Save the lines of a file as an artifact
    Import {
        ontology: String,
        /// Artifact kind (axioms, classes, individuals, uri_labels,
        /// annotations, inferred_ancestors) or a generic input name
        kind: String,
        file: PathBuf,
    },

    /// Load generic input files
    Load {
        ontology: String,
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Merge preferred labels and annotations
    Merge {
        ontology: String,
        /// File of `entity<TAB>label` lines
        #[arg(long)]
        labels: PathBuf,
        /// File of whitespace-separated annotation tokens, one per line
        #[arg(long)]
        annotations: PathBuf,
    },

    /// Show the train/valid/test splits
    Splits {
        ontology: String,
        #[arg(long, default_value_t = 0)]
        variant: u32,
    },

    /// Train an embedding, or return the cached one
    Embed {
        ontology: String,
        /// owl2vec, rdf2vec, onto2vec or opa2vec (defaults to config)
        #[arg(short, long)]
        algorithm: Option<String>,
    },

    /// Evaluate a trained embedding with a classifier
    Evaluate {
        ontology: String,
        /// owl2vec, rdf2vec, onto2vec or opa2vec (defaults to config)
        #[arg(short, long)]
        algorithm: Option<String>,
        /// Classifier name, passed to the evaluation command
        #[arg(short, long)]
        classifier: String,
        /// Split variant to evaluate against
        #[arg(long, default_value_t = 0)]
        variant: u32,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.quiet) {
        eprintln!("Error: {:#}", err);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(quiet: bool) -> anyhow::Result<()> {
    let level = if quiet { "ontoembed=warn" } else { "ontoembed=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let output = Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    // `config` subcommands must work without a loadable workspace
    let open = || -> anyhow::Result<(Config, Workspace)> {
        let config = Config::load()?;
        debug!(root = %config.storage.root.display(), "Loaded configuration");
        let workspace = Workspace::from_config(&config)?;
        Ok((config, workspace))
    };

    match cli.command {
        Commands::List => {
            let (config, workspace) = open()?;
            cmd_list(&workspace, &config, output)
        }
        Commands::Show { ontology } => cmd_show(&open()?.1, &ontology, output),
        Commands::Import { ontology, kind, file } => cmd_import(&open()?.1, &ontology, &kind, &file, output),
        Commands::Load { ontology, names } => cmd_load(&open()?.1, &ontology, &names, output),
        Commands::Merge {
            ontology,
            labels,
            annotations,
        } => cmd_merge(&open()?.1, &ontology, &labels, &annotations, output),
        Commands::Splits { ontology, variant } => cmd_splits(&open()?.1, &ontology, variant, output),
        Commands::Embed { ontology, algorithm } => cmd_embed(&open()?.1, &ontology, algorithm.as_deref(), output),
        Commands::Evaluate {
            ontology,
            algorithm,
            classifier,
            variant,
        } => cmd_evaluate(&open()?.1, &ontology, algorithm.as_deref(), &classifier, variant, output),
        Commands::Config { action } => cmd_config(action, output),
    }
}

/// Print a failure with its error code and a suggested next command
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<Error>() {
        Some(core) => {
            eprintln!("Error [{}]: {}", core.code(), core);
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn cmd_list(workspace: &Workspace, config: &Config, output: Output) -> anyhow::Result<()> {
    let ontologies = workspace.list_ontologies()?;

    if output.json() {
        return output.print_json(&ontologies);
    }
    if ontologies.is_empty() {
        if !output.quiet {
            println!("No ontologies found in {}", config.storage.root.display());
        }
        return Ok(());
    }
    for name in ontologies {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_show(workspace: &Workspace, ontology: &str, output: Output) -> anyhow::Result<()> {
    let summary = workspace.show(ontology)?;

    if output.json() {
        return output.print_json(&summary);
    }
    if !summary.exists {
        println!("Ontology '{}' has no stored artifacts.", summary.name);
        return Ok(());
    }

    println!("Ontology: {}", summary.name);
    println!("\nArtifacts:");
    for status in &summary.artifacts {
        let mark = if status.present { "x" } else { " " };
        println!("  [{}] {}", mark, status.file);
    }
    println!("\nModels:");
    for status in &summary.models {
        let mark = if status.present { "x" } else { " " };
        println!("  [{}] {}", mark, status.algorithm.display_name());
    }
    Ok(())
}

fn cmd_import(
    workspace: &Workspace,
    ontology: &str,
    kind: &str,
    file: &Path,
    output: Output,
) -> anyhow::Result<()> {
    let report = workspace.import(ontology, kind, file)?;

    if output.json() {
        output.print_json(&report)
    } else {
        if !output.quiet {
            println!(
                "Saved {} {} record(s) for '{}'",
                report.records, report.artifact, report.ontology
            );
        }
        Ok(())
    }
}

fn cmd_load(workspace: &Workspace, ontology: &str, names: &[String], output: Output) -> anyhow::Result<()> {
    let loaded = workspace.load(ontology, names)?;

    if output.json() {
        return output.print_json(&loaded);
    }
    for (name, lines) in &loaded {
        if !output.quiet {
            println!("{} ({} lines):", name, lines.len());
        }
        for line in lines {
            println!("  {}", line);
        }
    }
    Ok(())
}

fn cmd_merge(
    workspace: &Workspace,
    ontology: &str,
    labels: &Path,
    annotations: &Path,
    output: Output,
) -> anyhow::Result<()> {
    let lines = workspace.merge(ontology, labels, annotations)?;

    if output.json() {
        return output.print_json(&lines);
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_splits(workspace: &Workspace, ontology: &str, variant: u32, output: Output) -> anyhow::Result<()> {
    let splits = workspace.splits(ontology, variant)?;

    if output.json() {
        return output.print_json(&splits);
    }

    let print_rows = |name: &str, rows: &Rows| {
        println!("{} ({} rows):", name, rows.len());
        if !output.quiet {
            for row in rows {
                println!("  {}", row.join(","));
            }
        }
    };
    print_rows("train", &splits.train);
    print_rows("valid", &splits.valid);
    print_rows("test", &splits.test);
    Ok(())
}

fn cmd_embed(workspace: &Workspace, ontology: &str, algorithm: Option<&str>, output: Output) -> anyhow::Result<()> {
    let algorithm = algorithm.map(str::parse::<Algorithm>).transpose()?;
    let outcome = workspace.embed(ontology, algorithm)?;

    if output.json() {
        return output.print_json(&outcome);
    }

    println!("{}", outcome.message);
    if !output.quiet {
        println!("  Model: {}", outcome.model_id);
        println!("  Path: {}", outcome.model_path.display());
    }
    Ok(())
}

fn cmd_evaluate(
    workspace: &Workspace,
    ontology: &str,
    algorithm: Option<&str>,
    classifier: &str,
    variant: u32,
    output: Output,
) -> anyhow::Result<()> {
    let algorithm = algorithm.map(str::parse::<Algorithm>).transpose()?;
    let outcome = workspace.evaluate(ontology, algorithm, classifier, variant)?;

    if output.json() {
        return output.print_json(&outcome);
    }

    println!("{}", outcome.message);
    if output.quiet {
        return Ok(());
    }
    println!("  Model: {}", outcome.model_id);
    println!(
        "  Splits: {} train, {} valid, {} test (variant {})",
        outcome.train_rows, outcome.valid_rows, outcome.test_rows, outcome.variant
    );
    if let Some(performance) = &outcome.performance {
        println!("  MRR: {:.4}", performance.mrr);
        println!(
            "  Hits@1/5/10: {:.4} / {:.4} / {:.4}",
            performance.hit_at_1, performance.hit_at_5, performance.hit_at_10
        );
        println!("  Garbage: {} of {}", performance.garbage, performance.total);
        println!("  Average rank: {:.2}", performance.average_rank);
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, output: Output) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            if output.json() {
                output.print_json(&serde_json::json!({ "key": key, "value": value }))?;
            } else {
                println!("{}", value);
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_stored()?;
            config.set(&key, &value)?;
            config.save()?;
            if !output.quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            if output.json() {
                let map: serde_json::Map<String, serde_json::Value> = items
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::String(value)))
                    .collect();
                output.print_json(&map)?;
            } else {
                for (key, value) in items {
                    println!("{} = {}", key, value);
                }
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !output.quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
