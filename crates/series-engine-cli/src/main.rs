//! series - expand, summarize, edit and delete recurring calendar series as JSON

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use series_engine::{
    apply_delete, apply_edit, expand_occurrence, EditScope, EngineConfig, Occurrence,
    OccurrenceId, RepeatUnit, RepeatValue, RuleDraft,
};

#[derive(Parser, Debug)]
#[command(name = "series")]
#[command(about = "Expand, edit and delete recurring calendar series", long_about = None)]
#[command(version)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand one occurrence into its series using its own rule fields
    Expand {
        /// Occurrence JSON file (reads stdin if omitted or "-")
        input: Option<PathBuf>,
    },
    /// Show the rule summary the event panel would display
    Summary {
        /// Occurrence JSON file (reads stdin if omitted or "-")
        input: Option<PathBuf>,
    },
    /// Apply an edited occurrence to a collection
    Edit {
        /// Collection JSON file (array of occurrences)
        #[arg(long)]
        collection: PathBuf,
        /// Edited occurrence JSON file (reads stdin if "-")
        #[arg(long)]
        edited: PathBuf,
        #[arg(long, value_enum, default_value_t = ScopeArg::Single)]
        scope: ScopeArg,
    },
    /// Delete an occurrence (and optionally its later siblings) from a collection
    Delete {
        /// Collection JSON file (reads stdin if "-")
        #[arg(long)]
        collection: PathBuf,
        /// Id of the occurrence to delete
        #[arg(long)]
        id: String,
        #[arg(long, value_enum, default_value_t = ScopeArg::Single)]
        scope: ScopeArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeArg {
    Single,
    AllFuture,
}

impl From<ScopeArg> for EditScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Single => EditScope::Single,
            ScopeArg::AllFuture => EditScope::AllFuture,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Summary {
    repeat_value: RepeatValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_label: Option<String>,
    end_repeat_text: String,
    total_occurrences: u32,
    expanded_count: usize,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            let config = EngineConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Expand { input } => {
            let anchor: Occurrence = parse(&read_input(input.as_deref())?, "occurrence")?;
            let series = expand_occurrence(&anchor, &config.expansion);
            print_json(&series)
        }
        Command::Summary { input } => {
            let anchor: Occurrence = parse(&read_input(input.as_deref())?, "occurrence")?;
            let draft = RuleDraft::from_occurrence(&anchor);
            let custom_label = match (draft.repeat_value(), draft.custom_config().unit) {
                (RepeatValue::Custom(_), RepeatUnit::Week) => Some(draft.custom_label()),
                _ => None,
            };
            let summary = Summary {
                repeat_value: anchor.repeat_value.clone(),
                custom_label,
                end_repeat_text: draft.end_repeat_text(),
                total_occurrences: draft.total_occurrences(),
                expanded_count: expand_occurrence(&anchor, &config.expansion).len(),
            };
            print_json(&summary)
        }
        Command::Edit {
            collection,
            edited,
            scope,
        } => {
            let occurrences: Vec<Occurrence> =
                parse(&read_input(Some(&collection))?, "collection")?;
            let edited: Occurrence = parse(&read_input(Some(&edited))?, "edited occurrence")?;
            let out = apply_edit(&occurrences, &edited, scope.into(), &config.expansion);
            tracing::debug!(before = occurrences.len(), after = out.len(), "edit applied");
            print_json(&out)
        }
        Command::Delete {
            collection,
            id,
            scope,
        } => {
            let occurrences: Vec<Occurrence> =
                parse(&read_input(Some(&collection))?, "collection")?;
            let id: OccurrenceId = id
                .parse()
                .with_context(|| format!("invalid occurrence id '{}'", id))?;
            let out = apply_delete(&occurrences, &id, scope.into());
            tracing::debug!(before = occurrences.len(), after = out.len(), "delete applied");
            print_json(&out)
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(text: &str, what: &str) -> Result<T> {
    serde_json::from_str(text).with_context(|| format!("invalid {} JSON", what))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", out);
    Ok(())
}
