//! Capmatch - capability/requirement matching
//!
//! Usage:
//!   capmatch resources                          # List loaded resources
//!   capmatch providers -n <ns> -f <filter>      # Ordered candidates
//!   capmatch filter <text> --attr name=value    # Check a filter

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use capmatch_core::builder::typed_value;
use capmatch_core::config::{ConfigStore, EngineConfig};
use capmatch_core::filter;
use capmatch_core::model::{Attributes, Capability, Requirement, ResourceId, ResourceKind};
use capmatch_core::resolve::{ResolutionContext, ResolveContext};
use capmatch_core::version::empty_version;

#[derive(Parser)]
#[command(name = "capmatch")]
#[command(about = "Capability/requirement matching", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/capmatch/capmatch.toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List resources built from the configured repositories
    Resources {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Find the capabilities satisfying a requirement, best first
    Providers {
        /// Capability namespace
        #[arg(long, short)]
        namespace: String,

        /// LDAP-style filter, e.g. "(&(name=web)(version>=1.0))"
        #[arg(long, short, default_value = "(&)")]
        filter: String,

        /// Treat the requirement as optional
        #[arg(long)]
        optional: bool,

        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Parse a filter and optionally evaluate it
    Filter {
        /// Filter text
        text: String,

        /// Attribute to evaluate against: name=value or name:Type=value
        #[arg(long = "attr", short)]
        attrs: Vec<String>,

        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capmatch=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resources { format } => {
            let config = load_config(cli.config)?;
            run_resources(&config, format)?;
        }
        Commands::Providers {
            namespace,
            filter,
            optional,
            format,
        } => {
            let config = load_config(cli.config)?;
            run_providers(&config, &namespace, &filter, optional, format)?;
        }
        Commands::Filter {
            text,
            attrs,
            format,
        } => {
            run_filter(&text, &attrs, format)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig> {
    let store = match path {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::from_default_location()?,
    };
    tracing::debug!(path = %store.config_path().display(), "Loading config");
    store.load()
}

fn run_resources(config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let mut rows = Vec::new();
    for (name, entry) in &config.repository {
        let repository = entry.build();
        for resource in repository.resources() {
            rows.push((name.as_str(), Arc::clone(resource)));
        }
    }

    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No resources configured.");
                return Ok(());
            }

            println!(
                "{:<16} {:<30} {:<12} {:<8} {:>5} {:>5}",
                "Repository", "Name", "Version", "Kind", "Caps", "Reqs"
            );
            println!("{}", "-".repeat(81));
            for (repository, resource) in &rows {
                println!(
                    "{:<16} {:<30} {:<12} {:<8} {:>5} {:>5}",
                    repository,
                    resource.name(),
                    resource.version().to_string(),
                    resource.kind().to_string(),
                    resource.capabilities().len(),
                    resource.requirements().len()
                );
            }
        }
        OutputFormat::Json => {
            let output: Vec<_> = rows
                .iter()
                .map(|(repository, resource)| {
                    serde_json::json!({
                        "repository": repository,
                        "name": resource.name(),
                        "version": resource.version().to_string(),
                        "kind": resource.kind().to_string(),
                        "capabilities": resource.capabilities().iter().map(|c| c.to_string()).collect::<Vec<_>>(),
                        "requirements": resource.requirements().iter().map(|r| r.to_string()).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn run_providers(
    config: &EngineConfig,
    namespace: &str,
    filter_text: &str,
    optional: bool,
    format: OutputFormat,
) -> Result<()> {
    let owner = ResourceId::new("capmatch-cli", empty_version(), ResourceKind::Other);
    let mut requirement = Requirement::parse(namespace, filter_text, owner)
        .with_context(|| format!("Invalid filter: {}", filter_text))?;
    if optional {
        requirement = requirement.with_directive("resolution", "optional");
    }

    let candidates = effective_candidates(config, &requirement)?;

    match format {
        OutputFormat::Table => print_candidates_table(&requirement, &candidates),
        OutputFormat::Json => {
            let output: Vec<_> = candidates
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "owner": c.owner().to_string(),
                        "kind": c.owner().kind.to_string(),
                        "namespace": c.namespace(),
                        "attributes": c.attributes().iter().map(|(k, v)| (k.clone(), serde_json::Value::from(v.to_string()))).collect::<serde_json::Map<_, _>>(),
                        "preferred": c.is_preferred(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Candidates for `requirement`, or none when the session would not try it.
fn effective_candidates(
    config: &EngineConfig,
    requirement: &Requirement,
) -> Result<Vec<Arc<Capability>>> {
    let mut context = ResolveContext::from_settings(&config.resolve)
        .with_repository(Arc::new(config.build_repository()));
    if !context.is_effective(requirement) {
        tracing::info!(requirement = %requirement, "Optional requirement not looked up; set resolve.optional to include it");
        context.complete();
        return Ok(Vec::new());
    }

    let candidates = context.find_providers(requirement)?;
    context.complete();
    Ok(candidates)
}

fn print_candidates_table(requirement: &Requirement, candidates: &[Arc<Capability>]) {
    if candidates.is_empty() {
        println!("No providers for {}", requirement);
        return;
    }

    println!("{:>3}  {:<40} Capability", "#", "Owner");
    println!("{}", "-".repeat(80));
    for (rank, capability) in candidates.iter().enumerate() {
        println!(
            "{:>3}  {:<40} {}",
            rank + 1,
            capability.owner().to_string(),
            capability
        );
    }
}

fn parse_attr(arg: &str) -> Result<(String, capmatch_core::model::AttrValue)> {
    let Some((key, raw)) = arg.split_once('=') else {
        anyhow::bail!("Invalid attribute '{}': expected name=value", arg);
    };
    let (name, declared) = match key.split_once(':') {
        Some((name, declared)) => (name.trim(), Some(declared.trim())),
        None => (key.trim(), None),
    };
    if name.is_empty() {
        anyhow::bail!("Invalid attribute '{}': missing name", arg);
    }
    let value = typed_value(name, declared, raw)?;
    Ok((name.to_string(), value))
}

fn run_filter(text: &str, attrs: &[String], format: OutputFormat) -> Result<()> {
    let expr = filter::parse(text)?;

    let matched = if attrs.is_empty() {
        None
    } else {
        let attributes = attrs
            .iter()
            .map(String::as_str)
            .map(parse_attr)
            .collect::<Result<Attributes>>()?;
        Some(expr.evaluate(&attributes))
    };

    match format {
        OutputFormat::Table => {
            println!("{}", expr);
            match matched {
                Some(true) => println!("✓ matches"),
                Some(false) => println!("✗ does not match"),
                None => {}
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "filter": expr.to_string(),
                "matches": matched,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
