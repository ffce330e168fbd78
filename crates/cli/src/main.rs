//! vidya command-line front end.
//!
//! Usage:
//!   vidya ask "How do I use this app?"
//!   vidya --context '{"has_internet": false, "subject": "Science"}' ask "What is photosynthesis?"
//!   vidya --mode online --agents study_assistant,assessment ask "Give me a quiz"
//!   vidya agents --capability assessment
//!   vidya --config vidya.toml health
//!
//! Output is pretty JSON on stdout; logs go to stderr.
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - log filter (default: `info,vidya=debug`)
//! - `GEMINI_API_KEY` / `OPENAI_API_KEY` - remote AI credentials
//! - `GOOGLE_CLOUD_API_KEY` - cloud speech credential

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidya_common::{AgentCapability, AgentMode, QueryContext};
use vidya_coordinator::{Collaborators, Orchestrator, OrchestratorConfig};
use vidya_knowledge::{
    populate_all, InMemoryContentCache, InMemoryKnowledgeBase, InMemorySyllabusPlanner,
};

#[derive(Debug, Parser)]
#[command(name = "vidya", version, about = "Offline-first education assistant")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Query context as a JSON object.
    #[arg(long, global = true)]
    context: Option<String>,

    /// Force agents into this mode before running.
    #[arg(long, global = true)]
    mode: Option<AgentMode>,

    /// Comma-separated agent ids that `--mode` applies to (default: all).
    #[arg(long, global = true, value_delimiter = ',')]
    agents: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer a single query.
    Ask { query: String },
    /// List registered agents.
    Agents {
        /// Only agents with this capability.
        #[arg(long)]
        capability: Option<AgentCapability>,
    },
    /// Orchestrator statistics.
    Stats,
    /// Agent and collaborator health.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,vidya=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => OrchestratorConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => OrchestratorConfig::default(),
    };

    let ctx: QueryContext = match &cli.context {
        Some(raw) => serde_json::from_str(raw).context("--context must be a JSON object")?,
        None => QueryContext::default(),
    };

    let kb = Arc::new(InMemoryKnowledgeBase::new(config.knowledge.clone()));
    let planner = Arc::new(InMemorySyllabusPlanner::new());
    let cache = Arc::new(InMemoryContentCache::new(&config.knowledge));
    let seeded = populate_all(&kb, &planner).await;
    info!(
        faqs = seeded.faqs,
        topics = seeded.syllabus_topics,
        "Local stores ready"
    );

    let collaborators = Collaborators::new()
        .with_knowledge(kb)
        .with_planner(planner)
        .with_cache(cache);
    let orchestrator = Orchestrator::init(config, collaborators)?;

    if let Some(mode) = cli.mode {
        let targets = (!cli.agents.is_empty()).then_some(cli.agents.as_slice());
        orchestrator.set_mode(mode, targets);
    }

    let output: Value = match cli.command {
        Command::Ask { query } => orchestrator.process_query(&query, &ctx).await.to_value(),
        Command::Agents { capability } => {
            let agents = match capability {
                Some(cap) => orchestrator.get_agents_by_capability(cap),
                None => orchestrator.list_agents(),
            };
            serde_json::to_value(agents)?
        }
        Command::Stats => serde_json::to_value(orchestrator.get_stats())?,
        Command::Health => serde_json::to_value(orchestrator.health_check())?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    orchestrator.shutdown();
    Ok(())
}
