//! dugout CLI: football club stats question answering.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;

use dugout::engine::{Engine, EngineConfig};
use dugout::graph::{GraphClient, Row, StubClient, ValueCategory};
use dugout::vocab::{Vocabulary, vocabulary};

#[derive(Parser)]
#[command(name = "dugout", version, about = "Club stats question answering")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON fixture file backing the in-memory graph.
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question against the fixture-backed graph.
    Ask {
        /// The question, in free text.
        question: String,

        /// Player name to resolve first-person questions against.
        #[arg(long)]
        player: Option<String>,

        /// Print the pipeline trace alongside the answer.
        #[arg(long)]
        debug: bool,
    },

    /// Show the analysis and query a question would produce, without running it.
    Plan {
        /// The question, in free text.
        question: String,

        /// Player name to resolve first-person questions against.
        #[arg(long)]
        player: Option<String>,
    },

    /// Show engine configuration and vocabulary statistics.
    Info,

    /// List vocabulary tables, or the entries of one table.
    Vocab {
        /// Table name (e.g. "stats", "teams").
        table: Option<String>,
    },
}

/// On-disk fixture data for the in-memory graph client.
#[derive(Debug, Default, Deserialize)]
struct Fixtures {
    #[serde(default = "default_season")]
    season: String,
    #[serde(default)]
    players: Vec<String>,
    #[serde(default)]
    teams: Vec<String>,
    #[serde(default)]
    oppositions: Vec<String>,
    #[serde(default)]
    leagues: Vec<String>,
    #[serde(default)]
    responses: Vec<FixtureResponse>,
}

#[derive(Debug, Deserialize)]
struct FixtureResponse {
    /// Substring of the query text this response answers.
    fragment: String,
    rows: Vec<Row>,
}

fn default_season() -> String {
    "2023/24".to_string()
}

fn build_client(path: Option<&PathBuf>) -> Result<Arc<dyn GraphClient>> {
    let fixtures = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).into_diagnostic()?;
            serde_json::from_str::<Fixtures>(&raw).into_diagnostic()?
        }
        None => Fixtures {
            season: default_season(),
            ..Default::default()
        },
    };

    let mut client = StubClient::new(fixtures.season)
        .with_known_values(ValueCategory::Players, fixtures.players)
        .with_known_values(ValueCategory::Teams, fixtures.teams)
        .with_known_values(ValueCategory::Oppositions, fixtures.oppositions)
        .with_known_values(ValueCategory::Leagues, fixtures.leagues);
    for response in fixtures.responses {
        client = client.with_response(response.fragment, response.rows);
    }
    Ok(Arc::new(client))
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).into_diagnostic()?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Ask {
            question,
            player,
            debug,
        } => {
            let client = build_client(cli.fixtures.as_ref())?;
            let engine = Engine::new(client, config).into_diagnostic()?;
            let answer = engine
                .answer_question(&question, player.as_deref(), &[])
                .into_diagnostic()?;

            println!("{}", answer.text);
            if let Some(viz) = &answer.visualization {
                println!();
                for (label, value) in viz.labels.iter().zip(&viz.values) {
                    println!("  {label:>10}  {value}");
                }
            }
            if !answer.suggestions.is_empty() {
                println!("\nYou could also ask:");
                for suggestion in &answer.suggestions {
                    println!("  - {suggestion}");
                }
            }
            if debug {
                if let Some(trail) = &answer.debug {
                    println!("\n[debug]");
                    println!("  type:  {}", trail.question_type);
                    println!("  route: {}", trail.route);
                    println!("  query: {}", trail.rendered_query);
                    println!("  cache: {}", if trail.cache_hit { "hit" } else { "miss" });
                }
            }
        }

        Commands::Plan { question, player } => {
            let client = build_client(cli.fixtures.as_ref())?;
            let engine = Engine::new(client, config).into_diagnostic()?;
            let report = engine
                .plan_question(&question, player.as_deref())
                .into_diagnostic()?;

            println!("type:       {}", report.analysis.question_type);
            println!("complexity: {:?}", report.analysis.complexity);
            if !report.analysis.entities.is_empty() {
                println!("entities:   {}", report.analysis.entities.join(", "));
            }
            if !report.analysis.team_entities.is_empty() {
                println!("teams:      {}", report.analysis.team_entities.join(", "));
            }
            if !report.analysis.metrics.is_empty() {
                println!("metrics:    {}", report.analysis.metrics.join(", "));
            }
            match report.plan {
                Some(plan) => {
                    println!("route:      {}", plan.route);
                    println!("query:      {}", plan.text);
                    println!("rendered:   {}", plan.display_text());
                }
                None => {
                    if let Some(message) = &report.analysis.clarification_message {
                        println!("clarify:    {message}");
                    } else {
                        println!("no plan produced");
                    }
                }
            }
        }

        Commands::Info => {
            println!("dugout {}", env!("CARGO_PKG_VERSION"));
            println!("cache capacity:       {}", config.cache_capacity);
            println!("cache ttl:            {}s", config.cache_ttl.as_secs());
            println!("similarity threshold: {}", config.similarity_threshold);
            println!("history window:       {} turns", config.max_history_turns);
            println!("\nvocabulary tables:");
            let vocab = vocabulary();
            for name in Vocabulary::table_names() {
                if let Some(table) = vocab.table(name) {
                    println!("  {name:<14} {} entries", table.len());
                }
            }
        }

        Commands::Vocab { table } => {
            let vocab = vocabulary();
            match table {
                Some(name) => match vocab.table(&name) {
                    Some(table) => {
                        for (variant, canonical) in table.variant_pairs() {
                            println!("{variant:<28} -> {canonical}");
                        }
                    }
                    None => miette::bail!(
                        "unknown table '{name}'; available: {}",
                        Vocabulary::table_names().join(", ")
                    ),
                },
                None => {
                    for name in Vocabulary::table_names() {
                        println!("{name}");
                    }
                }
            }
        }
    }

    Ok(())
}
