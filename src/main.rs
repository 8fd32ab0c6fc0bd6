//! # TrendSync CLI (`tsync`)
//!
//! The `tsync` binary drives the synchronization engine from the command
//! line. Every run loads the TOML config, opens the local snapshot,
//! probes the hosted store once to establish the session mode, and then
//! dispatches one command through the coordinator.
//!
//! ## Usage
//!
//! ```bash
//! tsync --config ./config/tsync.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tsync probe` | Check remote reachability and report the session mode |
//! | `tsync status` | Collection counts and current mode |
//! | `tsync sync` | Push local state, then pull the remote state |
//! | `tsync keywords <op>` | List, add, remove, search, rank, or purge keywords |
//! | `tsync targets <op>` | Manage crawl targets |
//! | `tsync analyses <op>` | Browse, generate, export, or clear analyses |
//! | `tsync crawl` | Run the crawler over every active target |
//! | `tsync settings` | Show the dashboard menu toggles |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use trendsync::config::{self, Config};
use trendsync::connection::ConnectionMonitor;
use trendsync::crawl::{CrawlProducer, SimulatedCrawler};
use trendsync::generate::{AnalysisGenerator, TemplateGenerator};
use trendsync::local_store::LocalStore;
use trendsync::models::{self, CrawlJob, Keyword};
use trendsync::remote::RemoteStore;
use trendsync::supabase::SupabaseStore;
use trendsync::sync::{SyncCoordinator, SyncOutcome};

/// TrendSync CLI — a local-first synchronization engine for keyword
/// trend dashboards.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/tsync.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "tsync",
    about = "TrendSync — local-first synchronization for keyword trend dashboards",
    version,
    long_about = "TrendSync keeps an in-memory local store (with JSON snapshots) and a hosted \
    PostgREST-style store reconciled for keywords, analyses, crawl targets, categories, and menu \
    settings, degrading to a fully functional local mode whenever the remote is unreachable."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tsync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Probe the hosted store and report the resulting session mode.
    ///
    /// A probe that finds the schema missing triggers one provisioning
    /// attempt when `remote.auto_provision` is enabled.
    Probe,

    /// Show collection counts and the current session mode.
    Status,

    /// Reconcile local state with the hosted store.
    ///
    /// Pushes local keywords and crawl targets by upsert (local wins on
    /// overlapping ids), appends local analyses insert-only, then pulls
    /// every collection back so the remote state wins wholesale.
    Sync,

    /// Manage the keyword collection.
    Keywords {
        #[command(subcommand)]
        action: KeywordAction,
    },

    /// Manage crawl targets.
    Targets {
        #[command(subcommand)]
        action: TargetAction,
    },

    /// Browse and generate pairwise analyses.
    Analyses {
        #[command(subcommand)]
        action: AnalysisAction,
    },

    /// Crawl every active target and fold new keywords into the stores.
    Crawl,

    /// Show the dashboard menu toggles.
    Settings,
}

/// Keyword subcommands.
#[derive(Subcommand)]
enum KeywordAction {
    /// List all keywords.
    List,
    /// Add a keyword (or replace one sharing the generated id).
    Add {
        /// The keyword text.
        text: String,
        /// Primary category label.
        #[arg(long)]
        category: Option<String>,
        /// Source URL attribution.
        #[arg(long)]
        url: Option<String>,
    },
    /// Remove a keyword by id.
    Remove {
        /// Keyword id.
        id: String,
    },
    /// Show the highest-frequency keywords.
    Top {
        /// Maximum number of results.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Case-insensitive substring search over text and categories.
    Search {
        /// The search query string.
        query: String,
    },
    /// Drop keywords strictly older than the retention window.
    ///
    /// A record exactly at the boundary is retained.
    Purge {
        /// Override `crawl.purge_after_days` from the config.
        #[arg(long)]
        days: Option<i64>,
    },
}

/// Crawl target subcommands.
#[derive(Subcommand)]
enum TargetAction {
    /// List active crawl targets.
    List,
    /// Register a target. The url must not already be registered on an
    /// active target.
    Add {
        /// Display domain, e.g. `example.com`.
        domain: String,
        /// Full URL to crawl.
        url: String,
    },
    /// Deactivate a target by id (the remote row is kept, flagged inactive).
    Remove {
        /// Target id.
        id: String,
    },
    /// Show the crawl job history, most recent first.
    Jobs,
}

/// Analysis subcommands.
#[derive(Subcommand)]
enum AnalysisAction {
    /// List the analysis log, newest first.
    List {
        /// Maximum number of entries to print.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Generate and append one analysis for a keyword pair.
    ///
    /// The pair must differ; identical pairs generated repeatedly each
    /// produce a fresh entry.
    Generate {
        /// First keyword.
        keyword1: String,
        /// Second keyword.
        keyword2: String,
    },
    /// Search the log across titles, descriptions, keywords, and
    /// suggestions.
    Search {
        /// The search query string.
        query: String,
    },
    /// Remove one analysis by id.
    Remove {
        /// Analysis id.
        id: String,
    },
    /// Clear the whole analysis log.
    Clear,
    /// Aggregate figures over the log.
    Stats,
    /// Export the log to stdout or a file.
    Export {
        /// Output format: `json` or `csv`.
        #[arg(long, default_value = "json")]
        format: String,
        /// Write to this path instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let local = Arc::new(LocalStore::open(
        Some(cfg.local.snapshot_path.clone()),
        cfg.local.bootstrap_samples,
        cfg.menu.clone(),
    ));
    let remote: Arc<dyn RemoteStore> = Arc::new(SupabaseStore::new(&cfg.remote)?);
    let monitor = ConnectionMonitor::new(Arc::clone(&remote), cfg.remote.auto_provision);
    let coordinator = SyncCoordinator::new(local, remote, monitor);

    // One probe per run establishes the session mode for every command.
    let connected = coordinator.connect().await;

    match cli.command {
        Commands::Probe => {
            if connected {
                println!("Remote store reachable. Mode: connected.");
            } else {
                println!("Remote store unreachable. Mode: local.");
            }
        }
        Commands::Status => {
            let stats = coordinator.stats().await;
            println!("Mode:                 {}", mode_label(connected));
            println!("Keywords:             {}", stats.total_keywords);
            println!("Analyses:             {}", stats.total_analyses);
            println!("Active crawl targets: {}", stats.active_crawl_targets);
            println!("Recent crawl jobs:    {}", stats.recent_crawl_jobs);
        }
        Commands::Sync => match coordinator.sync().await {
            SyncOutcome::Completed(report) => {
                println!(
                    "Sync complete: pushed {} keywords, {} targets, {} analyses; pulled fresh state.",
                    report.pushed_keywords, report.pushed_targets, report.pushed_analyses
                );
            }
            SyncOutcome::AlreadyRunning => println!("A sync is already in flight."),
            SyncOutcome::Offline => println!("Remote store unreachable; nothing synced."),
        },
        Commands::Keywords { action } => run_keywords(&coordinator, &cfg, action).await?,
        Commands::Targets { action } => run_targets(&coordinator, action).await?,
        Commands::Analyses { action } => run_analyses(&coordinator, action).await?,
        Commands::Crawl => run_crawl(&coordinator, &cfg).await?,
        Commands::Settings => {
            let settings = coordinator.menu_settings().await;
            println!("Keywords tab:     {}", toggle(settings.show_keywords_tab));
            println!("Trends tab:       {}", toggle(settings.show_trends_tab));
            println!("Crawl tab:        {}", toggle(settings.show_crawl_tab));
            println!("Share tab:        {}", toggle(settings.show_share_tab));
            println!("Analysis history: {}", toggle(settings.show_analysis_history));
            println!("System guide:     {}", toggle(settings.show_system_guide));
        }
    }

    Ok(())
}

fn mode_label(connected: bool) -> &'static str {
    if connected {
        "connected"
    } else {
        "local"
    }
}

fn toggle(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

async fn run_keywords(
    coordinator: &SyncCoordinator,
    cfg: &Config,
    action: KeywordAction,
) -> Result<()> {
    match action {
        KeywordAction::List => {
            for keyword in coordinator.keywords().await {
                print_keyword(&keyword);
            }
        }
        KeywordAction::Add { text, category, url } => {
            let mut keyword = Keyword::new_local(text);
            keyword.primary_category = category;
            keyword.source_url = url;
            let id = keyword.id.clone();
            if coordinator.add_keyword(keyword).await {
                println!("Added keyword {id}.");
            } else {
                println!("Remote store rejected the write; nothing stored.");
            }
        }
        KeywordAction::Remove { id } => {
            if coordinator.remove_keyword(&id).await {
                println!("Removed keyword {id}.");
            } else {
                println!("No keyword with id {id}.");
            }
        }
        KeywordAction::Top { limit } => {
            for keyword in coordinator.top_keywords(limit) {
                print_keyword(&keyword);
            }
        }
        KeywordAction::Search { query } => {
            let hits = coordinator.search_keywords(&query);
            println!("{} match(es):", hits.len());
            for keyword in hits {
                print_keyword(&keyword);
            }
        }
        KeywordAction::Purge { days } => {
            let days = days.unwrap_or(cfg.crawl.purge_after_days);
            let removed = coordinator.purge_keywords_older_than(days);
            println!("Purged {removed} keyword(s) older than {days} days.");
        }
    }
    Ok(())
}

fn print_keyword(keyword: &Keyword) {
    let category = keyword.primary_category.as_deref().unwrap_or("-");
    println!(
        "{}  {:<28} freq {:>3}  [{}]",
        keyword.id, keyword.text, keyword.frequency, category
    );
}

async fn run_targets(coordinator: &SyncCoordinator, action: TargetAction) -> Result<()> {
    match action {
        TargetAction::List => {
            for target in coordinator.crawl_targets().await {
                let crawled = target
                    .last_crawled
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!("{}  {:<24} {}  last crawled: {}", target.id, target.domain, target.url, crawled);
            }
        }
        TargetAction::Add { domain, url } => {
            if coordinator.add_crawl_target(&domain, &url).await {
                println!("Registered crawl target for {url}.");
            } else {
                println!("An active target already covers {url}.");
            }
        }
        TargetAction::Remove { id } => {
            if coordinator.remove_crawl_target(&id).await {
                println!("Deactivated crawl target {id}.");
            } else {
                println!("No crawl target with id {id}.");
            }
        }
        TargetAction::Jobs => {
            for job in coordinator.crawl_jobs().await {
                let detail = match job.error_message.as_deref() {
                    Some(message) => message.to_string(),
                    None => format!("{} keyword(s)", job.keywords_extracted),
                };
                println!(
                    "{}  {:<9} {}  started: {}  {}",
                    job.id,
                    job.status.label(),
                    job.target_url,
                    job.started_at.to_rfc3339(),
                    detail
                );
            }
        }
    }
    Ok(())
}

async fn run_analyses(coordinator: &SyncCoordinator, action: AnalysisAction) -> Result<()> {
    match action {
        AnalysisAction::List { limit } => {
            let analyses = match limit {
                Some(limit) => coordinator.recent_analyses(limit),
                None => coordinator.analyses().await,
            };
            for analysis in analyses {
                println!(
                    "{}  [{} x {}] {}",
                    analysis.id, analysis.keyword1, analysis.keyword2, analysis.title
                );
            }
        }
        AnalysisAction::Generate { keyword1, keyword2 } => {
            let generator = TemplateGenerator;
            let analysis = generator.generate(&keyword1, &keyword2)?;
            println!("{}", analysis.title);
            println!("{}", analysis.description);
            for suggestion in &analysis.suggestions {
                println!("  - {suggestion}");
            }
            if coordinator.save_analysis(analysis).await {
                println!("Saved to the analysis log.");
            } else {
                println!("Remote store rejected the write; nothing stored.");
            }
        }
        AnalysisAction::Search { query } => {
            let hits = coordinator.search_analyses(&query);
            println!("{} match(es):", hits.len());
            for analysis in hits {
                println!(
                    "{}  [{} x {}] {}",
                    analysis.id, analysis.keyword1, analysis.keyword2, analysis.title
                );
            }
        }
        AnalysisAction::Remove { id } => {
            if coordinator.remove_analysis(&id).await {
                println!("Removed analysis {id}.");
            } else {
                println!("No analysis with id {id}.");
            }
        }
        AnalysisAction::Clear => {
            if coordinator.clear_analyses().await {
                println!("Cleared the analysis log.");
            } else {
                println!("Remote store rejected the clear; log unchanged.");
            }
        }
        AnalysisAction::Stats => {
            let stats = coordinator.analysis_stats();
            println!("Total analyses:      {}", stats.total_analyses);
            println!("Unique keywords:     {}", stats.unique_keywords);
            println!("Avg suggestions:     {:.1}", stats.average_suggestions);
        }
        AnalysisAction::Export { format, out } => {
            let analyses = coordinator.analyses().await;
            let body = match format.as_str() {
                "json" => models::analyses_to_json(&analyses)?,
                "csv" => models::analyses_to_csv(&analyses),
                other => anyhow::bail!("unknown export format '{other}' (expected json or csv)"),
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, body)?;
                    println!("Exported {} analyses to {}.", analyses.len(), path.display());
                }
                None => print!("{body}"),
            }
        }
    }
    Ok(())
}

async fn run_crawl(coordinator: &SyncCoordinator, cfg: &Config) -> Result<()> {
    let crawler = SimulatedCrawler;
    let targets = coordinator.crawl_targets().await;
    if targets.is_empty() {
        println!("No active crawl targets.");
        return Ok(());
    }
    for target in targets {
        let existing = coordinator.keywords().await;
        let outcome = crawler
            .crawl(&target, &existing, cfg.crawl.max_keywords_per_site)
            .await;
        let found = outcome.new_keywords.len();
        let job = CrawlJob::started(&target.url);
        if coordinator.record_crawl(&target.id, job, &outcome).await {
            println!("{}: {} new keyword(s).", target.domain, found);
        } else {
            println!(
                "{}: crawl not recorded ({}).",
                target.domain,
                outcome.error.as_deref().unwrap_or("remote write rejected")
            );
        }
    }
    Ok(())
}
