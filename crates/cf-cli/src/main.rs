//! CleanFeed CLI
//!
//! Runs the suppression engine over JSON page fixtures: sweeps, per-category
//! diagnostics, the category table, and a performance budget.

mod fixture;
mod perf_budget;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use cf_core::registry::default_categories;
use cf_core::strategy::Strategy;
use cf_core::{Engine, EngineConfig, JsonSource, MemoryDom, NodeId, SettingsSnapshot, SettingsSource};

use crate::perf_budget::{run_perf_budget, PerfBudgetOptions};

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(about = "CleanFeed page suppression engine tools")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep a page fixture and list what gets hidden
    Sweep {
        /// Page fixture (JSON)
        #[arg(short, long)]
        page: PathBuf,

        /// Settings object keyed by storage key (JSON file)
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Engine config (JSON file)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of passes to run
        #[arg(long, default_value_t = 1)]
        passes: usize,

        /// Restore everything after sweeping and report the count
        #[arg(long)]
        restore: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Per-category candidate, boundary and hidden counts for a page fixture
    Counts {
        /// Page fixture (JSON)
        #[arg(short, long)]
        page: PathBuf,

        /// Settings object keyed by storage key (JSON file)
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Engine config (JSON file)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the counts as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in categories
    Categories,

    /// Check sweep latency on a synthetic feed against fixed budgets
    PerfBudget {
        /// Feed units on the synthetic page
        #[arg(long, default_value_t = 200)]
        units: usize,

        /// Measured passes per scenario
        #[arg(long, default_value_t = 50)]
        iterations: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Sweep {
            page,
            settings,
            config,
            passes,
            restore,
            json,
        } => cmd_sweep(&page, settings.as_deref(), config.as_deref(), passes, restore, json),
        Commands::Counts {
            page,
            settings,
            config,
            json,
        } => cmd_counts(&page, settings.as_deref(), config.as_deref(), json),
        Commands::Categories => cmd_categories(),
        Commands::PerfBudget { units, iterations } => run_perf_budget(PerfBudgetOptions { units, iterations }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid JSON in '{}': {}", path.display(), e))
}

fn load_engine(settings: Option<&Path>, config: Option<&Path>) -> Result<Engine<NodeId>, String> {
    let config = match config {
        Some(path) => EngineConfig::from_json(&read_json(path)?)
            .map_err(|e| format!("Invalid config '{}': {}", path.display(), e))?,
        None => EngineConfig::default(),
    };
    let settings = match settings {
        Some(path) => {
            let source = JsonSource::new(path.display().to_string(), read_json(path)?);
            // Explicit file: a malformed one is an error, not a fallback.
            source
                .load()
                .map_err(|e| format!("Invalid settings '{}': {}", path.display(), e))?
                .unwrap_or_default()
        }
        None => SettingsSnapshot::defaults(),
    };
    Ok(Engine::new(&settings, &config))
}

fn load_page(path: &Path) -> Result<MemoryDom, String> {
    fixture::load(path).map_err(|e| e.to_string())
}

fn cmd_sweep(
    page: &Path,
    settings: Option<&Path>,
    config: Option<&Path>,
    passes: usize,
    restore: bool,
    json: bool,
) -> Result<(), String> {
    let mut dom = load_page(page)?;
    let mut engine = load_engine(settings, config)?;

    let mut reports = Vec::with_capacity(passes.max(1));
    for _ in 0..passes.max(1) {
        reports.push(engine.sweep_document(&mut dom));
    }
    let hidden: Vec<(String, &'static str)> = engine
        .ledger()
        .nodes()
        .map(|(node, id)| (fixture::describe(&dom, node), id.as_str()))
        .collect();
    let restored = restore.then(|| engine.restore_all(&mut dom));

    if json {
        let out = serde_json::json!({
            "passes": reports,
            "hidden": hidden
                .iter()
                .map(|(node, category)| serde_json::json!({ "node": node, "category": category }))
                .collect::<Vec<_>>(),
            "restored": restored,
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    for (i, report) in reports.iter().enumerate() {
        println!("Pass {}: {}", i + 1, report);
    }
    println!();
    println!("Hidden ({}):", hidden.len());
    for (node, category) in &hidden {
        println!("  {:<18} {}", category, node);
    }
    if let Some(restored) = restored {
        println!();
        println!("Restored {} node(s)", restored);
    }
    Ok(())
}

fn cmd_counts(page: &Path, settings: Option<&Path>, config: Option<&Path>, json: bool) -> Result<(), String> {
    let mut dom = load_page(page)?;
    let mut engine = load_engine(settings, config)?;
    engine.sweep_document(&mut dom);
    let counts = engine.match_counts(&dom);

    if json {
        let text = serde_json::to_string_pretty(&counts).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    println!("{:<20} {:<8} {:>10} {:>10} {:>8}", "CATEGORY", "ENABLED", "CANDIDATES", "BOUNDARIES", "HIDDEN");
    for count in &counts {
        println!(
            "{:<20} {:<8} {:>10} {:>10} {:>8}",
            count.id.as_str(),
            if count.enabled { "yes" } else { "no" },
            count.candidates,
            count.boundaries,
            count.hidden
        );
    }
    Ok(())
}

fn cmd_categories() -> Result<(), String> {
    println!("{:<20} {:<22} {:<8} {:<6} STRATEGIES", "ID", "STORAGE KEY", "DEFAULT", "DEPTH");
    for def in default_categories() {
        let mut depths = Vec::new();
        let mut kinds = Vec::new();
        for (strategies, climb) in def.detectors() {
            depths.push(climb.max_depth.to_string());
            kinds.extend(strategies.iter().map(strategy_label));
        }
        println!(
            "{:<20} {:<22} {:<8} {:<6} {}",
            def.id.as_str(),
            def.id.storage_key(),
            if def.id.default_enabled() { "on" } else { "off" },
            depths.join("/"),
            kinds.join(", ")
        );
    }
    Ok(())
}

fn strategy_label(strategy: &Strategy) -> String {
    match strategy {
        Strategy::Geometry { inner, .. } => format!("geometry({})", inner.kind()),
        other => other.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["cf-cli", "-v", "sweep", "--page", "page.json", "--passes", "2", "--json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Sweep { passes: 2, json: true, .. }));

        let cli = Cli::try_parse_from(["cf-cli", "perf-budget", "--units", "10"]).unwrap();
        assert!(matches!(cli.command, Commands::PerfBudget { units: 10, iterations: 50 }));

        assert!(Cli::try_parse_from(["cf-cli", "counts"]).is_err());
    }

    #[test]
    fn test_strategy_labels_name_the_wrapped_kind() {
        let reels = default_categories()
            .iter()
            .find(|d| d.id == cf_core::CategoryId::Reels)
            .unwrap();
        let labels: Vec<String> = reels.detectors().flat_map(|(s, _)| s.iter().map(strategy_label)).collect();
        assert!(labels.contains(&"container-text".to_string()));
        assert!(labels.contains(&"geometry(attribute)".to_string()));
    }
}
