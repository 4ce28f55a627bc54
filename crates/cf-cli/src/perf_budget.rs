use std::time::Instant;

use cf_core::synthetic::{expected_feed_hits, synthetic_feed};
use cf_core::{CategoryId, Dom, Engine, EngineConfig, MemoryDom, NodeId, SettingsSnapshot};

pub struct PerfBudgetOptions {
    pub units: usize,
    pub iterations: usize,
}

const BUDGET_FULL_PASS_P99_MS: f64 = 16.0;
const BUDGET_STEADY_PASS_P99_MS: f64 = 8.0;
const BUDGET_RESTORE_MS: f64 = 16.0;

pub fn run_perf_budget(opts: PerfBudgetOptions) -> Result<(), String> {
    if opts.units == 0 || opts.iterations == 0 {
        return Err("units and iterations must be positive".to_string());
    }

    println!("Performance Budget Check");
    println!("==================================================");
    println!("Synthetic feed: {} units, {} iterations", opts.units, opts.iterations);

    let page = synthetic_feed(opts.units);
    let settings = SettingsSnapshot::defaults();
    let config = EngineConfig::default();

    println!("Checking correctness...");
    let mut dom = page.clone();
    let mut engine: Engine<NodeId> = Engine::new(&settings, &config);
    engine.sweep_document(&mut dom);
    let feed_hidden = engine.ledger().hidden_by(CategoryId::Reels)
        + engine.ledger().hidden_by(CategoryId::FriendSuggestions);
    let expected = expected_feed_hits(opts.units);
    if feed_hidden != expected {
        return Err(format!("Expected {} hidden feed units, got {}", expected, feed_hidden));
    }

    println!("Measuring full passes...");
    let full = measure(opts.iterations, || {
        let mut dom = page.clone();
        let mut engine = Engine::new(&settings, &config);
        let start = Instant::now();
        engine.sweep_document(&mut dom);
        elapsed_ms(start)
    });

    println!("Measuring steady-state passes...");
    let steady = measure(opts.iterations, || {
        let start = Instant::now();
        engine.sweep_document(&mut dom);
        elapsed_ms(start)
    });

    let restore_start = Instant::now();
    let restored = engine.restore_all(&mut dom);
    let restore_ms = elapsed_ms(restore_start);
    log::debug!("restored {restored} node(s)");
    if !is_clean(&dom) {
        return Err("Restore left collapsed nodes behind".to_string());
    }

    let mut passed = true;
    println!();
    println!("Results");
    println!("--------------------------------------------------");

    println!("  Full pass P50: {:.3} ms", percentile(&full, 0.50));
    passed &= report_budget("Full Pass P99", percentile(&full, 0.99), BUDGET_FULL_PASS_P99_MS, "ms");
    passed &= report_budget("Steady Pass P99", percentile(&steady, 0.99), BUDGET_STEADY_PASS_P99_MS, "ms");
    passed &= report_budget("Restore All", restore_ms, BUDGET_RESTORE_MS, "ms");

    println!();
    println!("==================================================");

    if passed {
        println!("✓ All performance budgets passed");
        Ok(())
    } else {
        Err("Performance budget exceeded".to_string())
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn measure(iterations: usize, mut run: impl FnMut() -> f64) -> Vec<f64> {
    let mut samples: Vec<f64> = (0..iterations).map(|_| run()).collect();
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    samples
}

fn is_clean(dom: &MemoryDom) -> bool {
    dom.descendants(&dom.root())
        .map(|nodes| nodes.iter().all(|n| !dom.is_collapsed(*n)))
        .unwrap_or(false)
}

fn report_budget(name: &str, actual: f64, limit: f64, unit: &str) -> bool {
    let passed = actual <= limit;
    let status = if passed { "✓" } else { "✗" };
    println!(
        "{} {}: {:.3} {} (limit: {:.2} {})",
        status, name, actual, unit, limit, unit
    );
    passed
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile() {
        let samples = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&samples, 0.5), 2.0);
        assert_eq!(percentile(&samples, 0.99), 4.0);
        assert_eq!(percentile(&[], 0.99), 0.0);
    }
}
