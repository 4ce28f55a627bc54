//! Sweep Engine
//!
//! One pass = for every enabled category, run its strategies over the scopes,
//! promote the candidates through the resolver, and hand the surviving
//! boundaries to the ledger. The engine owns no DOM and no clock; the runtime
//! decides when a pass runs and over which scopes.

use std::fmt;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::dom::Dom;
use crate::ledger::SuppressionLedger;
use crate::registry::{CategoryDef, CategoryRegistry};
use crate::resolver::{resolve, Guard};
use crate::settings::SettingsSnapshot;
use crate::strategy::{Candidate, Strategy};
use crate::types::CategoryId;

// =============================================================================
// Reports
// =============================================================================

/// Per-category tally of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub id: CategoryId,
    pub candidates: usize,
    pub boundaries: usize,
    pub hidden: usize,
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Subtrees swept; 1 for a whole-document pass.
    pub scopes: usize,
    /// Nodes newly hidden by this pass.
    pub hidden: usize,
    pub candidates: usize,
    pub boundaries: usize,
    /// Strategy runs that failed and contributed nothing.
    pub strategy_errors: usize,
    /// Boundaries the ledger could not collapse.
    pub apply_errors: usize,
    /// Ledger records dropped because the page removed their node.
    pub pruned: usize,
    pub per_category: Vec<CategoryTally>,
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hidden, {} boundaries from {} candidates",
            self.hidden, self.boundaries, self.candidates
        )?;
        if self.strategy_errors > 0 || self.apply_errors > 0 {
            write!(f, " ({} strategy errors, {} apply errors)", self.strategy_errors, self.apply_errors)?;
        }
        Ok(())
    }
}

/// Diagnostic snapshot for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub id: CategoryId,
    pub label: &'static str,
    pub enabled: bool,
    /// Candidates the strategies find right now.
    pub candidates: usize,
    /// Boundaries those candidates resolve to right now.
    pub boundaries: usize,
    /// Nodes currently hidden for this category.
    pub hidden: usize,
}

// =============================================================================
// Engine
// =============================================================================

/// Registry + ledger + guard settings. Generic over the host node handle.
#[derive(Debug, Clone)]
pub struct Engine<N> {
    registry: CategoryRegistry,
    ledger: SuppressionLedger<N>,
    protected_classes: Vec<String>,
    profile_names: Vec<String>,
}

struct Plan<N> {
    candidates: usize,
    boundaries: Vec<N>,
}

impl<N: Clone + PartialEq + fmt::Debug> Engine<N> {
    pub fn new(settings: &SettingsSnapshot, config: &EngineConfig) -> Self {
        Self::with_registry(CategoryRegistry::new(settings), config)
    }

    pub fn with_registry(registry: CategoryRegistry, config: &EngineConfig) -> Self {
        Self {
            registry,
            ledger: SuppressionLedger::new(),
            protected_classes: config.protected_classes.clone(),
            profile_names: config.profile_names.clone(),
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &SuppressionLedger<N> {
        &self.ledger
    }

    /// Flags currently cached.
    pub fn settings(&self) -> SettingsSnapshot {
        SettingsSnapshot::from_mask(self.registry.enabled_mask())
    }

    /// Replace the cached flags. Does not touch the page.
    pub fn update_settings(&mut self, settings: &SettingsSnapshot) {
        self.registry.apply_settings(settings);
    }

    /// Sweep the whole document body.
    pub fn sweep_document<D: Dom<Node = N>>(&mut self, dom: &mut D) -> SweepReport {
        match dom.body() {
            Some(body) => self.sweep(dom, &[body]),
            None => {
                log::debug!("no document body yet, skipping pass");
                SweepReport::default()
            }
        }
    }

    /// Run every enabled category over `scopes` and hide what resolves.
    pub fn sweep<D: Dom<Node = N>>(&mut self, dom: &mut D, scopes: &[N]) -> SweepReport {
        let mut report = SweepReport {
            scopes: scopes.len(),
            pruned: self.ledger.prune(dom),
            ..SweepReport::default()
        };
        let guard = Guard::collect(dom, &self.protected_classes, &self.profile_names);
        let enabled: Vec<&'static CategoryDef> = self.registry.enabled().collect();

        for def in enabled {
            let plan = self.plan(dom, def, scopes, &guard, &mut report.strategy_errors);
            let mut tally = CategoryTally {
                id: def.id,
                candidates: plan.candidates,
                boundaries: plan.boundaries.len(),
                hidden: 0,
            };

            for boundary in &plan.boundaries {
                match self.ledger.apply(dom, boundary, def.id) {
                    Ok(true) => {
                        log::trace!("{}: hid {:?}", def.id, boundary);
                        tally.hidden += 1;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        log::warn!("{}: failed to hide {:?}: {}", def.id, boundary, e);
                        report.apply_errors += 1;
                    }
                }
            }

            report.candidates += tally.candidates;
            report.boundaries += tally.boundaries;
            report.hidden += tally.hidden;
            report.per_category.push(tally);
        }

        log::debug!("sweep over {} scope(s): {}", report.scopes, report);
        report
    }

    /// Un-hide everything this engine hid.
    pub fn restore_all<D: Dom<Node = N>>(&mut self, dom: &mut D) -> usize {
        let restored = self.ledger.restore_all(dom);
        log::debug!("restored {restored} node(s)");
        restored
    }

    /// Per-category diagnostics over the whole document, enabled or not.
    /// Read-only: nothing is hidden.
    pub fn match_counts<D: Dom<Node = N>>(&self, dom: &D) -> Vec<CategoryCount> {
        let guard = Guard::collect(dom, &self.protected_classes, &self.profile_names);
        let scopes: Vec<N> = dom.body().into_iter().collect();
        let mut errors = 0;

        self.registry
            .definitions()
            .iter()
            .map(|def| {
                let plan = self.plan(dom, def, &scopes, &guard, &mut errors);
                CategoryCount {
                    id: def.id,
                    label: def.label,
                    enabled: self.registry.is_enabled(def.id),
                    candidates: plan.candidates,
                    boundaries: plan.boundaries.len(),
                    hidden: self.ledger.hidden_by(def.id),
                }
            })
            .collect()
    }

    /// Candidates and deduplicated, outermost-only boundaries for `def`.
    fn plan<D: Dom<Node = N>>(
        &self,
        dom: &D,
        def: &CategoryDef,
        scopes: &[N],
        guard: &Guard<N>,
        strategy_errors: &mut usize,
    ) -> Plan<N> {
        let mut seen: Vec<N> = Vec::new();
        let mut boundaries: Vec<N> = Vec::new();
        for (strategies, climb) in def.detectors() {
            for candidate in collect_candidates(dom, def.id, strategies, scopes, strategy_errors) {
                // First detector to find a node decides its climb.
                if seen.contains(&candidate.node) {
                    continue;
                }
                seen.push(candidate.node.clone());
                if let Some(node) = resolve(dom, &candidate, climb, guard) {
                    if !boundaries.contains(&node) {
                        boundaries.push(node);
                    }
                }
            }
        }

        // Outermost wins; also skip sections already inside one of ours.
        let kept: Vec<N> = boundaries
            .iter()
            .filter(|node| {
                !boundaries.iter().any(|other| other != *node && dom.contains(other, node))
                    && !self
                        .ledger
                        .nodes()
                        .any(|(hidden, id)| id == def.id && hidden != *node && dom.contains(hidden, node))
            })
            .cloned()
            .collect();

        Plan {
            candidates: seen.len(),
            boundaries: kept,
        }
    }
}

/// Union of every strategy's candidates over every scope. A failing strategy
/// contributes nothing; the others still run.
fn collect_candidates<D: Dom>(
    dom: &D,
    category: CategoryId,
    strategies: &[Strategy],
    scopes: &[D::Node],
    strategy_errors: &mut usize,
) -> Vec<Candidate<D::Node>> {
    let mut out: Vec<Candidate<D::Node>> = Vec::new();
    for strategy in strategies {
        for scope in scopes {
            match strategy.collect(dom, scope, category) {
                Ok(found) => {
                    for candidate in found {
                        if !out.iter().any(|c| c.node == candidate.node) {
                            out.push(candidate);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("{}: {} strategy failed: {}", category, strategy.kind(), e);
                    *strategy_errors += 1;
                }
            }
        }
    }
    out
}
