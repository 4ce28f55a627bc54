//! Runtime glue
//!
//! [`Cleaner`] is what a host embeds: it couples the engine to the sweep
//! scheduler, buffers the subtrees the page inserted, and implements the
//! settings-change and message protocol. The host supplies the clock and the
//! timer; see `cf-wasm` for the browser wiring.

use serde_json::Value;

use crate::config::EngineConfig;
use crate::dom::Dom;
use crate::engine::{CategoryCount, Engine, SweepReport};
use crate::message::{parse_request, Request, Response};
use crate::scheduler::{SweepScheduler, Trigger};
use crate::settings::SettingsSnapshot;

/// Engine + scheduler + pending inserted subtrees for one page.
pub struct Cleaner<D: Dom> {
    engine: Engine<D::Node>,
    scheduler: SweepScheduler,
    pending: Vec<D::Node>,
    overflowed: bool,
    max_pending_roots: usize,
}

impl<D: Dom> Cleaner<D> {
    pub fn new(settings: &SettingsSnapshot, config: &EngineConfig) -> Self {
        Self::with_engine(Engine::new(settings, config), config)
    }

    pub fn with_engine(engine: Engine<D::Node>, config: &EngineConfig) -> Self {
        Self {
            engine,
            scheduler: SweepScheduler::new(config.scheduler.clone()),
            pending: Vec::new(),
            overflowed: false,
            max_pending_roots: config.max_pending_roots,
        }
    }

    pub fn engine(&self) -> &Engine<D::Node> {
        &self.engine
    }

    pub fn scheduler(&self) -> &SweepScheduler {
        &self.scheduler
    }

    /// Arm the initial and fallback passes.
    pub fn start(&mut self, now: u64) {
        self.scheduler.start(now);
    }

    /// Earliest moment `on_timer` has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Record a batch of mutation notifications and the subtrees they added.
    pub fn on_mutations(&mut self, now: u64, added_roots: impl IntoIterator<Item = D::Node>) {
        for root in added_roots {
            if self.overflowed {
                break;
            }
            if self.pending.contains(&root) {
                continue;
            }
            if self.pending.len() >= self.max_pending_roots {
                log::trace!("more than {} inserted subtrees, next pass is full", self.max_pending_roots);
                self.pending.clear();
                self.overflowed = true;
                break;
            }
            self.pending.push(root);
        }
        self.scheduler.notify_mutations(now);
    }

    /// Run the pass due at `now`, if any.
    pub fn on_timer(&mut self, dom: &mut D, now: u64) -> Option<SweepReport> {
        let trigger = self.scheduler.poll(now)?;
        self.run(dom, trigger, now)
    }

    /// Undo every suppression, cache the new flags, and sweep again at once.
    pub fn update_settings(&mut self, dom: &mut D, settings: &SettingsSnapshot, now: u64) -> Option<SweepReport> {
        let restored = self.engine.restore_all(dom);
        self.engine.update_settings(settings);
        log::info!("settings updated, {restored} node(s) restored");
        self.run(dom, Trigger::Settings, now)
    }

    /// Answer a message from the settings UI. `None` means "not for us".
    pub fn handle_message(&mut self, dom: &mut D, message: &Value, now: u64) -> Option<Response> {
        match parse_request(message)? {
            Request::UpdateSettings { settings } => {
                let merged = self.engine.settings().merged(&settings);
                self.update_settings(dom, &merged, now);
                Some(Response::ok())
            }
        }
    }

    /// Sweep the whole document now.
    pub fn force_sweep(&mut self, dom: &mut D, now: u64) -> Option<SweepReport> {
        self.run(dom, Trigger::Manual, now)
    }

    /// Un-hide everything. Flags are left as they are.
    pub fn force_restore(&mut self, dom: &mut D) -> usize {
        self.engine.restore_all(dom)
    }

    pub fn match_counts(&self, dom: &D) -> Vec<CategoryCount> {
        self.engine.match_counts(dom)
    }

    fn run(&mut self, dom: &mut D, trigger: Trigger, now: u64) -> Option<SweepReport> {
        if !self.scheduler.try_begin(trigger) {
            return None;
        }

        let report = match self.take_scopes(dom, trigger) {
            Some(scopes) => self.engine.sweep(dom, &scopes),
            None => self.engine.sweep_document(dom),
        };
        self.scheduler.finish(now);

        log::debug!("{} pass #{}: {}", trigger.as_str(), self.scheduler.passes(), report);
        Some(report)
    }

    /// Subtrees for an incremental pass, or `None` for a whole-document one.
    /// Either way the buffer is emptied.
    fn take_scopes(&mut self, dom: &D, trigger: Trigger) -> Option<Vec<D::Node>> {
        let pending = std::mem::take(&mut self.pending);
        let overflowed = std::mem::replace(&mut self.overflowed, false);

        if !trigger.is_incremental() || overflowed || pending.is_empty() {
            return None;
        }
        if pending.iter().any(|root| !dom.is_connected(root)) {
            return None;
        }

        // A root inside another pending root is already covered.
        let scopes: Vec<D::Node> = pending
            .iter()
            .filter(|root| !pending.iter().any(|other| other != *root && dom.contains(other, root)))
            .cloned()
            .collect();
        Some(scopes)
    }
}
