//! WebAssembly bindings for CleanFeed
//!
//! The content-script loader constructs one [`FeedCleaner`] per page with the
//! settings it read from the synced and local stores, calls `start`, and
//! forwards runtime messages to `handleMessage`. Everything else (mutation
//! observation, timers) is wired here.

mod dom;
mod logger;

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use cf_core::{load_settings, Cleaner, Dom, EngineConfig, JsonSource, SettingsError, SettingsSnapshot};
use js_sys::Function;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord, Node};

pub use dom::WebDom;

// =============================================================================
// JS <-> JSON
// =============================================================================

fn to_json(value: &JsValue) -> Result<Value, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Value::Null);
    }
    let text: String = js_sys::JSON::stringify(value)?.into();
    serde_json::from_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|text| js_sys::JSON::parse(&text).ok())
        .unwrap_or(JsValue::UNDEFINED)
}

/// A storage read result, or the `Error` the read rejected with.
fn settings_source(name: &str, value: &JsValue) -> JsonSource {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        let message: String = error.message().into();
        return JsonSource::failed(name, SettingsError::Unavailable(message));
    }
    match to_json(value) {
        Ok(json) => JsonSource::new(name, json),
        Err(_) => JsonSource::failed(name, SettingsError::Malformed("not serializable".into())),
    }
}

fn now_ms() -> u64 {
    let now = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now);
    now.max(0.0) as u64
}

// =============================================================================
// Shared State
// =============================================================================

struct Shared {
    cleaner: Cleaner<WebDom>,
    dom: WebDom,
    timer_fn: Option<Function>,
    timer: Option<(i32, u64)>,
}

impl Shared {
    /// Keep exactly one timeout armed for the scheduler's next deadline.
    fn rearm(&mut self) {
        let deadline = self.cleaner.next_deadline();
        if self.timer.map(|(_, at)| at) == deadline {
            return;
        }
        if let Some((handle, _)) = self.timer.take() {
            self.dom.window().clear_timeout_with_handle(handle);
        }
        let (Some(deadline), Some(callback)) = (deadline, self.timer_fn.as_ref()) else {
            return;
        };
        let delay = deadline.saturating_sub(now_ms()).min(i32::MAX as u64) as i32;
        match self
            .dom
            .window()
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback, delay)
        {
            Ok(handle) => self.timer = Some((handle, deadline)),
            Err(e) => log::warn!("failed to arm timer: {e:?}"),
        }
    }

    fn on_timer(&mut self) {
        self.timer = None;
        let Self { cleaner, dom, .. } = self;
        cleaner.on_timer(dom, now_ms());
        self.rearm();
    }

    fn on_mutations(&mut self, records: &js_sys::Array) {
        let mut roots: Vec<Element> = Vec::new();
        let mut touched = false;
        for record in records.iter() {
            let Ok(record) = record.dyn_into::<MutationRecord>() else {
                continue;
            };
            let added = record.added_nodes();
            for i in 0..added.length() {
                let Some(node) = added.item(i) else { continue };
                touched = true;
                let root = match node.node_type() {
                    Node::ELEMENT_NODE => node.dyn_into::<Element>().ok(),
                    _ => node.parent_element(),
                };
                roots.extend(root);
            }
        }
        if touched {
            self.cleaner.on_mutations(now_ms(), roots);
            self.rearm();
        }
    }
}

// =============================================================================
// FeedCleaner
// =============================================================================

type TimerClosure = Closure<dyn FnMut()>;
type ObserverClosure = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

/// Per-page handle owned by the content script.
#[wasm_bindgen]
pub struct FeedCleaner {
    shared: Rc<RefCell<Shared>>,
    observer: Option<MutationObserver>,
    _on_timer: Option<TimerClosure>,
    _on_mutations: Option<ObserverClosure>,
}

#[wasm_bindgen]
impl FeedCleaner {
    /// `syncSettings` / `localSettings` are storage read results (an object,
    /// `undefined`, or the `Error` the read failed with); `config` is an
    /// optional engine config object.
    #[wasm_bindgen(constructor)]
    pub fn new(sync_settings: JsValue, local_settings: JsValue, config: JsValue) -> Result<FeedCleaner, JsValue> {
        logger::install_default(log::LevelFilter::Warn);

        let config = match to_json(&config)? {
            Value::Null => EngineConfig::default(),
            json => EngineConfig::from_json(&json).map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?,
        };
        let sync = settings_source("sync", &sync_settings);
        let local = settings_source("local", &local_settings);
        let settings = load_settings(&[&sync, &local]);

        let dom = WebDom::from_window().map_err(|e| JsValue::from_str(&e.to_string()))?;
        let shared = Shared {
            cleaner: Cleaner::new(&settings, &config),
            dom,
            timer_fn: None,
            timer: None,
        };

        Ok(FeedCleaner {
            shared: Rc::new(RefCell::new(shared)),
            observer: None,
            _on_timer: None,
            _on_mutations: None,
        })
    }

    /// Observe the page and arm the initial passes. Idempotent.
    pub fn start(&mut self) -> Result<(), JsValue> {
        if self.observer.is_some() {
            return Ok(());
        }

        let weak = Rc::downgrade(&self.shared);
        let on_timer: TimerClosure = Closure::new(move || {
            let Some(shared) = weak.upgrade() else { return };
            let Ok(mut state) = shared.try_borrow_mut() else { return };
            state.on_timer();
        });

        let weak = Rc::downgrade(&self.shared);
        let on_mutations: ObserverClosure = Closure::new(move |records: js_sys::Array, _: MutationObserver| {
            let Some(shared) = weak.upgrade() else { return };
            let Ok(mut state) = shared.try_borrow_mut() else { return };
            state.on_mutations(&records);
        });

        let observer = MutationObserver::new(on_mutations.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);

        {
            let mut state = self.shared.try_borrow_mut().map_err(|_| JsValue::from_str("busy"))?;
            let target = state.dom.body().or_else(|| state.dom.document_element());
            let target = target.ok_or_else(|| JsValue::from_str("document has no root element"))?;
            observer.observe_with_options(&target, &options)?;

            state.timer_fn = Some(on_timer.as_ref().unchecked_ref::<Function>().clone());
            state.cleaner.start(now_ms());
            state.rearm();
        }

        log::info!("cleanfeed started");
        self.observer = Some(observer);
        self._on_timer = Some(on_timer);
        self._on_mutations = Some(on_mutations);
        Ok(())
    }

    /// Disconnect the observer and cancel the timer. Hidden nodes stay hidden.
    pub fn stop(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        if let Ok(mut state) = self.shared.try_borrow_mut() {
            if let Some((handle, _)) = state.timer.take() {
                state.dom.window().clear_timeout_with_handle(handle);
            }
            state.timer_fn = None;
        }
        self._on_timer = None;
        self._on_mutations = None;
    }

    /// Runtime message entry point. Returns the response object, or
    /// `undefined` when the message is not for us.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue) -> Result<JsValue, JsValue> {
        let message = to_json(&message)?;
        let mut state = self.borrow()?;
        let Shared { cleaner, dom, .. } = &mut *state;
        let response = cleaner.handle_message(dom, &message, now_ms());
        state.rearm();
        Ok(response.map_or(JsValue::UNDEFINED, |r| to_js(&r)))
    }

    /// Run a whole-document pass now; returns its report.
    #[wasm_bindgen(js_name = forceSweep)]
    pub fn force_sweep(&self) -> Result<JsValue, JsValue> {
        let mut state = self.borrow()?;
        let Shared { cleaner, dom, .. } = &mut *state;
        let report = cleaner.force_sweep(dom, now_ms());
        state.rearm();
        Ok(report.map_or(JsValue::UNDEFINED, |r| to_js(&r)))
    }

    /// Un-hide everything; returns how many nodes were restored.
    #[wasm_bindgen(js_name = forceRestore)]
    pub fn force_restore(&self) -> Result<u32, JsValue> {
        let mut state = self.borrow()?;
        let Shared { cleaner, dom, .. } = &mut *state;
        Ok(cleaner.force_restore(dom) as u32)
    }

    /// Per-category diagnostics.
    #[wasm_bindgen(js_name = matchCounts)]
    pub fn match_counts(&self) -> Result<JsValue, JsValue> {
        let state = self.shared.try_borrow().map_err(|_| JsValue::from_str("busy"))?;
        Ok(to_js(&state.cleaner.match_counts(&state.dom)))
    }

    /// Flags currently in effect, keyed by storage key.
    pub fn settings(&self) -> Result<JsValue, JsValue> {
        let state = self.shared.try_borrow().map_err(|_| JsValue::from_str("busy"))?;
        let settings: SettingsSnapshot = state.cleaner.engine().settings();
        Ok(to_js(&settings))
    }

    #[wasm_bindgen(js_name = passCount)]
    pub fn pass_count(&self) -> f64 {
        self.shared
            .try_borrow()
            .map(|s| s.cleaner.scheduler().passes() as f64)
            .unwrap_or(0.0)
    }
}

impl FeedCleaner {
    fn borrow(&self) -> Result<RefMut<'_, Shared>, JsValue> {
        self.shared.try_borrow_mut().map_err(|_| JsValue::from_str("busy"))
    }
}

impl Drop for FeedCleaner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Console log level: "off", "error", "warn", "info", "debug" or "trace".
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = logger::parse_level(level).ok_or_else(|| JsValue::from_str("unknown log level"))?;
    logger::init(filter);
    Ok(())
}
