//! CleanFeed Core Library
//!
//! Heuristic classification and idempotent suppression of page sections on a
//! continuously mutating feed page. The engine is host-agnostic: it talks to
//! the document only through the [`Dom`] trait and to the clock only through
//! the timestamps its caller passes in.
//!
//! # Architecture
//!
//! A sweep pass runs every enabled category's matcher strategies over a scope,
//! promotes each candidate to the container that represents the whole section,
//! and collapses that container through the suppression ledger. The ledger
//! stamps what it hid, so re-running a pass is a no-op and every suppression
//! can be reverted exactly.
//!
//! # Modules
//!
//! - `types`: Category ids, masks, regions and geometry
//! - `dom`: The host document abstraction and attribute selectors
//! - `tree`: In-memory document for tests and tools
//! - `strategy`: Matcher strategies (label, phrase, attribute, container text, geometry)
//! - `resolver`: Bounded, guarded climb from candidate to boundary
//! - `ledger`: Stamping, collapsing and restoring hidden nodes
//! - `registry`: The static category table and enabled flags
//! - `settings`: Settings snapshot, sources and the fallback chain
//! - `message`: The settings-UI request/response protocol
//! - `scheduler`: When passes run (initial, debounced, fallback, follow-up)
//! - `config`: Construction-time tunables
//! - `engine`: One sweep pass, restore, diagnostics
//! - `runtime`: Engine + scheduler glue embedded by hosts
//! - `synthetic`: Generated feed pages for benchmarks and budgets

pub mod config;
pub mod dom;
pub mod engine;
pub mod ledger;
pub mod message;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod scheduler;
pub mod settings;
pub mod strategy;
pub mod synthetic;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use dom::{AttrSelector, Dom, DomError};
pub use engine::{CategoryCount, Engine, SweepReport};
pub use ledger::{SuppressionLedger, STAMP_ATTR};
pub use message::{parse_request, Request, Response};
pub use registry::{CategoryDef, CategoryRegistry};
pub use runtime::Cleaner;
pub use scheduler::{SchedulerConfig, SweepScheduler, Trigger};
pub use settings::{load_settings, JsonSource, SettingsError, SettingsSnapshot, SettingsSource};
pub use tree::{MemoryDom, NodeId};
pub use types::{CategoryId, CategoryMask, Rect, RegionMask, StyleValue, Viewport};
