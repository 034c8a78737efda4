//! Carbon Ledger - per-user emission records with durable typed stores
//!
//! Callers submit raw activity quantities; the ledger looks up the
//! environmental factor published for that activity and date, stores the
//! adjusted record in the caller's append-only history, and reports totals
//! with a recommendation.
//!
//! ## Architecture
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | Five stable maps over one sled database |
//! | [`keys`] | Deterministic key derivation for factors and records |
//! | [`pipeline`] | Validate, look up factor, compute, append |
//! | [`report`] | Totals and recommendations (read-only) |
//! | [`provision`] | Registration, factors, settings, catalog |
//! | [`ledger`] | Caller-bound facade used by hosts |
//!
//! The host supplies caller identity and guarantees one invocation at a
//! time. No authorization happens here.
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/carbon-ledger/
//! ├── ledger.sled/     # Stable maps (see store module)
//! └── config.toml      # Configuration
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod keys;
pub mod ledger;
pub mod models;
pub mod pipeline;
pub mod provision;
pub mod report;
pub mod store;

// Re-exports
pub use config::Config;
pub use error::LedgerError;
pub use identity::{CallerIdentity, IdentityProvider, StaticIdentity};
pub use keys::EntityKey;
pub use ledger::Ledger;
pub use models::{
    ActivityType, BenchmarkData, EmissionRecord, EnvironmentalFactors, UserActivityHistory, UserData,
    UserSettings,
};
pub use pipeline::EmissionSubmission;
pub use store::{MapId, StableMap, Stores};
