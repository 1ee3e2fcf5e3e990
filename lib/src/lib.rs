//! Data layer for supervisor-authored training programs.
//!
//! Remote reads go through [`LegacyGateway`] and [`ContentGateway`], which
//! substitute bundled datasets whenever the services fail. Programs,
//! assignments and enrollments go through [`LocalGateway`], backed by a
//! single persisted document in [`LocalStore`]. The [`resolve`] functions
//! derive statuses and metrics from what those gateways return.

pub mod builder;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod fallback;
pub mod fetch;
mod helpers;
pub mod local;
pub mod raw_data;
pub mod remote;
pub mod resolve;
pub mod store;

pub use builder::{CatalogFilter, ProgramDraft};
pub use config::{Environment, GatewayConfig};
pub use dashboard::Dashboard;
pub use error::{FetchError, GatewayError, Result};
pub use fetch::Fetcher;
pub use local::{BatchReport, LocalGateway, Record};
pub use remote::{ContentGateway, InventoryLookup, InventoryMap, LegacyGateway};
pub use store::{FileStorage, LocalStore, MemoryStorage, StorageBackend, WriteOutcome};
