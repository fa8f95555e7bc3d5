//! Sync engine services
//!
//! Scheduling, per-card resolution, the retry backlog, the remote catalog
//! client, the run orchestrator and vocabulary refresh.

pub mod backlog;
pub mod catalog;
pub mod orchestrator;
pub mod pipeline;
pub mod remote_client;
pub mod scheduler;
pub mod seed;

pub use backlog::{BacklogEntry, RetryBacklog};
pub use catalog::{refresh_from_cards, refresh_from_source, CatalogValueSource};
pub use orchestrator::{RunSummary, SyncOrchestrator};
pub use pipeline::{CardOutcome, CardTask, DeferReason, FetchMode, ResolutionPipeline};
pub use remote_client::{PokemonTcgClient, RemoteSource, DEFAULT_BASE_URL};
pub use scheduler::run_bounded;
pub use seed::{import_sets_document, import_sets_file};
