//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one part of the gating workflow.

mod catalog;
mod latency;
mod ledger;
pub mod logging;
pub mod migration;
mod notifications;
pub mod quota;
mod session;
pub mod tier;

pub use catalog::CatalogService;
pub use latency::SimulatedLatency;
pub use ledger::SavedItemsLedger;
pub use logging::{events, EntryPoint, LogEntry, LogEvent, LogFilter, LoggingService, TierActivity};
pub use migration::{MigrationResult, MigrationService};
pub use notifications::NotificationCenter;
pub use quota::QuotaTracker;
pub use session::{SessionService, LOCAL_USER_KEY};
pub use tier::TierResolver;
