//! Core domain entities
//!
//! Pure data structures with their invariants - no I/O or storage access.

mod identity;
mod notification;
pub mod quota;
pub mod result;
pub mod saved;
mod tale;
mod tier;

pub use identity::UserIdentity;
pub use notification::{Notification, NotificationDraft, NotificationKind, UpgradeTrigger};
pub use quota::{AiOutcome, QuotaPolicy, QuotaState, TrialInfo};
pub use saved::{SaveOutcome, SavedSet};
pub use tale::{Tale, TaleKind};
pub use tier::Tier;
