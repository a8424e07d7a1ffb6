//! Tales Core - access tiers, quotas and saved items for a travel app
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Tier, QuotaState, SavedSet, Tale, etc.)
//! - **ports**: Trait definitions for external collaborators (KeyValueStore, Clock)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, in-memory, clocks)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use adapters::{DuckDbStore, SystemClock};
use config::Config;
use ports::{Clock, KeyValueStore};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, Result};
pub use domain::{
    AiOutcome, Notification, NotificationDraft, NotificationKind, QuotaPolicy, QuotaState,
    SaveOutcome, Tale, TaleKind, Tier, TrialInfo, UpgradeTrigger, UserIdentity,
};

const STATE_DB_FILE: &str = "tales.duckdb";

/// Snapshot of everything the status screen shows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub identity: Option<UserIdentity>,
    pub tier: Option<Tier>,
    pub quota: QuotaState,
    pub trial: TrialInfo,
    /// `None` means unlimited
    pub ai_daily_limit: Option<u32>,
    pub saved_count: usize,
    pub premium_since: Option<DateTime<Utc>>,
}

/// Main context for Tales operations
///
/// Holds the store, configuration and all services. Every operation acts
/// on the identity currently held by the session.
pub struct TalesContext {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub session: SessionService,
    pub tiers: Arc<TierResolver>,
    pub quota: Arc<QuotaTracker>,
    pub ledger: SavedItemsLedger,
    pub notifications: Arc<NotificationCenter>,
    pub catalog: CatalogService,
    pub latency: SimulatedLatency,
}

impl TalesContext {
    /// Open the context on the DuckDB store in `data_dir`
    pub fn new(data_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let config = Config::load(data_dir)?;
        let store = Arc::new(DuckDbStore::open(&data_dir.join(STATE_DB_FILE))?);
        Ok(Self::with_store(config, store, Arc::new(SystemClock))?)
    }

    /// Build a context over any store and clock
    pub fn with_store(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let tiers = Arc::new(TierResolver::new(Arc::clone(&store), Arc::clone(&clock)));
        let quota = Arc::new(QuotaTracker::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.quota,
        ));
        let notifications = Arc::new(NotificationCenter::new(
            Arc::clone(&clock),
            config.notification_capacity,
        ));
        let ledger = SavedItemsLedger::new(
            Arc::clone(&store),
            Arc::clone(&tiers),
            Arc::clone(&quota),
            Arc::clone(&notifications),
        );

        Ok(Self {
            session: SessionService::new(Arc::clone(&store)),
            catalog: CatalogService::from_demo()?,
            latency: SimulatedLatency::new(config.simulated_latency),
            config,
            store,
            tiers,
            quota,
            ledger,
            notifications,
        })
    }

    /// Restore or create the session identity
    pub fn bootstrap(&self) -> Result<UserIdentity> {
        let user = self.session.bootstrap()?;
        self.ledger.reload(&user.id)?;
        Ok(user)
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        self.session.current()
    }

    /// Tier of the current identity, `None` while not ready
    pub fn current_tier(&self) -> Result<Option<Tier>> {
        self.tiers.tier(self.identity().as_ref())
    }

    pub fn toggle_save(&self, item_id: &str) -> Result<SaveOutcome> {
        self.ledger.toggle_save(self.identity().as_ref(), item_id)
    }

    /// [`Self::toggle_save`] behind the simulated network delay
    pub async fn toggle_save_async(&self, item_id: &str) -> Result<SaveOutcome> {
        self.latency.run(|| self.toggle_save(item_id)).await
    }

    /// Gate one AI companion use, counting it when allowed
    pub fn use_ai(&self) -> Result<AiOutcome> {
        let Some(tier) = self.current_tier()? else {
            return Err(Error::NotReady);
        };

        let outcome = self.quota.try_use_ai(tier)?;
        if let AiOutcome::Blocked { usage_today, .. } = outcome {
            info!(%tier, usage = usage_today, "AI use blocked");
            self.notifications.push(
                NotificationDraft::warning(
                    "Daily AI limit reached",
                    "Upgrade for unlimited AI companion access",
                )
                .with_upgrade(UpgradeTrigger::AiLimit),
            );
        }
        Ok(outcome)
    }

    /// Complete the premium upgrade and restore the trial allotment
    pub fn upgrade_to_premium(&self) -> Result<()> {
        self.tiers.upgrade_to_premium()?;
        self.quota.reset_trial()?;
        self.notifications.push(NotificationDraft::success(
            "Welcome to Premium!",
            "Unlimited saves and AI companion access unlocked",
        ));
        Ok(())
    }

    pub fn sign_up(&self, email: &str) -> Result<UserIdentity> {
        let user = self.session.sign_up(email)?;
        self.ledger.reload(&user.id)?;
        Ok(user)
    }

    pub fn sign_in(&self, email: &str) -> Result<UserIdentity> {
        let user = self.session.sign_in(email)?;
        self.ledger.reload(&user.id)?;
        Ok(user)
    }

    pub fn sign_in_anonymously(&self) -> Result<UserIdentity> {
        let user = self.session.sign_in_anonymously()?;
        self.ledger.reload(&user.id)?;
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<()> {
        self.session.sign_out()
    }

    /// Saved identifiers of the current identity, empty when not ready
    pub fn saved_ids(&self) -> Result<Vec<String>> {
        match self.identity() {
            Some(user) => self.ledger.saved_ids(&user.id),
            None => Ok(Vec::new()),
        }
    }

    pub fn saved_tales(&self) -> Result<Vec<&Tale>> {
        Ok(self.catalog.saved_tales(self.saved_ids()?))
    }

    pub fn status(&self) -> Result<StatusSummary> {
        let identity = self.identity();
        let tier = self.tiers.tier(identity.as_ref())?;
        let quota = self.quota.state()?;
        let saved_count = match &identity {
            Some(user) => self.ledger.count(&user.id)?,
            None => 0,
        };

        Ok(StatusSummary {
            trial: quota.trial_info(self.quota.policy()),
            ai_daily_limit: tier.and_then(|t| self.quota.policy().ai_daily_limit(t)),
            premium_since: self.tiers.upgraded_at()?,
            identity,
            tier,
            quota,
            saved_count,
        })
    }
}
