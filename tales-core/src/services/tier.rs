//! Tier resolver - derives the access tier from identity and premium override

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::result::Result;
use crate::domain::{Tier, UserIdentity};
use crate::ports::{Clock, KeyValueStore};

/// Persisted tier override written by a completed upgrade flow
pub const USER_TIER_KEY: &str = "userTier";
/// Timestamp of the completed upgrade; the override only counts when present
pub const UPGRADE_DATE_KEY: &str = "upgradeDate";

/// Reads the persisted premium override and resolves tiers against it
pub struct TierResolver {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl TierResolver {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Whether a completed upgrade is on record
    pub fn premium_override(&self) -> Result<bool> {
        let tier = self.store.get(USER_TIER_KEY)?;
        if tier.as_deref() != Some(Tier::Premium.as_str()) {
            return Ok(false);
        }
        Ok(self.store.get(UPGRADE_DATE_KEY)?.is_some())
    }

    /// Resolve the tier for `identity`, `None` while no identity is loaded
    pub fn tier(&self, identity: Option<&UserIdentity>) -> Result<Option<Tier>> {
        if identity.is_none() {
            return Ok(None);
        }
        Ok(Tier::resolve_ready(identity, self.premium_override()?))
    }

    /// When the premium upgrade happened, if it did
    pub fn upgraded_at(&self) -> Result<Option<DateTime<Utc>>> {
        if !self.premium_override()? {
            return Ok(None);
        }
        let raw = self.store.get(UPGRADE_DATE_KEY)?;
        Ok(raw.and_then(|r| match DateTime::parse_from_rfc3339(&r) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                warn!(key = UPGRADE_DATE_KEY, "unparsable upgrade date: {}", e);
                None
            }
        }))
    }

    /// Record a completed premium upgrade
    ///
    /// The date is written first so a half-finished write never yields an
    /// override; if the tier write fails the date is removed again.
    pub fn upgrade_to_premium(&self) -> Result<()> {
        let now = DateTime::<Utc>::from_timestamp_millis(self.clock.now_ms()).unwrap_or_default();
        self.store.set(UPGRADE_DATE_KEY, &now.to_rfc3339())?;
        if let Err(e) = self.store.set(USER_TIER_KEY, Tier::Premium.as_str()) {
            if let Err(undo) = self.store.remove(UPGRADE_DATE_KEY) {
                warn!("could not roll back upgrade date: {}", undo);
            }
            return Err(e);
        }
        info!("premium override recorded");
        Ok(())
    }

    /// Drop the premium override (support tooling)
    pub fn downgrade(&self) -> Result<()> {
        self.store.remove(USER_TIER_KEY)?;
        self.store.remove(UPGRADE_DATE_KEY)?;
        Ok(())
    }
}
