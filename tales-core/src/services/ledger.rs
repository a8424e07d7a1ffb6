//! Saved-items ledger - per-user saved tales and the toggle-save workflow
//!
//! Toggles run one at a time: the cache lock is held from the membership
//! check until both the set and the quota have been persisted. On any
//! persistence failure the store and the cache are left as they were
//! before the toggle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::saved::saved_items_key;
use crate::domain::{
    NotificationDraft, SaveOutcome, SavedSet, Tier, UpgradeTrigger, UserIdentity,
};
use crate::ports::KeyValueStore;
use crate::services::{NotificationCenter, QuotaTracker, TierResolver};

pub struct SavedItemsLedger {
    store: Arc<dyn KeyValueStore>,
    tiers: Arc<TierResolver>,
    quota: Arc<QuotaTracker>,
    notifications: Arc<NotificationCenter>,
    cache: Mutex<HashMap<String, SavedSet>>,
}

impl SavedItemsLedger {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        tiers: Arc<TierResolver>,
        quota: Arc<QuotaTracker>,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        Self {
            store,
            tiers,
            quota,
            notifications,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> Result<MutexGuard<'_, HashMap<String, SavedSet>>> {
        self.cache
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Saved set for `user_id`, reading it from the store on first access
    pub fn load(&self, user_id: &str) -> Result<SavedSet> {
        let mut cache = self.cache()?;
        let set = self.cached(&mut cache, user_id)?.clone();
        Ok(set)
    }

    /// Drop the cached set so the next access rereads the store
    pub fn reload(&self, user_id: &str) -> Result<SavedSet> {
        self.cache()?.remove(user_id);
        self.load(user_id)
    }

    pub fn is_saved(&self, user_id: &str, item_id: &str) -> Result<bool> {
        Ok(self.load(user_id)?.contains(item_id))
    }

    /// Saved identifiers in sorted order
    pub fn saved_ids(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self.load(user_id)?.ids().map(str::to_string).collect())
    }

    pub fn count(&self, user_id: &str) -> Result<usize> {
        Ok(self.load(user_id)?.len())
    }

    /// Remove every saved item for a user. Quota is never refunded.
    pub fn clear(&self, user_id: &str) -> Result<usize> {
        let mut cache = self.cache()?;
        let removed = self.cached(&mut cache, user_id)?.len();
        self.store.remove(&saved_items_key(user_id))?;
        cache.insert(user_id.to_string(), SavedSet::new());
        info!(user_id, removed, "saved items cleared");
        Ok(removed)
    }

    /// Save `item_id` if it is not saved yet, otherwise unsave it.
    ///
    /// - No identity: [`Error::NotReady`], nothing changes.
    /// - Unsaving is always allowed and never touches the quota.
    /// - Saving asks the quota tracker first; when refused the outcome is
    ///   [`SaveOutcome::Blocked`] and nothing changes.
    /// - Only anonymous saves consume a trial save.
    ///
    /// Every terminal outcome pushes one notification.
    pub fn toggle_save(&self, identity: Option<&UserIdentity>, item_id: &str) -> Result<SaveOutcome> {
        let Some(identity) = identity else {
            warn!(item_id, "toggle attempted before identity was ready");
            self.notifications.push(NotificationDraft::info(
                "Please wait",
                "App not ready to save items. Please try again.",
            ));
            return Err(Error::NotReady);
        };
        if item_id.trim().is_empty() {
            self.notifications.push(NotificationDraft::error(
                "Save Failed",
                "Could not save item. Please try again.",
            ));
            return Err(Error::validation("Item id must not be empty"));
        }

        match self.toggle_locked(identity, item_id) {
            Ok(outcome) => {
                self.notifications.push(Self::outcome_notice(outcome));
                Ok(outcome)
            }
            Err(e) => {
                warn!(user_id = %identity.id, item_id, "toggle failed: {}", e);
                self.notifications.push(NotificationDraft::error(
                    "Save Failed",
                    "Could not save item. Please try again.",
                ));
                Err(e)
            }
        }
    }

    fn toggle_locked(&self, identity: &UserIdentity, item_id: &str) -> Result<SaveOutcome> {
        let user_id = identity.id.as_str();
        let key = saved_items_key(user_id);
        let mut cache = self.cache()?;
        let mut next = self.cached(&mut cache, user_id)?.clone();

        if next.contains(item_id) {
            next.toggle(item_id);
            self.store.set(&key, &next.to_json()?)?;
            cache.insert(user_id.to_string(), next);
            info!(user_id, item_id, "item unsaved");
            return Ok(SaveOutcome::Unsaved);
        }

        let tier = self
            .tiers
            .tier(Some(identity))?
            .unwrap_or(Tier::Anonymous);
        let before = self.quota.state()?;
        if !self.quota.policy().can_save(tier, before.remaining_saves) {
            info!(user_id, item_id, %tier, "save blocked by quota");
            return Ok(SaveOutcome::Blocked);
        }

        next.toggle(item_id);
        let json = next.to_json()?;

        // Quota goes first: a failed set write can restore it, while a
        // failed quota write leaves nothing to undo.
        if tier == Tier::Anonymous {
            let remaining = self.quota.decrement_save()?;
            if let Err(e) = self.store.set(&key, &json) {
                if let Err(undo) = self.quota.restore_saves(before.remaining_saves) {
                    warn!(user_id, "could not roll back trial save: {}", undo);
                }
                return Err(e);
            }
            debug!(user_id, remaining, "anonymous save consumed a trial save");
        } else {
            self.store.set(&key, &json)?;
        }

        cache.insert(user_id.to_string(), next);
        info!(user_id, item_id, %tier, "item saved");
        Ok(SaveOutcome::Saved)
    }

    fn cached<'a>(
        &self,
        cache: &'a mut HashMap<String, SavedSet>,
        user_id: &str,
    ) -> Result<&'a mut SavedSet> {
        if !cache.contains_key(user_id) {
            let set = self.read(user_id)?;
            cache.insert(user_id.to_string(), set);
        }
        cache
            .get_mut(user_id)
            .ok_or_else(|| Error::not_found(format!("saved items for {}", user_id)))
    }

    fn read(&self, user_id: &str) -> Result<SavedSet> {
        let key = saved_items_key(user_id);
        let Some(raw) = self.store.get(&key)? else {
            debug!(user_id, "no saved items yet");
            return Ok(SavedSet::new());
        };
        match SavedSet::from_json(&raw) {
            Ok(set) => {
                debug!(user_id, count = set.len(), "saved items loaded");
                Ok(set)
            }
            Err(e) => {
                warn!("{}; treating as empty", Error::corrupt(key, e));
                Ok(SavedSet::new())
            }
        }
    }

    fn outcome_notice(outcome: SaveOutcome) -> NotificationDraft {
        match outcome {
            SaveOutcome::Saved => {
                NotificationDraft::success("Saved!", "Item added to your collection")
            }
            SaveOutcome::Unsaved => {
                NotificationDraft::info("Removed", "Item removed from your collection")
            }
            SaveOutcome::Blocked => NotificationDraft::warning(
                "Save limit reached",
                "Sign up or upgrade to keep saving tales",
            )
            .with_upgrade(UpgradeTrigger::SaveLimit),
        }
    }
}
