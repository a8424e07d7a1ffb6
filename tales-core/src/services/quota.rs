//! Quota tracker - trial saves and daily AI usage
//!
//! State is kept in the key-value store under a fixed, profile-wide set of
//! keys (not scoped by user id). The store is the source of truth; every
//! operation is a locked read-modify-write.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{AiOutcome, QuotaPolicy, QuotaState, Tier, TrialInfo};
use crate::ports::{Clock, KeyValueStore};

pub const TRIAL_REMAINING_SAVES_KEY: &str = "trialRemainingSaves";
pub const AI_USAGE_TODAY_KEY: &str = "aiUsageToday";
pub const LAST_AI_USAGE_DATE_KEY: &str = "lastAiUsageDate";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct QuotaTracker {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    policy: QuotaPolicy,
    lock: Mutex<()>,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, policy: QuotaPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Current counters as seen today
    ///
    /// A stale `lastUsageDate` reads as zero AI uses; nothing is written.
    pub fn state(&self) -> Result<QuotaState> {
        let _guard = self.guard()?;
        let mut state = self.load()?;
        state.roll_over(self.clock.today());
        Ok(state)
    }

    pub fn can_save(&self, tier: Tier) -> Result<bool> {
        Ok(self.policy.can_save(tier, self.state()?.remaining_saves))
    }

    pub fn can_use_ai(&self, tier: Tier) -> Result<bool> {
        Ok(self.policy.can_use_ai(tier, self.state()?.ai_usage_today))
    }

    pub fn trial_info(&self) -> Result<TrialInfo> {
        Ok(self.state()?.trial_info(&self.policy))
    }

    /// Consume one trial save, floored at zero. Returns the new remaining count.
    ///
    /// Only the saved-items ledger calls this, right after an anonymous save.
    pub fn decrement_save(&self) -> Result<u32> {
        let _guard = self.guard()?;
        let mut state = self.load()?;
        let remaining = state.decrement_save();
        self.store
            .set(TRIAL_REMAINING_SAVES_KEY, &remaining.to_string())?;
        debug!(remaining, expired = state.trial_expired, "trial save consumed");
        Ok(remaining)
    }

    /// Put the remaining-saves counter back after a failed save
    pub(crate) fn restore_saves(&self, remaining: u32) -> Result<()> {
        let _guard = self.guard()?;
        self.store
            .set(TRIAL_REMAINING_SAVES_KEY, &remaining.to_string())
    }

    /// Check the daily limit for `tier` and count the use if allowed, under one lock
    pub fn try_use_ai(&self, tier: Tier) -> Result<AiOutcome> {
        let _guard = self.guard()?;
        let mut state = self.load()?;
        state.roll_over(self.clock.today());

        if !self.policy.can_use_ai(tier, state.ai_usage_today) {
            return Ok(AiOutcome::Blocked {
                usage_today: state.ai_usage_today,
                limit: self.policy.ai_daily_limit(tier).unwrap_or(u32::MAX),
            });
        }
        let usage_today = self.record_locked()?;
        Ok(AiOutcome::Allowed { usage_today })
    }

    /// Count one successful AI use. Returns today's count including it.
    pub fn record_ai_usage(&self) -> Result<u32> {
        let _guard = self.guard()?;
        self.record_locked()
    }

    fn record_locked(&self) -> Result<u32> {
        let before = self.load()?;
        let mut after = before.clone();
        let today = self.clock.today();
        let usage = after.record_ai_usage(today);

        self.store.set(AI_USAGE_TODAY_KEY, &usage.to_string())?;
        if before.last_usage_date != after.last_usage_date {
            let date = today.format(DATE_FORMAT).to_string();
            if let Err(e) = self.store.set(LAST_AI_USAGE_DATE_KEY, &date) {
                if let Err(undo) = self
                    .store
                    .set(AI_USAGE_TODAY_KEY, &before.ai_usage_today.to_string())
                {
                    warn!("could not roll back AI usage counter: {}", undo);
                }
                return Err(e);
            }
        }
        Ok(usage)
    }

    /// Restore the full trial allotment (support tooling and premium upgrade)
    pub fn reset_trial(&self) -> Result<()> {
        let _guard = self.guard()?;
        self.store
            .set(TRIAL_REMAINING_SAVES_KEY, &self.policy.trial_saves.to_string())?;
        debug!(allotment = self.policy.trial_saves, "trial reset");
        Ok(())
    }

    fn load(&self) -> Result<QuotaState> {
        let fresh = QuotaState::fresh(&self.policy);

        let remaining_saves = self
            .read_number(TRIAL_REMAINING_SAVES_KEY)?
            .unwrap_or(fresh.remaining_saves);
        let ai_usage_today = self.read_number(AI_USAGE_TODAY_KEY)?.unwrap_or(0);
        let last_usage_date = match self.store.get(LAST_AI_USAGE_DATE_KEY)? {
            Some(raw) => match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(e) => {
                    warn!("{}", Error::corrupt(LAST_AI_USAGE_DATE_KEY, e));
                    None
                }
            },
            None => None,
        };

        Ok(QuotaState {
            remaining_saves,
            trial_expired: remaining_saves == 0,
            ai_usage_today,
            last_usage_date,
        })
    }

    /// Parse a counter. Garbage or negative values are treated as absent.
    fn read_number(&self, key: &str) -> Result<Option<u32>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match raw.trim().parse::<i64>() {
            Ok(n) if n >= 0 => Ok(Some(u32::try_from(n).unwrap_or(u32::MAX))),
            Ok(n) => {
                warn!("{}", Error::corrupt(key, format!("negative counter {}", n)));
                Ok(None)
            }
            Err(e) => {
                warn!("{}", Error::corrupt(key, e));
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FixedClock, FlakyStore, MemoryStore};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn tracker_with(store: Arc<dyn KeyValueStore>) -> (QuotaTracker, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::on(start()));
        (
            QuotaTracker::new(store, clock.clone(), QuotaPolicy::default()),
            clock,
        )
    }

    #[test]
    fn test_fresh_profile_has_full_trial() {
        let (quota, _) = tracker_with(Arc::new(MemoryStore::new()));
        let state = quota.state().unwrap();
        assert_eq!(state.remaining_saves, 3);
        assert!(!state.trial_expired);
        assert_eq!(state.ai_usage_today, 0);
    }

    #[test]
    fn test_decrement_to_zero_expires_trial() {
        let store = Arc::new(MemoryStore::new());
        let (quota, _) = tracker_with(store.clone());

        assert_eq!(quota.decrement_save().unwrap(), 2);
        assert_eq!(quota.decrement_save().unwrap(), 1);
        assert_eq!(quota.decrement_save().unwrap(), 0);
        assert_eq!(quota.decrement_save().unwrap(), 0);

        let state = quota.state().unwrap();
        assert!(state.trial_expired);
        assert!(!quota.can_save(Tier::Anonymous).unwrap());
        assert!(quota.can_save(Tier::Freemium).unwrap());
        assert_eq!(
            store.get(TRIAL_REMAINING_SAVES_KEY).unwrap().as_deref(),
            Some("0")
        );
    }

    #[test]
    fn test_ai_usage_rolls_over_per_day() {
        let store = Arc::new(MemoryStore::new());
        let (quota, clock) = tracker_with(store.clone());

        assert_eq!(quota.record_ai_usage().unwrap(), 1);
        assert_eq!(quota.record_ai_usage().unwrap(), 2);
        assert_eq!(quota.record_ai_usage().unwrap(), 3);
        assert!(!quota.can_use_ai(Tier::Anonymous).unwrap());
        assert!(quota.can_use_ai(Tier::Freemium).unwrap());

        clock.advance_days(1);
        assert_eq!(quota.state().unwrap().ai_usage_today, 0);
        assert!(quota.can_use_ai(Tier::Anonymous).unwrap());

        assert_eq!(quota.record_ai_usage().unwrap(), 1);
        assert_eq!(
            store.get(LAST_AI_USAGE_DATE_KEY).unwrap().as_deref(),
            Some("2024-05-11")
        );
    }

    #[test]
    fn test_try_use_ai_blocks_at_limit() {
        let (quota, _) = tracker_with(Arc::new(MemoryStore::new()));
        for n in 1..=3 {
            assert_eq!(
                quota.try_use_ai(Tier::Anonymous).unwrap(),
                AiOutcome::Allowed { usage_today: n }
            );
        }
        assert_eq!(
            quota.try_use_ai(Tier::Anonymous).unwrap(),
            AiOutcome::Blocked {
                usage_today: 3,
                limit: 3
            }
        );
        assert_eq!(quota.state().unwrap().ai_usage_today, 3);
        assert!(matches!(
            quota.try_use_ai(Tier::Freemium).unwrap(),
            AiOutcome::Allowed { usage_today: 4 }
        ));
    }

    #[test]
    fn test_corrupt_counters_fall_back_to_defaults() {
        let store = Arc::new(MemoryStore::with_entries([
            (TRIAL_REMAINING_SAVES_KEY, "lots"),
            (AI_USAGE_TODAY_KEY, "-4"),
            (LAST_AI_USAGE_DATE_KEY, "yesterday"),
        ]));
        let (quota, _) = tracker_with(store);

        let state = quota.state().unwrap();
        assert_eq!(state.remaining_saves, 3);
        assert_eq!(state.ai_usage_today, 0);
        assert_eq!(state.last_usage_date, Some(start()));
    }

    #[test]
    fn test_reset_trial_restores_allotment() {
        let (quota, _) = tracker_with(Arc::new(MemoryStore::new()));
        for _ in 0..3 {
            quota.decrement_save().unwrap();
        }
        quota.reset_trial().unwrap();

        let state = quota.state().unwrap();
        assert_eq!(state.remaining_saves, 3);
        assert!(!state.trial_expired);
        assert_eq!(quota.trial_info().unwrap().used_saves, 0);
    }

    #[test]
    fn test_failed_date_write_rolls_back_counter() {
        let inner = Arc::new(MemoryStore::with_entries([
            (AI_USAGE_TODAY_KEY, "2"),
            (LAST_AI_USAGE_DATE_KEY, "2024-05-09"),
        ]));
        let flaky = Arc::new(FlakyStore::new(inner.clone()));
        flaky.fail_writes_to(LAST_AI_USAGE_DATE_KEY);
        let (quota, _) = tracker_with(flaky);

        assert!(quota.record_ai_usage().is_err());
        assert_eq!(inner.get(AI_USAGE_TODAY_KEY).unwrap().as_deref(), Some("2"));
    }
}
