//! Trial-save and AI-usage quotas

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::tier::Tier;

/// Default number of saves an anonymous guest gets before being asked to sign up
pub const DEFAULT_TRIAL_SAVES: u32 = 3;
/// Default daily AI companion uses for signed-in users
pub const DEFAULT_FREEMIUM_AI_DAILY_LIMIT: u32 = 5;
/// Default daily AI companion uses for guests
pub const DEFAULT_ANONYMOUS_AI_DAILY_LIMIT: u32 = 3;

/// Limits applied per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaPolicy {
    pub trial_saves: u32,
    pub freemium_ai_daily_limit: u32,
    pub anonymous_ai_daily_limit: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            trial_saves: DEFAULT_TRIAL_SAVES,
            freemium_ai_daily_limit: DEFAULT_FREEMIUM_AI_DAILY_LIMIT,
            anonymous_ai_daily_limit: DEFAULT_ANONYMOUS_AI_DAILY_LIMIT,
        }
    }
}

impl QuotaPolicy {
    /// Premium and freemium save without limit; guests need a trial save left.
    pub fn can_save(&self, tier: Tier, remaining_saves: u32) -> bool {
        match tier {
            Tier::Premium | Tier::Freemium => true,
            Tier::Anonymous => remaining_saves > 0,
        }
    }

    pub fn can_use_ai(&self, tier: Tier, ai_usage_today: u32) -> bool {
        match tier {
            Tier::Premium => true,
            Tier::Freemium => ai_usage_today < self.freemium_ai_daily_limit,
            Tier::Anonymous => ai_usage_today < self.anonymous_ai_daily_limit,
        }
    }

    /// Daily AI limit for a tier, `None` meaning unlimited
    pub fn ai_daily_limit(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Premium => None,
            Tier::Freemium => Some(self.freemium_ai_daily_limit),
            Tier::Anonymous => Some(self.anonymous_ai_daily_limit),
        }
    }
}

/// Counters owned by the quota tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaState {
    pub remaining_saves: u32,
    pub trial_expired: bool,
    pub ai_usage_today: u32,
    pub last_usage_date: Option<NaiveDate>,
}

impl QuotaState {
    /// Untouched state for a browser profile
    pub fn fresh(policy: &QuotaPolicy) -> Self {
        Self {
            remaining_saves: policy.trial_saves,
            trial_expired: policy.trial_saves == 0,
            ai_usage_today: 0,
            last_usage_date: None,
        }
    }

    /// Take one trial save, floored at zero. Returns the new remaining count.
    pub fn decrement_save(&mut self) -> u32 {
        self.remaining_saves = self.remaining_saves.saturating_sub(1);
        if self.remaining_saves == 0 {
            self.trial_expired = true;
        }
        self.remaining_saves
    }

    /// Reset the daily counter when `today` differs from the last usage date.
    ///
    /// Returns true when a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_usage_date == Some(today) {
            return false;
        }
        self.ai_usage_today = 0;
        self.last_usage_date = Some(today);
        true
    }

    /// Count one AI use on `today`, rolling the day over first if needed
    pub fn record_ai_usage(&mut self, today: NaiveDate) -> u32 {
        self.roll_over(today);
        self.ai_usage_today = self.ai_usage_today.saturating_add(1);
        self.ai_usage_today
    }

    /// Restore the trial allotment
    pub fn reset_trial(&mut self, policy: &QuotaPolicy) {
        self.remaining_saves = policy.trial_saves;
        self.trial_expired = policy.trial_saves == 0;
    }

    pub fn trial_info(&self, policy: &QuotaPolicy) -> TrialInfo {
        TrialInfo {
            used_saves: policy.trial_saves.saturating_sub(self.remaining_saves),
            max_saves: policy.trial_saves,
        }
    }
}

/// Trial progress shown by the upgrade prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialInfo {
    pub used_saves: u32,
    pub max_saves: u32,
}

/// Result of asking to use the AI companion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum AiOutcome {
    /// Use was counted; carries today's count including this use
    Allowed { usage_today: u32 },
    /// Daily limit reached for this tier
    Blocked { usage_today: u32, limit: u32 },
}
