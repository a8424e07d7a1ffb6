//! Access tiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::identity::UserIdentity;
use super::result::Error;

/// Access level of a user. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Anonymous,
    Freemium,
    Premium,
}

impl Tier {
    /// Derive the tier for an identity.
    ///
    /// A premium override wins unconditionally, then any signed-in
    /// (non-anonymous) identity is freemium, everything else is anonymous.
    pub fn resolve(identity: &UserIdentity, premium_override: bool) -> Self {
        if premium_override || identity.is_premium {
            Tier::Premium
        } else if !identity.is_anonymous {
            Tier::Freemium
        } else {
            Tier::Anonymous
        }
    }

    /// Like [`Tier::resolve`] but `None` while no identity is loaded.
    ///
    /// Callers suppress tier-dependent UI on `None` instead of guessing.
    pub fn resolve_ready(identity: Option<&UserIdentity>, premium_override: bool) -> Option<Self> {
        identity.map(|id| Self::resolve(id, premium_override))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Anonymous => "anonymous",
            Tier::Freemium => "freemium",
            Tier::Premium => "premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anonymous" => Ok(Tier::Anonymous),
            "freemium" => Ok(Tier::Freemium),
            "premium" => Ok(Tier::Premium),
            other => Err(Error::validation(format!("Unknown tier: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_override_wins() {
        let guest = UserIdentity::with_id("anon-1", true, false);
        assert_eq!(Tier::resolve(&guest, true), Tier::Premium);
    }

    #[test]
    fn test_premium_flag_on_identity() {
        let user = UserIdentity::with_id("user-1", false, true);
        assert_eq!(Tier::resolve(&user, false), Tier::Premium);
    }

    #[test]
    fn test_signed_in_is_freemium() {
        let user = UserIdentity::with_id("user-1", false, false);
        assert_eq!(Tier::resolve(&user, false), Tier::Freemium);
    }

    #[test]
    fn test_guest_is_anonymous() {
        let guest = UserIdentity::with_id("anon-1", true, false);
        assert_eq!(Tier::resolve(&guest, false), Tier::Anonymous);
    }

    #[test]
    fn test_not_ready_has_no_tier() {
        assert_eq!(Tier::resolve_ready(None, true), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert!("gold".parse::<Tier>().is_err());
        assert_eq!(Tier::Freemium.to_string(), "freemium");
    }
}
