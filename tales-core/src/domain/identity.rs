//! User identity supplied by the session (auth) collaborator

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is using the app right now
///
/// Identities are replaced wholesale on sign-in, sign-up and sign-out;
/// they are never mutated in place. Persisted as JSON under `localUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    #[serde(rename = "uid")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub is_anonymous: bool,
    #[serde(default)]
    pub is_premium: bool,
}

impl UserIdentity {
    /// Fresh guest identity used for anonymous bootstrap
    pub fn anonymous() -> Self {
        Self {
            id: format!("anon-{}", Uuid::new_v4()),
            email: None,
            is_anonymous: true,
            is_premium: false,
        }
    }

    /// Signed-in (freemium) identity for an email address
    pub fn registered(email: impl Into<String>) -> Self {
        Self {
            id: format!("user-{}", Uuid::new_v4()),
            email: Some(email.into()),
            is_anonymous: false,
            is_premium: false,
        }
    }

    /// Identity with a caller-chosen id, mostly useful for tests and fixtures
    pub fn with_id(id: impl Into<String>, is_anonymous: bool, is_premium: bool) -> Self {
        Self {
            id: id.into(),
            email: None,
            is_anonymous,
            is_premium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity() {
        let guest = UserIdentity::anonymous();
        assert!(guest.id.starts_with("anon-"));
        assert!(guest.is_anonymous);
        assert!(!guest.is_premium);
        assert_ne!(guest.id, UserIdentity::anonymous().id);
    }

    #[test]
    fn test_registered_identity() {
        let user = UserIdentity::registered("ana@example.com");
        assert!(user.id.starts_with("user-"));
        assert!(!user.is_anonymous);
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_stored_shape() {
        let json = r#"{"uid":"anon-1","isAnonymous":true,"email":"guest@local.com"}"#;
        let user: UserIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "anon-1");
        assert!(user.is_anonymous);
        assert!(!user.is_premium);

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["uid"], "anon-1");
        assert_eq!(back["isAnonymous"], true);
    }
}
