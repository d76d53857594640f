use uuid::Uuid;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Represents an account in the system. Only the repository layer ever sees
/// the password hash; everything leaving the server goes through
/// [`AccountView`].
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the account.
    pub id: Uuid,
    /// The account's username. Unique, case-sensitive.
    pub username: String,
    /// The Argon2id PHC-format password hash. Opaque outside the verifier.
    pub password: String,
    /// The timestamp when the account was created.
    pub created_at: DateTime<Utc>,
}

/// The client-facing shape of an account. Never carries the password hash.
#[derive(Clone, Debug, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for AccountView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_view_drops_the_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password: "$argon2id$not-a-real-hash".to_string(),
            created_at: Utc::now(),
        };

        let view = AccountView::from(user.clone());
        let json = serde_json::to_string(&view).unwrap();

        assert!(json.contains("alice"));
        assert!(!json.contains("argon2id"));
        assert_eq!(view.id, user.id);
    }
}
