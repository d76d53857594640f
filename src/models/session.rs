use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a server-side session record.
///
/// The session identifier itself is not part of the payload; it is the key
/// under which the store persists this record. A client presenting that key
/// is trusted as `user_id` until `expires_at`, with no re-verification of
/// credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The account this session belongs to.
    pub user_id: Uuid,
    /// The account's username, denormalized for handlers and logs.
    pub username: String,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session for an account with the given lifetime.
    pub fn new(user_id: Uuid, username: String, ttl_secs: u64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            username,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_secs as i64),
        }
    }

    /// Whether the session's lifetime has passed. Expiry is logical: a
    /// record past `expires_at` is dead even if the store has not yet
    /// purged it.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_not_expired() {
        let session = Session::new(Uuid::new_v4(), "alice".to_string(), 3600);
        assert!(!session.is_expired());
        assert!(session.expires_at > session.created_at);
    }

    #[test]
    fn session_past_its_lifetime_is_expired() {
        let mut session = Session::new(Uuid::new_v4(), "alice".to_string(), 3600);
        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }

    #[test]
    fn session_round_trips_through_json() {
        let session = Session::new(Uuid::new_v4(), "alice".to_string(), 60);
        let json = sonic_rs::to_string(&session).unwrap();
        let back: Session = sonic_rs::from_str(&json).unwrap();
        assert_eq!(back.user_id, session.user_id);
        assert_eq!(back.username, "alice");
        assert_eq!(back.expires_at, session.expires_at);
    }
}
