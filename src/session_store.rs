//! Session persistence behind a trait so the access gate never depends on a
//! concrete storage technology. Production runs on Redis; tests run on the
//! in-memory adapter.
//!
//! Redis key pattern: `session:{uuid}` holding the session JSON with a
//! native TTL. Expiry is checked logically on every read as well, so a
//! record past `expires_at` is treated as absent even before Redis or the
//! sweep purges it.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::session::Session;

/// The durable map from session identifier to session state.
///
/// A session is `Active` between `create` and the earlier of `destroy` or
/// expiry; after that, `get` returns `None` permanently.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists the session under a fresh unguessable identifier and
    /// returns that identifier.
    async fn create(&self, session: &Session) -> Result<Uuid>;

    /// Returns the session for an identifier, or `None` when the identifier
    /// is unknown or the session has expired.
    async fn get(&self, id: Uuid) -> Result<Option<Session>>;

    /// Removes a session. Idempotent: destroying an absent session is fine.
    async fn destroy(&self, id: Uuid) -> Result<()>;

    /// Removes records past their expiry. Returns how many were purged.
    async fn sweep_expired(&self) -> Result<u64>;
}

fn session_key(id: Uuid) -> String {
    format!("session:{}", id)
}

/// Redis-backed session store. Survives process restarts.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, session: &Session) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let json = sonic_rs::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

        let ttl_secs = (session.expires_at - session.created_at)
            .num_seconds()
            .max(1) as u64;

        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(session_key(id), json, ttl_secs).await?;

        tracing::debug!("Session persisted: session:{}", id);
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Session>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(session_key(id)).await?;

        let Some(json) = json else {
            return Ok(None);
        };

        let session: Session = sonic_rs::from_str(&json)
            .map_err(|e| AppError::Internal(format!("Session deserialization failed: {}", e)))?;

        if session.is_expired() {
            // Logically dead; drop the stale record on the way out.
            let _: () = conn.del(session_key(id)).await.unwrap_or(());
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn destroy(&self, id: Uuid) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(session_key(id)).await?;
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<u64> {
        // Redis TTLs handle most of this; the scan catches records whose
        // logical expiry moved ahead of the key TTL.
        let mut conn = self.conn.clone();
        let mut purged: u64 = 0;
        let mut cursor: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg("session:*")
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            for key in keys {
                let json: Option<String> = conn.get(&key).await?;
                let Some(json) = json else { continue };

                let expired = sonic_rs::from_str::<Session>(&json)
                    .map(|s| s.is_expired())
                    // Unparseable payloads are garbage; collect them too.
                    .unwrap_or(true);

                if expired {
                    let _: () = conn.del(&key).await?;
                    purged += 1;
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(purged)
    }
}

/// In-memory session store for tests and local development. Not durable.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live records, expired or not. Test hook.
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session map poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("session map poisoned".to_string()))?
            .insert(id, session.clone());
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Session>> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| AppError::Internal("session map poisoned".to_string()))?;

        match sessions.get(&id) {
            Some(session) if session.is_expired() => {
                sessions.remove(&id);
                Ok(None)
            }
            Some(session) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    async fn destroy(&self, id: Uuid) -> Result<()> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("session map poisoned".to_string()))?
            .remove(&id);
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<u64> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| AppError::Internal("session map poisoned".to_string()))?;

        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
