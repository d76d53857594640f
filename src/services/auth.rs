use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::repositories::user as user_repo;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use deadpool_postgres::Pool;
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// A syntactically valid Argon2id hash that matches no password. Unknown
/// usernames are verified against it so a failed login costs the same
/// whether or not the account exists (enumeration resistance).
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=3,p=6$MDEyMzQ1Njc4OWFiY2RlZg$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

fn build_argon2() -> Result<Argon2<'static>> {
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    ))
}

fn hash_password_sync(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = build_argon2()?;

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    Ok(password_hash)
}

/// Verifies a password against a stored hash.
///
/// A mismatch is `Ok(false)`, never an error. A stored hash that cannot be
/// parsed is [`AppError::MalformedHash`]: data corruption, not user error.
/// The hash comparison itself is the argon2 crate's constant-time check.
fn verify_password_sync(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::MalformedHash(e.to_string()))?;

    let argon2 = Argon2::default();
    let result = match argon2.verify_password(&password_bytes, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::MalformedHash(e.to_string())),
    };

    password_bytes.zeroize();
    result
}

/// Hashes a password with Argon2id on the blocking pool.
///
/// Argon2 is deliberately expensive; running it on a worker thread keeps the
/// request scheduler free.
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password_sync(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Hash task failed: {}", e)))?
}

/// Verifies a password against a stored hash on the blocking pool.
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password_sync(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verify task failed: {}", e)))?
}

/// Authenticates an account by username and password.
///
/// Unknown username and wrong password both return
/// [`AppError::InvalidCredentials`], and both paths run a full Argon2
/// verification, so neither the error nor the latency reveals whether the
/// username exists.
pub async fn authenticate_user(pool: &Pool, username: &str, password: String) -> Result<User> {
    tracing::debug!("Authenticating user: {}", username);

    let user = user_repo::find_by_username(pool, username).await?;

    let stored_hash = match &user {
        Some(u) => u.password.clone(),
        None => DUMMY_HASH.to_string(),
    };

    let verified = verify_password(password, stored_hash).await?;

    match user {
        Some(u) if verified => {
            tracing::info!("User authenticated: {}", u.id);
            Ok(u)
        }
        _ => Err(AppError::InvalidCredentials),
    }
}

/// Creates a new account with a freshly hashed password.
pub async fn create_user(pool: &Pool, username: &str, password: String) -> Result<User> {
    tracing::debug!("Creating user: {}", username);
    let hashed_password = hash_password(password).await?;
    let user = user_repo::create_user(pool, username, &hashed_password).await?;
    tracing::info!("User created with ID: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Session;
    use crate::session_store::{MemorySessionStore, SessionStore};
    use uuid::Uuid;

    #[tokio::test]
    async fn hash_then_verify_round_trips() {
        let hash = hash_password("secret123".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let ok = verify_password("secret123".to_string(), hash.clone())
            .await
            .unwrap();
        assert!(ok);

        let wrong = verify_password("wrongpass".to_string(), hash).await.unwrap();
        assert!(!wrong);
    }

    #[tokio::test]
    async fn hashes_are_salted_per_call() {
        let a = hash_password("secret123".to_string()).await.unwrap();
        let b = hash_password("secret123".to_string()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_stored_hash_is_an_error_not_a_mismatch() {
        let err = verify_password("secret123".to_string(), "not-a-phc-string".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedHash(_)));
    }

    #[tokio::test]
    async fn failed_verification_creates_no_session() {
        // Mirrors the login flow: a session is only persisted after the
        // password verifies, so a rejected login leaves the store at the
        // exact size it had before.
        let store = MemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let hash = hash_password("secret123".to_string()).await.unwrap();

        let verified = verify_password("wrongpass".to_string(), hash.clone())
            .await
            .unwrap();
        if verified {
            store
                .create(&Session::new(user_id, "alice".to_string(), 3600))
                .await
                .unwrap();
        }

        assert!(!verified);
        assert!(store.is_empty());

        // The successful path does persist one.
        let verified = verify_password("secret123".to_string(), hash).await.unwrap();
        if verified {
            store
                .create(&Session::new(user_id, "alice".to_string(), 3600))
                .await
                .unwrap();
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn dummy_hash_parses_and_matches_nothing() {
        // The enumeration-resistance path depends on this constant staying
        // well-formed.
        let ok = verify_password("secret123".to_string(), DUMMY_HASH.to_string())
            .await
            .unwrap();
        assert!(!ok);

        let also_not = verify_password(String::new(), DUMMY_HASH.to_string())
            .await
            .unwrap();
        assert!(!also_not);
    }
}
