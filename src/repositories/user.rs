use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tokio_postgres::error::SqlState;
use uuid::Uuid;
use crate::{
    error::{AppError, Result},
    models::user::{AccountView, User},
};

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row
            .try_get("id")
            .map_err(|_| AppError::MissingColumn("id".to_string()))?,
        username: row
            .try_get("username")
            .map_err(|_| AppError::MissingColumn("username".to_string()))?,
        password: row
            .try_get("password")
            .map_err(|_| AppError::MissingColumn("password".to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|_| AppError::MissingColumn("created_at".to_string()))?,
    })
}

/// Creates a new account. The password must already be hashed.
///
/// A duplicate username surfaces as a validation error rather than leaking
/// the raw constraint violation.
pub async fn create_user(pool: &Pool, username: &str, password_hash: &str) -> Result<User> {
    let client = pool.get().await?;
    let id = Uuid::new_v4();
    let row = client
        .query_one(
            r#"
            INSERT INTO users (id, username, password)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, created_at
            "#,
            &[&id, &username, &password_hash],
        )
        .await
        .map_err(|e| {
            if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                AppError::Validation("Username is already taken".to_string())
            } else {
                AppError::Database(e)
            }
        })?;
    row_to_user(&row)
}

/// Finds an account by username. Returns at most one record.
pub async fn find_by_username(pool: &Pool, username: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, username, password, created_at
            FROM users
            WHERE username = $1
            "#,
            &[&username],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Lists all accounts in their client-facing shape.
pub async fn list_users(pool: &Pool) -> Result<Vec<AccountView>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT id, username, created_at
            FROM users
            ORDER BY username
            "#,
            &[],
        )
        .await?;

    rows.iter()
        .map(|row| {
            Ok(AccountView {
                id: row
                    .try_get("id")
                    .map_err(|_| AppError::MissingColumn("id".to_string()))?,
                username: row
                    .try_get("username")
                    .map_err(|_| AppError::MissingColumn("username".to_string()))?,
                created_at: row
                    .try_get("created_at")
                    .map_err(|_| AppError::MissingColumn("created_at".to_string()))?,
            })
        })
        .collect()
}
