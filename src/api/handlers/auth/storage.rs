//! Database helpers for the user credential store.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

/// A stored user row. `password_hash` and `security_answer` hold Argon2 PHC
/// strings, never plaintext.
#[derive(Debug)]
pub(crate) struct UserRecord {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) security_question: String,
    pub(crate) security_answer: String,
}

/// Outcome when attempting to create a new user and their pantry.
///
/// The UNIQUE constraints are the final arbiter for concurrent registrations;
/// the handler's pre-check lookups are best-effort only.
#[derive(Debug)]
pub(crate) enum RegisterOutcome {
    Created,
    DuplicateUsername,
    DuplicateEmail,
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        security_question: row.get("security_question"),
        security_answer: row.get("security_answer"),
    }
}

/// Look up a user by normalized (lowercase) username.
pub(crate) async fn lookup_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, email, password_hash, security_question, security_answer
        FROM users
        WHERE username = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by username")?;
    Ok(row.as_ref().map(row_to_user))
}

/// Look up a user by id (token subject resolution).
pub(crate) async fn lookup_user_by_id(pool: &PgPool, user_id: i64) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, email, password_hash, security_question, security_answer
        FROM users
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by id")?;
    Ok(row.as_ref().map(row_to_user))
}

pub(crate) async fn email_taken(pool: &PgPool, email: &str) -> Result<bool> {
    let query = "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1) AS taken";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check email uniqueness")?;
    Ok(row.get("taken"))
}

/// Insert a new user and provision their single empty pantry.
///
/// Both inserts run in one transaction: a user without a pantry (or the
/// reverse) must never be observable.
pub(crate) async fn insert_user_with_pantry(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    security_question: &str,
    security_answer_hash: &str,
) -> Result<RegisterOutcome> {
    let mut tx = pool.begin().await.context("begin register transaction")?;

    let query = r"
        INSERT INTO users
            (username, email, password_hash, security_question, security_answer)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(security_question)
        .bind(security_answer_hash)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user_id: i64 = match row {
        Ok(row) => row.get("id"),
        Err(err) => {
            if let Some(outcome) = duplicate_outcome(&err) {
                let _ = tx.rollback().await;
                return Ok(outcome);
            }
            return Err(err).context("failed to insert user");
        }
    };

    let query = "INSERT INTO pantries (user_id, name) VALUES ($1, $2)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(format!("{username}'s pantry"))
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to provision pantry")?;

    tx.commit().await.context("commit register transaction")?;

    Ok(RegisterOutcome::Created)
}

pub(crate) async fn update_password(pool: &PgPool, user_id: i64, hash: &str) -> Result<()> {
    let query = "UPDATE users SET password_hash = $1 WHERE id = $2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(hash)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update password")?;
    Ok(())
}

pub(crate) async fn update_security_answer(pool: &PgPool, user_id: i64, hash: &str) -> Result<()> {
    let query = "UPDATE users SET security_answer = $1 WHERE id = $2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(hash)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update security answer")?;
    Ok(())
}

/// Map a unique violation (SQLSTATE 23505) to the conflicting field via the
/// constraint name; anything else is not a duplicate.
fn duplicate_outcome(err: &sqlx::Error) -> Option<RegisterOutcome> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    match db_err.constraint() {
        Some("users_username_key") => Some(RegisterOutcome::DuplicateUsername),
        Some("users_email_key") => Some(RegisterOutcome::DuplicateEmail),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_outcome_debug_names() {
        assert_eq!(format!("{:?}", RegisterOutcome::Created), "Created");
        assert_eq!(
            format!("{:?}", RegisterOutcome::DuplicateUsername),
            "DuplicateUsername"
        );
        assert_eq!(
            format!("{:?}", RegisterOutcome::DuplicateEmail),
            "DuplicateEmail"
        );
    }

    #[test]
    fn non_database_errors_are_not_duplicates() {
        assert!(duplicate_outcome(&sqlx::Error::RowNotFound).is_none());
    }
}
