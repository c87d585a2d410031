//! Database helpers for pantry items.
//!
//! Items belong to a pantry through an owning pantry id; ownership is always
//! resolved from the authenticated user, never from the request.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;

#[derive(Debug)]
pub(crate) struct ItemRecord {
    pub(crate) item: String,
    pub(crate) used_by_date: String,
    pub(crate) count: i64,
    pub(crate) run_out_time: Option<DateTime<Utc>>,
}

/// Outcome when adding an item; the per-pantry UNIQUE constraint settles
/// concurrent inserts of the same name.
#[derive(Debug)]
pub(crate) enum InsertOutcome {
    Added,
    Duplicate,
}

fn row_to_item(row: &sqlx::postgres::PgRow) -> ItemRecord {
    ItemRecord {
        item: row.get("item"),
        used_by_date: row.get("used_by_date"),
        count: row.get("count"),
        run_out_time: row.get("run_out_time"),
    }
}

/// Resolve the single pantry owned by a user.
pub(crate) async fn pantry_for_user(pool: &PgPool, user_id: i64) -> Result<Option<i64>> {
    let query = "SELECT pantry_id FROM pantries WHERE user_id = $1";
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
        .context("failed to lookup pantry for user")?;
    Ok(row.map(|row| row.get("pantry_id")))
}

pub(crate) async fn list_items(pool: &PgPool, pantry_id: i64) -> Result<Vec<ItemRecord>> {
    let query = r"
        SELECT item, used_by_date, count, run_out_time
        FROM pantry_items
        WHERE pantry_id = $1
        ORDER BY item
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(pantry_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list pantry items")?;
    Ok(rows.iter().map(row_to_item).collect())
}

pub(crate) async fn find_item(
    pool: &PgPool,
    pantry_id: i64,
    item: &str,
) -> Result<Option<ItemRecord>> {
    let query = r"
        SELECT item, used_by_date, count, run_out_time
        FROM pantry_items
        WHERE pantry_id = $1 AND item = $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(pantry_id)
        .bind(item)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup pantry item")?;
    Ok(row.as_ref().map(row_to_item))
}

pub(crate) async fn insert_item(
    pool: &PgPool,
    pantry_id: i64,
    item: &str,
    used_by_date: &str,
    count: i64,
    run_out_time: Option<DateTime<Utc>>,
) -> Result<InsertOutcome> {
    let query = r"
        INSERT INTO pantry_items (pantry_id, item, used_by_date, count, run_out_time)
        VALUES ($1, $2, $3, $4, $5)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(pantry_id)
        .bind(item)
        .bind(used_by_date)
        .bind(count)
        .bind(run_out_time)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(InsertOutcome::Added),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Duplicate),
        Err(err) => Err(err).context("failed to insert pantry item"),
    }
}

/// Overwrite an item's mutable fields; returns false when the item is gone.
pub(crate) async fn update_item(
    pool: &PgPool,
    pantry_id: i64,
    item: &str,
    used_by_date: &str,
    count: i64,
    run_out_time: Option<DateTime<Utc>>,
) -> Result<bool> {
    let query = r"
        UPDATE pantry_items
        SET used_by_date = $3, count = $4, run_out_time = $5
        WHERE pantry_id = $1 AND item = $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(pantry_id)
        .bind(item)
        .bind(used_by_date)
        .bind(count)
        .bind(run_out_time)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update pantry item")?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_item(pool: &PgPool, pantry_id: i64, item: &str) -> Result<bool> {
    let query = "DELETE FROM pantry_items WHERE pantry_id = $1 AND item = $2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(pantry_id)
        .bind(item)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete pantry item")?;
    Ok(result.rows_affected() > 0)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_outcome_debug_names() {
        assert_eq!(format!("{:?}", InsertOutcome::Added), "Added");
        assert_eq!(format!("{:?}", InsertOutcome::Duplicate), "Duplicate");
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
