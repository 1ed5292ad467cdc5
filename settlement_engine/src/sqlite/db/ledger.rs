use sqlx::SqliteConnection;

use crate::db_types::{LedgerEntry, NewLedgerEntry};

pub async fn insert_entry(entry: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<LedgerEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"
            INSERT INTO loyalty_ledger (customer_id, delta, entry_type, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(entry.customer_id)
    .bind(entry.delta)
    .bind(entry.entry_type)
    .bind(entry.reason)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

/// Appends the entries in order. Entries are never merged.
pub async fn insert_entries(
    entries: Vec<NewLedgerEntry>,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let mut result = Vec::with_capacity(entries.len());
    for entry in entries {
        result.push(insert_entry(entry, conn).await?);
    }
    Ok(result)
}

/// The customer's ledger, oldest entry first.
pub async fn fetch_ledger_for_customer(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM loyalty_ledger WHERE customer_id = $1 ORDER BY id ASC")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
