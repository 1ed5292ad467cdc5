use log::debug;
use rse_common::Money;
use sqlx::SqliteConnection;

use crate::db_types::{Customer, Tier};

pub async fn fetch_customer(customer_id: &str, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer =
        sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(customer_id).fetch_optional(conn).await?;
    Ok(customer)
}

/// Returns the customer with the given id, creating a silver-tier account with no points or spend if necessary.
pub async fn fetch_or_create_customer(customer_id: &str, conn: &mut SqliteConnection) -> Result<Customer, sqlx::Error> {
    let result = sqlx::query("INSERT INTO customers (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(customer_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() > 0 {
        debug!("🗃️ Created customer account {customer_id}");
    }
    let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(customer_id).fetch_one(conn).await?;
    Ok(customer)
}

/// Applies a loyalty update to the customer in a single statement and returns the updated record.
///
/// `points_delta` and `spend_delta` are added to the stored values. The tier is overwritten.
pub async fn update_loyalty(
    customer_id: &str,
    points_delta: i64,
    spend_delta: Money,
    tier: Tier,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as(
        r#"
            UPDATE customers SET
                points_balance = points_balance + $1,
                lifetime_spend = lifetime_spend + $2,
                tier = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(points_delta)
    .bind(spend_delta)
    .bind(tier)
    .bind(customer_id)
    .fetch_optional(conn)
    .await?;
    Ok(customer)
}
