use sqlx::SqliteConnection;

use crate::db_types::Coupon;

pub async fn fetch_coupon(code: &str, conn: &mut SqliteConnection) -> Result<Option<Coupon>, sqlx::Error> {
    let coupon = sqlx::query_as("SELECT * FROM coupons WHERE code = $1").bind(code).fetch_optional(conn).await?;
    Ok(coupon)
}

/// Registers the code if it is new. An existing code keeps its usage count.
pub async fn upsert_coupon(code: &str, conn: &mut SqliteConnection) -> Result<Coupon, sqlx::Error> {
    sqlx::query("INSERT INTO coupons (code) VALUES ($1) ON CONFLICT (code) DO NOTHING")
        .bind(code)
        .execute(&mut *conn)
        .await?;
    let coupon = sqlx::query_as("SELECT * FROM coupons WHERE code = $1").bind(code).fetch_one(conn).await?;
    Ok(coupon)
}

/// Increments the usage counter for `code`. Returns `false` if the code does not exist.
pub async fn increment_usage(code: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE coupons SET usage_count = usage_count + 1, updated_at = CURRENT_TIMESTAMP WHERE code = $1",
    )
    .bind(code)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
