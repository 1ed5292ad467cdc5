use sqlx::SqliteConnection;

use crate::db_types::LoyaltyPolicy;

/// Loads the loyalty policy. Returns `None` if no policy has been configured.
///
/// Settlement calls this inside its own transaction every time, so a policy change applies from the next
/// settlement onwards.
pub async fn fetch_policy(conn: &mut SqliteConnection) -> Result<Option<LoyaltyPolicy>, sqlx::Error> {
    let policy = sqlx::query_as(
        r#"
            SELECT silver_points_per_100, gold_points_per_100, platinum_points_per_100, point_value,
                   gold_threshold, platinum_threshold
            FROM loyalty_policy WHERE id = 1
        "#,
    )
    .fetch_optional(conn)
    .await?;
    Ok(policy)
}

pub async fn upsert_policy(policy: LoyaltyPolicy, conn: &mut SqliteConnection) -> Result<LoyaltyPolicy, sqlx::Error> {
    let policy = sqlx::query_as(
        r#"
            INSERT INTO loyalty_policy (
                id,
                silver_points_per_100,
                gold_points_per_100,
                platinum_points_per_100,
                point_value,
                gold_threshold,
                platinum_threshold
            ) VALUES (1, $1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                silver_points_per_100 = excluded.silver_points_per_100,
                gold_points_per_100 = excluded.gold_points_per_100,
                platinum_points_per_100 = excluded.platinum_points_per_100,
                point_value = excluded.point_value,
                gold_threshold = excluded.gold_threshold,
                platinum_threshold = excluded.platinum_threshold,
                updated_at = CURRENT_TIMESTAMP
            RETURNING silver_points_per_100, gold_points_per_100, platinum_points_per_100, point_value,
                      gold_threshold, platinum_threshold;
        "#,
    )
    .bind(policy.silver_points_per_100)
    .bind(policy.gold_points_per_100)
    .bind(policy.platinum_points_per_100)
    .bind(policy.point_value)
    .bind(policy.gold_threshold)
    .bind(policy.platinum_threshold)
    .fetch_one(conn)
    .await?;
    Ok(policy)
}
