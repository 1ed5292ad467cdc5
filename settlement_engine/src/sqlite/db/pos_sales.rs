use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{OrderItem, OrderStatusType, PaymentStatus, PosSale, PosSaleRecord};

pub async fn sale_exists(sale_id: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM pos_sales WHERE sale_id = $1").bind(sale_id).fetch_optional(conn).await?;
    Ok(row.is_some())
}

/// Records a settled sale and its line items. POS sales are paid and handed over at the till, so they are stored
/// as `fulfilled` and `paid`.
pub async fn insert_sale(sale: &PosSale, conn: &mut SqliteConnection) -> Result<PosSaleRecord, sqlx::Error> {
    let mut record: PosSaleRecord = sqlx::query_as(
        r#"
            INSERT INTO pos_sales (
                sale_id,
                outlet_id,
                customer_id,
                total_price,
                points_redeemed,
                promo_code,
                status,
                payment_status,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(&sale.sale_id)
    .bind(&sale.outlet_id)
    .bind(&sale.customer_id)
    .bind(sale.total_price)
    .bind(sale.points_redeemed)
    .bind(&sale.promo_code)
    .bind(OrderStatusType::Fulfilled)
    .bind(PaymentStatus::Paid)
    .bind(sale.created_at)
    .fetch_one(&mut *conn)
    .await?;
    if !sale.items.is_empty() {
        let mut builder =
            QueryBuilder::new("INSERT INTO pos_sale_items (sale_id, product_id, sku, quantity, unit_price) ");
        builder.push_values(&sale.items, |mut b, item| {
            b.push_bind(&sale.sale_id)
                .push_bind(&item.product_id)
                .push_bind(&item.sku)
                .push_bind(item.quantity)
                .push_bind(item.unit_price);
        });
        builder.build().execute(conn).await?;
    }
    debug!("🗃️ POS sale {} recorded at outlet {} with id {}", record.sale_id, record.outlet_id, record.id);
    record.items = sale.items.clone();
    Ok(record)
}

pub async fn fetch_sale(sale_id: &str, conn: &mut SqliteConnection) -> Result<Option<PosSaleRecord>, sqlx::Error> {
    let record: Option<PosSaleRecord> =
        sqlx::query_as("SELECT * FROM pos_sales WHERE sale_id = $1").bind(sale_id).fetch_optional(&mut *conn).await?;
    let Some(mut record) = record else {
        return Ok(None);
    };
    let items: Vec<OrderItem> = sqlx::query_as(
        "SELECT product_id, sku, quantity, unit_price FROM pos_sale_items WHERE sale_id = $1 ORDER BY id ASC",
    )
    .bind(sale_id)
    .fetch_all(conn)
    .await?;
    record.items = items;
    Ok(Some(record))
}
