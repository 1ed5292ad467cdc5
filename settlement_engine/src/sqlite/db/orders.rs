use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, PaymentStatus},
    engine_api::order_objects::OrderQueryFilter,
};

/// Inserts a new order and its line items using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// The order starts in the status given by [`NewOrder::initial_status`]. `stock_reserved` records whether the caller
/// has already taken the line items out of the outlet's stock.
pub async fn insert_order(
    order: NewOrder,
    stock_reserved: bool,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let status = order.initial_status();
    let mut inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                order_type,
                status,
                outlet_id,
                total_price,
                points_redeemed,
                stock_reserved,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.customer_id)
    .bind(order.order_type)
    .bind(status)
    .bind(&order.outlet_id)
    .bind(order.total_price)
    .bind(order.points_redeemed)
    .bind(stock_reserved)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await?;
    insert_items(&order.order_id, &order.items, conn).await?;
    debug!("🗃️ Order {} inserted with id {} and {} line items", inserted.order_id, inserted.id, order.items.len());
    inserted.items = order.items;
    Ok(inserted)
}

async fn insert_items(order_id: &OrderId, items: &[OrderItem], conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("INSERT INTO order_items (order_id, product_id, sku, quantity, unit_price) ");
    builder.push_values(items, |mut b, item| {
        b.push_bind(order_id.as_str())
            .push_bind(&item.product_id)
            .push_bind(&item.sku)
            .push_bind(item.quantity)
            .push_bind(item.unit_price);
    });
    builder.build().execute(conn).await?;
    Ok(())
}

/// Returns the order for the corresponding `order_id`, without its line items.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as(
        "SELECT product_id, sku, quantity, unit_price FROM order_items WHERE order_id = $1 ORDER BY id ASC",
    )
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Returns the order for the corresponding `order_id`, with its line items loaded.
pub async fn fetch_order_with_items(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let Some(mut order) = fetch_order_by_order_id(order_id, &mut *conn).await? else {
        return Ok(None);
    };
    order.items = fetch_items(order_id, conn).await?;
    Ok(Some(order))
}

/// Writes the order status and payment status. Line items are not loaded on the returned order.
pub async fn update_status(
    order_id: &OrderId,
    status: OrderStatusType,
    payment_status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, payment_status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $3
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(payment_status)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Order {order_id} is now {status} ({payment_status:?})");
    Ok(order)
}

/// Records whether the order's line items are currently held out of its outlet's stock.
pub async fn set_stock_reserved(
    order_id: &OrderId,
    reserved: bool,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET stock_reserved = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2")
        .bind(reserved)
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    trace!("🗃️ Stock reservation for order {order_id} set to {reserved}");
    Ok(())
}

/// Writes the outcome of a payment capture. Line items are not loaded on the returned order.
pub async fn update_payment(
    order_id: &OrderId,
    status: OrderStatusType,
    payment_status: PaymentStatus,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                payment_status = $2,
                payment_reference = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $4
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(payment_status)
    .bind(reference)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(outlet) = query.outlet_id {
        where_clause.push("outlet_id = ");
        where_clause.push_bind_unseparated(outlet);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        let status_clause = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}
