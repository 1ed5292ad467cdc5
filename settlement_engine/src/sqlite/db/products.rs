//! Products are stored with their variants serialized as JSON.
//!
//! Some rows hold the variants as a JSON array, others as an object keyed by SKU. [`parse_variants`] accepts both and
//! always yields the canonical ordered list, so nothing above this module ever sees the keyed form. Writes always
//! store the list.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::*;
use serde_json::Value;
use sqlx::{FromRow, SqliteConnection};

use crate::{db_types::{Product, Variant}, traits::SettlementError};

#[derive(Debug, Clone, FromRow)]
struct ProductRow {
    id: String,
    vendor_id: String,
    name: String,
    stock: i64,
    variants: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = serde_json::Error;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let variants = parse_variants(&row.variants)?;
        Ok(Product {
            id: row.id,
            vendor_id: row.vendor_id,
            name: row.name,
            stock: row.stock,
            variants,
            updated_at: row.updated_at,
        })
    }
}

/// Parses a stored variant collection into the canonical ordered list.
///
/// A keyed object is ordered by SKU. If a keyed variant has no `sku` field, the key is used.
pub fn parse_variants(json: &str) -> Result<Vec<Variant>, serde_json::Error> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Array(_) => serde_json::from_value(value),
        Value::Object(map) => {
            trace!("🗃️ Normalizing keyed variant map with {} entries", map.len());
            let sorted = map.into_iter().collect::<BTreeMap<String, Value>>();
            sorted
                .into_iter()
                .map(|(key, v)| {
                    let mut variant: Variant = serde_json::from_value(v)?;
                    if variant.sku.is_empty() {
                        variant.sku = key;
                    }
                    Ok::<_, serde_json::Error>(variant)
                })
                .collect()
        },
        Value::Null => Ok(Vec::new()),
        other => Err(serde::de::Error::custom(format!("Variants must be a list or a map, not {other}"))),
    }
}

pub async fn fetch_product(product_id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, SettlementError> {
    let row: Option<ProductRow> =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    let product = row.map(Product::try_from).transpose()?;
    Ok(product)
}

/// Loads every product in `product_ids` once. Fails with `ProductNotFound` on the first one that does not exist.
pub async fn fetch_products<'a, I>(
    product_ids: I,
    conn: &mut SqliteConnection,
) -> Result<BTreeMap<String, Product>, SettlementError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut products = BTreeMap::new();
    for id in product_ids {
        if products.contains_key(id) {
            continue;
        }
        let product =
            fetch_product(id, &mut *conn).await?.ok_or_else(|| SettlementError::ProductNotFound(id.to_string()))?;
        products.insert(id.to_string(), product);
    }
    Ok(products)
}

/// Writes back the stock of a product as returned by the inventory reconciler.
pub async fn update_stock(product: &Product, conn: &mut SqliteConnection) -> Result<(), SettlementError> {
    let variants = serde_json::to_string(&product.variants)?;
    let result =
        sqlx::query("UPDATE products SET stock = $1, variants = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3")
            .bind(product.stock)
            .bind(variants)
            .bind(&product.id)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        return Err(SettlementError::ProductNotFound(product.id.clone()));
    }
    trace!("🗃️ Stock for product {} updated. Total stock is now {}", product.id, product.stock);
    Ok(())
}

pub async fn upsert_product(product: Product, conn: &mut SqliteConnection) -> Result<Product, SettlementError> {
    let variants = serde_json::to_string(&product.variants)?;
    let row: ProductRow = sqlx::query_as(
        r#"
            INSERT INTO products (id, vendor_id, name, stock, variants)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                vendor_id = excluded.vendor_id,
                name = excluded.name,
                stock = excluded.stock,
                variants = excluded.variants,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(&product.id)
    .bind(&product.vendor_id)
    .bind(&product.name)
    .bind(product.stock)
    .bind(variants)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product {} saved with {} variants", row.id, product.variants.len());
    Ok(Product::try_from(row)?)
}
