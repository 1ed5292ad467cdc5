//! Stock reconciliation.
//!
//! A product carries three views of the same stock: the per-outlet counts of every variant, the variant total, and
//! the product total. Every mutation moves all three by the same delta. The aggregates are not recomputed from the
//! outlet counts, so any drift that already exists is carried forward (and logged) rather than silently repaired.
use std::collections::BTreeMap;

use log::*;
use thiserror::Error;

use crate::db_types::{OrderItem, Product};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("Product {0} does not exist")]
    ProductNotFound(String),
    #[error("Product {product} has no variant with SKU {sku}")]
    VariantNotFound { product: String, sku: String },
    #[error("Insufficient stock of {product} ({sku}) at outlet {outlet}: {available} available, {requested} requested")]
    InsufficientStock { product: String, sku: String, outlet: String, available: i64, requested: i64 },
}

/// Whether line items leave an outlet (a sale or reservation) or return to it (a cancellation or restock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    Out,
    In,
}

impl StockDirection {
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            StockDirection::Out => -quantity,
            StockDirection::In => quantity,
        }
    }
}

/// Applies `delta` to the stock of variant `sku` at `outlet_id`, and to the variant and product aggregates.
///
/// A negative delta fails with [`InventoryError::InsufficientStock`] if the outlet holds fewer units than
/// requested. Positive deltas only fail if the variant does not exist.
pub fn reconcile(mut product: Product, sku: &str, outlet_id: &str, delta: i64) -> Result<Product, InventoryError> {
    let variant = product
        .variants
        .iter_mut()
        .find(|v| v.sku == sku)
        .ok_or_else(|| InventoryError::VariantNotFound { product: product.id.clone(), sku: sku.to_string() })?;
    let available = variant.outlet_stock(outlet_id);
    if available + delta < 0 {
        return Err(InventoryError::InsufficientStock {
            product: product.name.clone(),
            sku: sku.to_string(),
            outlet: outlet_id.to_string(),
            available,
            requested: -delta,
        });
    }
    *variant.outlet_stocks.entry(outlet_id.to_string()).or_insert(0) += delta;
    variant.stock += delta;
    let drift = variant.stock_drift();
    if drift != 0 {
        warn!(
            "📦️ Variant {sku} of {} has drifted by {drift} units from the sum of its outlet stocks. The drift is \
             carried forward unchanged.",
            product.id
        );
    }
    product.stock += delta;
    trace!("📦️ {sku}@{outlet_id} moved by {delta}. Outlet now holds {}.", available + delta);
    Ok(product)
}

/// Applies every line item to the pre-loaded `products`, in order.
///
/// Several items may refer to the same product, so each delta is applied on top of the previous ones. On error
/// nothing is returned, and the caller must discard any partially applied changes.
pub fn reconcile_line_items(
    mut products: BTreeMap<String, Product>,
    items: &[OrderItem],
    outlet_id: &str,
    direction: StockDirection,
) -> Result<BTreeMap<String, Product>, InventoryError> {
    for item in items {
        let product =
            products.remove(&item.product_id).ok_or_else(|| InventoryError::ProductNotFound(item.product_id.clone()))?;
        let product = reconcile(product, &item.sku, outlet_id, direction.signed(item.quantity))?;
        products.insert(item.product_id.clone(), product);
    }
    Ok(products)
}
