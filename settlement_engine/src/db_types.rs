//! Data types persisted by the settlement engine backends.
use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use rse_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {kind}: {value}")]
pub struct ConversionError {
    pub kind: &'static str,
    pub value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The lifecycle of an order.
///
/// ```text
/// pre_ordered ──► new ──► preparing ──► ready_for_pickup ──► out_for_delivery ──► delivered
///                  ▲                          │
/// pending_payment ─┘                          └──────────────────────────────────► fulfilled
/// ```
/// `canceled` is reachable from every non-terminal status. `delivered`, `fulfilled` and `canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// Checkout is done, but the payment gateway has not captured the payment yet
    PendingPayment,
    /// The customer ordered an item that is not in stock yet
    #[serde(alias = "pre-ordered")]
    PreOrdered,
    /// The order is confirmed and waiting for the outlet to start on it
    New,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    Delivered,
    /// The customer collected the order in person
    Fulfilled,
    Canceled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Fulfilled | Self::Canceled)
    }

    /// True if the order can move directly from `self` to `next` along the order lifecycle graph.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Canceled) => true,
            (PreOrdered | PendingPayment, New) => true,
            (New, Preparing) => true,
            (Preparing, ReadyForPickup) => true,
            (ReadyForPickup, OutForDelivery | Fulfilled) => true,
            (OutForDelivery, Delivered) => true,
            _ => false,
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::PendingPayment => "pending_payment",
            OrderStatusType::PreOrdered => "pre_ordered",
            OrderStatusType::New => "new",
            OrderStatusType::Preparing => "preparing",
            OrderStatusType::ReadyForPickup => "ready_for_pickup",
            OrderStatusType::OutForDelivery => "out_for_delivery",
            OrderStatusType::Delivered => "delivered",
            OrderStatusType::Fulfilled => "fulfilled",
            OrderStatusType::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending_payment" => Ok(Self::PendingPayment),
            "pre_ordered" | "pre-ordered" => Ok(Self::PreOrdered),
            "new" => Ok(Self::New),
            "preparing" => Ok(Self::Preparing),
            "ready_for_pickup" => Ok(Self::ReadyForPickup),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "fulfilled" => Ok(Self::Fulfilled),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(ConversionError::new("order status", s)),
        }
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

//--------------------------------------       OrderType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Stock is reserved when the order is placed
    #[default]
    Regular,
    /// Stock does not exist yet, so nothing is reserved at checkout
    PreOrder,
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Regular => write!(f, "regular"),
            OrderType::PreOrder => write!(f, "pre_order"),
        }
    }
}

//--------------------------------------          Tier         ---------------------------------------------------------
/// Membership tier. The declaration order is the promotion order, so tiers can be compared with `<` and `>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Silver,
    Gold,
    Platinum,
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Silver => write!(f, "silver"),
            Tier::Gold => write!(f, "gold"),
            Tier::Platinum => write!(f, "platinum"),
        }
    }
}

impl FromStr for Tier {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "platinum" => Ok(Self::Platinum),
            _ => Err(ConversionError::new("tier", s)),
        }
    }
}

impl From<String> for Tier {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid tier: {value}. But this conversion cannot fail. Defaulting to silver");
            Tier::Silver
        })
    }
}

//--------------------------------------     LedgerEntryType    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Earn,
    Redeem,
    Adjustment,
}

impl Display for LedgerEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerEntryType::Earn => write!(f, "earn"),
            LedgerEntryType::Redeem => write!(f, "redeem"),
            LedgerEntryType::Adjustment => write!(f, "adjustment"),
        }
    }
}

//--------------------------------------        OrderItem       --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderItem {
    pub fn new<P: Into<String>, S: Into<String>>(product_id: P, sku: S, quantity: i64, unit_price: Money) -> Self {
        Self { product_id: product_id.into(), sku: sku.into(), quantity, unit_price }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------          Order         --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    /// `None` for anonymous checkouts
    pub customer_id: Option<String>,
    pub order_type: OrderType,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    /// Correlation id supplied by the payment gateway when the payment was captured
    pub payment_reference: Option<String>,
    pub outlet_id: Option<String>,
    pub total_price: Money,
    pub points_redeemed: i64,
    /// Set while the order's line items are held out of its outlet's stock
    #[serde(default)]
    pub stock_reserved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Stock was taken out of the outlet for this order, and has to go back if the order is cancelled.
    ///
    /// Regular orders reserve at placement. Pre-orders reserve when their payment is captured, provided the outlet
    /// has the stock by then.
    pub fn holds_stock_reservation(&self) -> bool {
        self.stock_reserved && !self.items.is_empty()
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// The order id as assigned by the storefront
    pub order_id: OrderId,
    pub customer_id: Option<String>,
    #[serde(default)]
    pub order_type: OrderType,
    /// The outlet that ships or hands over the order
    pub outlet_id: Option<String>,
    pub items: Vec<OrderItem>,
    /// The amount charged for the order, after discounts and shipping
    pub total_price: Money,
    /// Loyalty points the customer chose to spend on this order at checkout
    #[serde(default)]
    pub points_redeemed: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Creates a regular order whose total is the sum of its line items.
    pub fn new(order_id: OrderId, customer_id: Option<String>, items: Vec<OrderItem>) -> Self {
        let total_price = items.iter().map(OrderItem::line_total).sum();
        Self {
            order_id,
            customer_id,
            order_type: OrderType::Regular,
            outlet_id: None,
            items,
            total_price,
            points_redeemed: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_outlet<S: Into<String>>(mut self, outlet_id: S) -> Self {
        self.outlet_id = Some(outlet_id.into());
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    pub fn with_total_price(mut self, total_price: Money) -> Self {
        self.total_price = total_price;
        self
    }

    pub fn with_points_redeemed(mut self, points: i64) -> Self {
        self.points_redeemed = points;
        self
    }

    pub fn initial_status(&self) -> OrderStatusType {
        match self.order_type {
            OrderType::Regular => OrderStatusType::PendingPayment,
            OrderType::PreOrder => OrderStatusType::PreOrdered,
        }
    }
}

//--------------------------------------         PosSale        --------------------------------------------------------
/// A completed checkout at a point-of-sale terminal. The terminal generates the `sale_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSale {
    pub sale_id: String,
    pub outlet_id: String,
    pub customer_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_price: Money,
    #[serde(default)]
    pub points_redeemed: i64,
    pub promo_code: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl PosSale {
    pub fn new<S: Into<String>, O: Into<String>>(sale_id: S, outlet_id: O, items: Vec<OrderItem>) -> Self {
        let total_price = items.iter().map(OrderItem::line_total).sum();
        Self {
            sale_id: sale_id.into(),
            outlet_id: outlet_id.into(),
            customer_id: None,
            items,
            total_price,
            points_redeemed: 0,
            promo_code: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_customer<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_promo_code<S: Into<String>>(mut self, code: S) -> Self {
        self.promo_code = Some(code.into());
        self
    }

    pub fn with_points_redeemed(mut self, points: i64) -> Self {
        self.points_redeemed = points;
        self
    }

    pub fn with_total_price(mut self, total_price: Money) -> Self {
        self.total_price = total_price;
        self
    }
}

/// The persisted form of a settled [`PosSale`].
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PosSaleRecord {
    pub id: i64,
    pub sale_id: String,
    pub outlet_id: String,
    pub customer_id: Option<String>,
    pub total_price: Money,
    pub points_redeemed: i64,
    pub promo_code: Option<String>,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

//--------------------------------------         Customer       --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub lifetime_spend: Money,
    pub points_balance: i64,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       LedgerEntry      --------------------------------------------------------
/// An immutable record of a change to a customer's point balance.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub customer_id: String,
    pub delta: i64,
    pub entry_type: LedgerEntryType,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub customer_id: String,
    pub delta: i64,
    pub entry_type: LedgerEntryType,
    pub reason: String,
}

//--------------------------------------      LoyaltyPolicy     --------------------------------------------------------
/// Process-wide loyalty programme settings, administered outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LoyaltyPolicy {
    pub silver_points_per_100: i64,
    pub gold_points_per_100: i64,
    pub platinum_points_per_100: i64,
    /// The monetary value of a single point when redeemed
    pub point_value: Money,
    pub gold_threshold: Money,
    pub platinum_threshold: Money,
}

impl Default for LoyaltyPolicy {
    /// The built-in policy used when none has been configured and the caller runs in lenient mode.
    fn default() -> Self {
        Self {
            silver_points_per_100: 1,
            gold_points_per_100: 2,
            platinum_points_per_100: 3,
            point_value: Money::from(1),
            gold_threshold: Money::from(5_000_000),
            platinum_threshold: Money::from(15_000_000),
        }
    }
}

impl LoyaltyPolicy {
    pub fn points_per_100_for(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Silver => self.silver_points_per_100,
            Tier::Gold => self.gold_points_per_100,
            Tier::Platinum => self.platinum_points_per_100,
        }
    }

    /// A flat-rate policy, mostly useful for tests and simple deployments.
    pub fn flat(points_per_100: i64, gold_threshold: Money, platinum_threshold: Money) -> Self {
        Self {
            silver_points_per_100: points_per_100,
            gold_points_per_100: points_per_100,
            platinum_points_per_100: points_per_100,
            point_value: Money::from(1),
            gold_threshold,
            platinum_threshold,
        }
    }
}

//--------------------------------------      Product/Variant   --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub sku: String,
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    /// Stock held at each outlet, keyed by outlet id
    #[serde(default)]
    pub outlet_stocks: BTreeMap<String, i64>,
}

impl Variant {
    pub fn new<S: Into<String>>(sku: S, price: Money) -> Self {
        Self { sku: sku.into(), price, stock: 0, outlet_stocks: BTreeMap::new() }
    }

    /// Adds stock at an outlet, keeping the variant total in step.
    pub fn with_outlet_stock<S: Into<String>>(mut self, outlet_id: S, quantity: i64) -> Self {
        *self.outlet_stocks.entry(outlet_id.into()).or_insert(0) += quantity;
        self.stock += quantity;
        self
    }

    pub fn outlet_stock(&self, outlet_id: &str) -> i64 {
        self.outlet_stocks.get(outlet_id).copied().unwrap_or(0)
    }

    /// The difference between the recorded aggregate and the sum of the per-outlet stocks. Zero in steady state.
    pub fn stock_drift(&self) -> i64 {
        self.stock - self.outlet_stocks.values().sum::<i64>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub vendor_id: String,
    pub name: String,
    /// Aggregate stock over all variants
    pub stock: i64,
    pub variants: Vec<Variant>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new<I: Into<String>, V: Into<String>, N: Into<String>>(id: I, vendor_id: V, name: N) -> Self {
        Self {
            id: id.into(),
            vendor_id: vendor_id.into(),
            name: name.into(),
            stock: 0,
            variants: vec![],
            updated_at: Utc::now(),
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.stock += variant.stock;
        self.variants.push(variant);
        self
    }

    pub fn variant(&self, sku: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.sku == sku)
    }
}

//--------------------------------------          Coupon        --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
