use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use settlement_engine::{
    db_types::OrderStatusType,
    order_objects::OrderQueryFilter,
    settlement_objects::{SettlementOutcome, SettlementSummary},
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The response to a settlement request. `summary` is absent when the order had already been processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResponse {
    pub success: bool,
    pub message: String,
    pub already_processed: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<SettlementSummary>,
}

impl From<SettlementOutcome> for SettlementResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        let message = outcome.message();
        let already_processed = outcome.is_no_op();
        let summary = match outcome {
            SettlementOutcome::Settled(summary) => Some(summary),
            SettlementOutcome::AlreadySettled { .. } => None,
        };
        Self { success: true, message, already_processed, summary }
    }
}

/// The payment gateway's capture signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub captured: bool,
    /// The gateway's correlation id for the payment
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateParams {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteOrderParams {
    pub target_status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustPointsParams {
    pub delta: i64,
    pub reason: String,
}

/// Query string parameters for an order search. `status` is a comma-separated list, e.g. `new,preparing`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    pub customer_id: Option<String>,
    pub outlet_id: Option<String>,
    pub status: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TryFrom<OrderSearchParams> for OrderQueryFilter {
    type Error = ServerError;

    fn try_from(params: OrderSearchParams) -> Result<Self, Self::Error> {
        let status = params
            .status
            .map(|s| {
                s.split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.parse::<OrderStatusType>())
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
        Ok(OrderQueryFilter {
            customer_id: params.customer_id,
            outlet_id: params.outlet_id,
            since: params.since,
            until: params.until,
            status,
        })
    }
}
