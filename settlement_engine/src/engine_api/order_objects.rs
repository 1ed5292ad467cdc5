use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{db_types::OrderStatusType, traits::CustomerApiError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub customer_id: Option<String>,
    pub outlet_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn since<T>(mut self, since: T) -> Result<Self, CustomerApiError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| CustomerApiError::QueryError(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, CustomerApiError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| CustomerApiError::QueryError(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    pub fn with_customer_id<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_outlet_id<S: Into<String>>(mut self, outlet_id: S) -> Self {
        self.outlet_id = Some(outlet_id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() &&
            self.outlet_id.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(customer_id) = &self.customer_id {
            write!(f, "customer_id: {customer_id}. ")?;
        }
        if let Some(outlet_id) = &self.outlet_id {
            write!(f, "outlet_id: {outlet_id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}
