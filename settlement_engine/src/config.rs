//! Engine-level settings.
//!
//! These are deliberately kept small. Anything that describes the loyalty programme itself (earn rates, tier
//! thresholds) lives in the [`LoyaltyPolicy`](crate::db_types::LoyaltyPolicy) table and is re-read inside every
//! settlement transaction.
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::db_types::ConversionError;

const DEFAULT_MAX_TRANSACTION_ATTEMPTS: u32 = 8;

/// What to do when a settlement needs the loyalty policy and none has been configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// A missing policy aborts the settlement
    Strict,
    /// A missing policy is replaced by [`LoyaltyPolicy::default`](crate::db_types::LoyaltyPolicy::default)
    Lenient,
}

impl Display for PolicyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyMode::Strict => write!(f, "strict"),
            PolicyMode::Lenient => write!(f, "lenient"),
        }
    }
}

impl FromStr for PolicyMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(ConversionError { kind: "policy mode", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Policy handling for online order completion. Strict unless configured otherwise.
    pub online_policy_mode: PolicyMode,
    /// Policy handling for point-of-sale checkouts. Lenient unless configured otherwise.
    pub pos_policy_mode: PolicyMode,
    /// How many times the store re-runs a settlement transaction that lost a write conflict.
    pub max_transaction_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            online_policy_mode: PolicyMode::Strict,
            pos_policy_mode: PolicyMode::Lenient,
            max_transaction_attempts: DEFAULT_MAX_TRANSACTION_ATTEMPTS,
        }
    }
}

impl EngineConfig {
    pub fn with_online_policy_mode(mut self, mode: PolicyMode) -> Self {
        self.online_policy_mode = mode;
        self
    }

    pub fn with_pos_policy_mode(mut self, mode: PolicyMode) -> Self {
        self.pos_policy_mode = mode;
        self
    }

    pub fn with_max_transaction_attempts(mut self, attempts: u32) -> Self {
        self.max_transaction_attempts = attempts.max(1);
        self
    }
}
