//! Registered API applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// API key identifying an application on the venue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKey(String);

impl ApiKey {
    pub const LEN: usize = 40;

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.len() == Self::LEN && value.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(value))
        } else {
            Err(ValidationError::ApiKey(value))
        }
    }

    pub(crate) fn from_storage(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for ApiKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ApiKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiKey> for String {
    fn from(key: ApiKey) -> Self {
        key.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    Enabled,
    Disabled,
    Revoked,
}

impl AppStatus {
    pub fn code(self) -> i64 {
        match self {
            Self::Enabled => 1,
            Self::Disabled => 0,
            Self::Revoked => -1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Enabled),
            0 => Some(Self::Disabled),
            -1 => Some(Self::Revoked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub access_to_equity_prices: bool,
    pub quote_orders_allowed: bool,
}

/// Request allowances granted to the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    pub overall_requests: u32,
    pub account_requests: u32,
    pub trading_requests: u32,
    pub historical_data_points: u32,
    pub concurrent_subscriptions: u32,
}

/// A row of the `Apps` table.
///
/// `updated` is assigned by the store on every write; the value passed to an
/// update is ignored. `created` is kept from the first write of the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub key: ApiKey,
    pub name: String,
    pub status: AppStatus,
    pub permission: Permission,
    pub allowance: Allowance,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Application {
    /// `created` must be whole seconds; `updated` is never written from here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        super::price::whole_seconds(&self.created)
    }
}
