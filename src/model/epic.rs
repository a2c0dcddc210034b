//! Validated identifiers: instrument epics and currency codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Unique identifier of a tradeable instrument (e.g. `CS.D.EURUSD.CFD.IP`).
///
/// Always 6 to 30 characters drawn from ASCII letters, digits, `.` and `_`.
/// Because of that restricted alphabet an epic can be embedded inside a
/// quoted SQL identifier (see the price tables) without escaping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Epic(String);

impl Epic {
    pub const MIN_LEN: usize = 6;
    pub const MAX_LEN: usize = 30;

    /// Validate and wrap an epic.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::Epic(value))
        }
    }

    /// Wrap a value read back from the database without re-validating it.
    pub(crate) fn from_storage(value: String) -> Self {
        Self(value)
    }

    pub fn is_valid(value: &str) -> bool {
        (Self::MIN_LEN..=Self::MAX_LEN).contains(&value.len())
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Epic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for Epic {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Epic {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Epic> for String {
    fn from(epic: Epic) -> Self {
        epic.0
    }
}

impl AsRef<str> for Epic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// ISO 4217 style currency code (three uppercase letters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        match value.as_bytes() {
            [a, b, c] if [a, b, c].iter().all(|x| x.is_ascii_uppercase()) => Ok(Self([*a, *b, *c])),
            _ => Err(ValidationError::Currency(value.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        // Only ever built from ASCII uppercase bytes.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.as_str().to_owned()
    }
}
