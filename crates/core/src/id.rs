//! Strongly-typed identifiers used across the domain.
//!
//! A physical unit is identified by the pair (unit number, product code). Both
//! halves are normalized (trimmed, upper-cased) and must not be blank.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Donation/unit number printed on the physical unit (e.g. `W036825014001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitNumber(String);

/// Product code of the unit (e.g. `E0869V00`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductCode(String);

macro_rules! impl_code_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Parse and normalize an identifier.
            pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
                let normalized = value.as_ref().trim().to_ascii_uppercase();
                if normalized.is_empty() {
                    return Err(DomainError::invalid_id(format!("{} cannot be blank", $name)));
                }
                if normalized.chars().any(char::is_whitespace) {
                    return Err(DomainError::invalid_id(format!(
                        "{} cannot contain whitespace: {normalized}",
                        $name
                    )));
                }
                Ok(Self(normalized))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_code_newtype!(UnitNumber, "UnitNumber");
impl_code_newtype!(ProductCode, "ProductCode");

/// Composite identity of an inventoried unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitKey {
    pub unit_number: UnitNumber,
    pub product_code: ProductCode,
}

impl UnitKey {
    pub fn new(unit_number: UnitNumber, product_code: ProductCode) -> Self {
        Self {
            unit_number,
            product_code,
        }
    }

    /// Parse both halves from raw strings.
    pub fn parse(unit_number: &str, product_code: &str) -> Result<Self, DomainError> {
        Ok(Self::new(unit_number.parse()?, product_code.parse()?))
    }
}

impl core::fmt::Display for UnitKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.unit_number, self.product_code)
    }
}

impl crate::ValueObject for UnitKey {}
