//! Strongly-typed identifiers used across the domain.

use serde::{Deserialize, Serialize};

/// Identifier of a drink.
///
/// Drinks are keyed by the store-assigned integer primary key; new ids are
/// never minted by the domain layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrinkId(i64);

impl DrinkId {
    pub fn from_i64(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for DrinkId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for DrinkId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<DrinkId> for i64 {
    fn from(value: DrinkId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_integer() {
        let id = DrinkId::from(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&DrinkId::from_i64(7)).unwrap();
        assert_eq!(json, "7");
    }
}
