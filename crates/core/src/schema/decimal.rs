use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

/// A numeric bound kept as its decimal text so it is never rounded through a
/// float. Encoded as a bare JSON number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal(String);

impl Decimal {
    /// Accepts any text that is a valid JSON number.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Number::from_str(text).ok().map(|_| Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the text has no fractional or exponent part.
    pub fn is_integer(&self) -> bool {
        !self.0.contains(['.', 'e', 'E'])
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as _;
        Number::from_str(&self.0)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Number::deserialize(deserializer).map(|n| Self(n.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_text() {
        assert_eq!(Decimal::parse("-12").unwrap().as_str(), "-12");
        assert_eq!(Decimal::parse(" 0.25 ").unwrap().as_str(), "0.25");
        assert!(Decimal::parse("ten").is_none());
    }

    #[test]
    fn test_is_integer() {
        assert!(Decimal::from(42).is_integer());
        assert!(!Decimal::parse("4.5").unwrap().is_integer());
        assert!(!Decimal::parse("1e3").unwrap().is_integer());
    }

    #[test]
    fn test_encodes_as_number() {
        let encoded = serde_json::to_string(&Decimal::from(-3)).unwrap();
        assert_eq!(encoded, "-3");
        let decoded: Decimal = serde_json::from_str("7").unwrap();
        assert_eq!(decoded, Decimal::from(7));
    }
}
