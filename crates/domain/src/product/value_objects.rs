//! Value objects for the product domain.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = 10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Category/tier code, one or two decimal digits (the `npp` field).
///
/// Kept as supplied: `"5"` and `"05"` pad to the same two-digit form but
/// keep different leading digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TierCode(String);

impl TierCode {
    /// Parses a tier code, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("npp", "tier code is required"));
        }
        if trimmed.len() > 2 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation(
                "npp",
                format!("tier code must be one or two digits, got {trimmed:?}"),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the code left-padded with `0` to two digits.
    pub fn padded(&self) -> String {
        format!("{:0>2}", self.0)
    }

    /// Returns the first digit as supplied.
    pub fn first_digit(&self) -> char {
        // parse() guarantees at least one ASCII digit
        self.0.chars().next().unwrap_or('0')
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TierCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TierCode> for String {
    fn from(code: TierCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for TierCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Purchase bill / reference number shared by every item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillNumber(String);

impl BillNumber {
    /// Parses a bill number, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("billNo", "bill number is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the last two characters, left-padded with `0`.
    pub fn suffix(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(2)..].iter().collect();
        format!("{tail:0>2}")
    }

    /// Returns the bill number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BillNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BillNumber> for String {
    fn from(bill: BillNumber) -> Self {
        bill.0
    }
}

impl std::fmt::Display for BillNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "10.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_money_negative() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::zero().is_negative());
    }

    #[test]
    fn test_tier_code_padding() {
        assert_eq!(TierCode::parse("5").unwrap().padded(), "05");
        assert_eq!(TierCode::parse("12").unwrap().padded(), "12");
        assert_eq!(TierCode::parse(" 7 ").unwrap().as_str(), "7");
    }

    #[test]
    fn test_tier_code_first_digit_as_supplied() {
        assert_eq!(TierCode::parse("5").unwrap().first_digit(), '5');
        assert_eq!(TierCode::parse("05").unwrap().first_digit(), '0');
        assert_eq!(TierCode::parse("12").unwrap().first_digit(), '1');
    }

    #[test]
    fn test_tier_code_rejects_invalid() {
        assert!(TierCode::parse("").is_err());
        assert!(TierCode::parse("123").is_err());
        assert!(TierCode::parse("a1").is_err());
        assert!(TierCode::parse("-1").is_err());
    }

    #[test]
    fn test_bill_number_suffix() {
        assert_eq!(BillNumber::parse("4477").unwrap().suffix(), "77");
        assert_eq!(BillNumber::parse("7").unwrap().suffix(), "07");
        assert_eq!(BillNumber::parse("AB-12").unwrap().suffix(), "12");
        assert_eq!(BillNumber::parse("42").unwrap().suffix(), "42");
    }

    #[test]
    fn test_bill_number_rejects_blank() {
        assert!(BillNumber::parse("   ").is_err());
    }

    #[test]
    fn test_serde_goes_through_validation() {
        let tier: TierCode = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(tier.padded(), "05");
        assert!(serde_json::from_str::<TierCode>("\"555\"").is_err());

        let bill: BillNumber = serde_json::from_str("\"4477\"").unwrap();
        assert_eq!(serde_json::to_string(&bill).unwrap(), "\"4477\"");
    }
}
