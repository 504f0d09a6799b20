//! Identifier derivation for provisioned products.
//!
//! Both functions are pure: the same business fields always produce the
//! same output, and nothing here looks at persisted state.
//!
//! The code has no index component. Two items sharing bill number, tier
//! and date derive the same code, and the commit-time uniqueness check is
//! what rejects the second one. The display name embeds the item index and
//! is therefore unique within one batch.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::product::{BillNumber, TierCode};

/// Fixed prefix of every product code.
pub const CODE_PREFIX: &str = "T";

/// Width of the zero-padded index at the end of a display name.
pub const INDEX_WIDTH: usize = 3;

/// The derived identifiers for one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub code: String,
    pub display_name: String,
}

/// Business fields an identifier is derived from.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierInput<'a> {
    pub bill_no: &'a BillNumber,
    pub tier: &'a TierCode,
    pub date: Option<NaiveDate>,
    pub index: u32,
    pub name_stem: &'a str,
}

/// Derives both the code and the display name.
pub fn derive(input: IdentifierInput<'_>) -> Identifier {
    Identifier {
        code: derive_code(input.bill_no, input.tier, input.date),
        display_name: derive_display_name(input.name_stem, input.tier, input.date, input.index),
    }
}

/// `T` + bill suffix (2) + padded tier (2) + day (2) + month (2).
pub fn derive_code(bill_no: &BillNumber, tier: &TierCode, date: Option<NaiveDate>) -> String {
    let (day, month) = day_month(date);
    format!(
        "{CODE_PREFIX}{}{}{day}{month}",
        bill_no.suffix(),
        tier.padded()
    )
}

/// Stem + first tier digit + day (2) + month (2) + index (3).
pub fn derive_display_name(
    name_stem: &str,
    tier: &TierCode,
    date: Option<NaiveDate>,
    index: u32,
) -> String {
    let (day, month) = day_month(date);
    format!(
        "{name_stem}{}{day}{month}{index:0width$}",
        tier.first_digit(),
        width = INDEX_WIDTH
    )
}

fn day_month(date: Option<NaiveDate>) -> (String, String) {
    match date {
        Some(d) => (format!("{:02}", d.day()), format!("{:02}", d.month())),
        None => ("00".to_string(), "00".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_code_table() {
        let cases = [
            ("4477", "5", date(2024, 3, 9), "T77050903"),
            ("4477", "05", date(2024, 3, 9), "T77050903"),
            ("7", "12", date(2023, 12, 31), "T07123112"),
            ("B-1001", "3", None, "T01030000"),
            ("99", "0", date(2025, 1, 1), "T99000101"),
        ];

        for (bill, tier, d, expected) in cases {
            let bill = BillNumber::parse(bill).unwrap();
            let tier = TierCode::parse(tier).unwrap();
            assert_eq!(derive_code(&bill, &tier, d), expected, "bill={bill} tier={tier}");
        }
    }

    #[test]
    fn test_display_name_table() {
        let cases = [
            ("WIDGET", "5", date(2024, 3, 9), 1, "WIDGET50903001"),
            ("WIDGET", "5", date(2024, 3, 9), 3, "WIDGET50903003"),
            ("Ring", "12", date(2023, 12, 31), 42, "Ring13112042"),
            ("Ring", "12", None, 7, "Ring10000007"),
            ("X", "05", date(2024, 3, 9), 100, "X00903100"),
        ];

        for (stem, tier, d, index, expected) in cases {
            let tier = TierCode::parse(tier).unwrap();
            assert_eq!(derive_display_name(stem, &tier, d, index), expected);
        }
    }

    #[test]
    fn test_derive_is_deterministic() {
        let bill = BillNumber::parse("4477").unwrap();
        let tier = TierCode::parse("5").unwrap();
        let input = IdentifierInput {
            bill_no: &bill,
            tier: &tier,
            date: date(2024, 3, 9),
            index: 2,
            name_stem: "WIDGET",
        };

        let first = derive(input);
        let second = derive(input);
        assert_eq!(first, second);
        assert_eq!(first.code, "T77050903");
        assert_eq!(first.display_name, "WIDGET50903002");
    }

    #[test]
    fn test_code_ignores_index_and_stem() {
        let bill = BillNumber::parse("4477").unwrap();
        let tier = TierCode::parse("5").unwrap();

        let codes: HashSet<String> = (1..=5)
            .map(|index| {
                derive(IdentifierInput {
                    bill_no: &bill,
                    tier: &tier,
                    date: date(2024, 3, 9),
                    index,
                    name_stem: if index % 2 == 0 { "A" } else { "B" },
                })
                .code
            })
            .collect();
        assert_eq!(codes.len(), 1);
    }

    #[test]
    fn test_display_names_unique_within_batch() {
        let tier = TierCode::parse("5").unwrap();
        for n in [1u32, 2, 10, 150] {
            let names: HashSet<String> = (1..=n)
                .map(|i| derive_display_name("WIDGET", &tier, date(2024, 3, 9), i))
                .collect();
            assert_eq!(names.len(), n as usize);
        }
    }

    #[test]
    fn test_code_is_fixed_width() {
        let tier = TierCode::parse("1").unwrap();
        for bill in ["1", "12", "123456789"] {
            let bill = BillNumber::parse(bill).unwrap();
            assert_eq!(derive_code(&bill, &tier, None).len(), 9);
        }
    }
}
