//! The persisted product record.

use chrono::{DateTime, NaiveDate, Utc};
use common::RecordId;
use record_store::{Fields, Record, RecordFilter};
use serde::{Deserialize, Serialize};

use super::{BillNumber, Money, TierCode};
use crate::artifact::ArtifactState;
use crate::error::DomainError;

/// A product created by the batch pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: RecordId,
    /// Index-sensitive display name.
    pub name: String,
    /// Lookup code; unique across the collection.
    pub code: String,
    pub category: String,
    pub purchase_price: Money,
    pub selling_price: Money,
    pub bill_no: BillNumber,
    pub tier: TierCode,
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub artifact: ArtifactState,
    pub created_at: DateTime<Utc>,
}

impl Record for Product {
    const COLLECTION: &'static str = "products";
    const UNIQUE_FIELDS: &'static [&'static str] = &["code"];

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Product {
    /// Filter selecting the product with the given code.
    pub fn code_filter(code: &str) -> RecordFilter {
        RecordFilter::eq("code", code)
    }

    /// Single-field update replacing the artifact state.
    pub fn artifact_update(state: &ArtifactState) -> Result<Fields, DomainError> {
        let mut fields = Fields::new();
        fields.insert("artifact".to_string(), serde_json::to_value(state)?);
        Ok(fields)
    }
}
