//! Batch provisioning request and the items it expands into.

use chrono::{NaiveDate, Utc};
use common::RecordId;
use serde::{Deserialize, Serialize};

use super::{BillNumber, Money, Product, TierCode};
use crate::artifact::ArtifactState;
use crate::error::DomainError;
use crate::identifier::{self, Identifier, IdentifierInput};

/// The caller's batch input, as received.
///
/// Never persisted. Call [`validate`](Self::validate) to obtain a
/// [`BatchTemplate`] before doing anything with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningRequest {
    /// Name stem shared by every item.
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub purchase_price_cents: i64,
    #[serde(default)]
    pub selling_price_cents: i64,
    /// Number of items to create. Signed so that bad input reaches validation.
    pub count: i64,
    pub bill_no: String,
    /// Category/tier code.
    pub npp: String,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
}

impl ProvisioningRequest {
    /// Checks every field and returns the shared template for the batch.
    pub fn validate(&self) -> Result<BatchTemplate, DomainError> {
        let name_stem = self.name.trim();
        if name_stem.is_empty() {
            return Err(DomainError::validation("name", "name is required"));
        }
        if self.count <= 0 {
            return Err(DomainError::validation(
                "count",
                format!("count must be a positive integer, got {}", self.count),
            ));
        }
        let count = u32::try_from(self.count)
            .map_err(|_| DomainError::validation("count", "count is too large"))?;

        let purchase_price = Money::from_cents(self.purchase_price_cents);
        if purchase_price.is_negative() {
            return Err(DomainError::validation(
                "purchasePriceCents",
                "price cannot be negative",
            ));
        }
        let selling_price = Money::from_cents(self.selling_price_cents);
        if selling_price.is_negative() {
            return Err(DomainError::validation(
                "sellingPriceCents",
                "price cannot be negative",
            ));
        }

        Ok(BatchTemplate {
            name_stem: name_stem.to_string(),
            category: self.category.trim().to_string(),
            purchase_price,
            selling_price,
            count,
            bill_no: BillNumber::parse(&self.bill_no)?,
            tier: TierCode::parse(&self.npp)?,
            purchase_date: self.purchase_date,
        })
    }
}

/// Validated fields shared by every item of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTemplate {
    pub name_stem: String,
    pub category: String,
    pub purchase_price: Money,
    pub selling_price: Money,
    pub count: u32,
    pub bill_no: BillNumber,
    pub tier: TierCode,
    pub purchase_date: Option<NaiveDate>,
}

impl BatchTemplate {
    /// Builds the item at a 1-based index.
    pub fn item(&self, index: u32) -> ProvisioningItem {
        let identifier = identifier::derive(IdentifierInput {
            bill_no: &self.bill_no,
            tier: &self.tier,
            date: self.purchase_date,
            index,
            name_stem: &self.name_stem,
        });

        ProvisioningItem {
            index,
            identifier,
            category: self.category.clone(),
            purchase_price: self.purchase_price,
            selling_price: self.selling_price,
            bill_no: self.bill_no.clone(),
            tier: self.tier.clone(),
            purchase_date: self.purchase_date,
        }
    }

    /// Expands the template into items `1..=count`, in order.
    pub fn items(&self) -> impl Iterator<Item = ProvisioningItem> + '_ {
        (1..=self.count).map(|index| self.item(index))
    }
}

/// One unit of work derived from a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningItem {
    /// 1-based position in the batch.
    pub index: u32,
    pub identifier: Identifier,
    pub category: String,
    pub purchase_price: Money,
    pub selling_price: Money,
    pub bill_no: BillNumber,
    pub tier: TierCode,
    pub purchase_date: Option<NaiveDate>,
}

impl ProvisioningItem {
    /// Returns the derived code.
    pub fn code(&self) -> &str {
        &self.identifier.code
    }

    /// Returns the derived display name.
    pub fn display_name(&self) -> &str {
        &self.identifier.display_name
    }

    /// Turns the item into a product with a pending artifact.
    pub fn into_product(self, id: RecordId) -> Product {
        Product {
            id,
            name: self.identifier.display_name,
            code: self.identifier.code,
            category: self.category,
            purchase_price: self.purchase_price,
            selling_price: self.selling_price,
            bill_no: self.bill_no,
            tier: self.tier,
            purchase_date: self.purchase_date,
            artifact: ArtifactState::Pending,
            created_at: Utc::now(),
        }
    }
}
