//! Products created by the batch provisioning pipeline.

mod record;
mod request;
mod value_objects;

pub use record::Product;
pub use request::{BatchTemplate, ProvisioningItem, ProvisioningRequest};
pub use value_objects::{BillNumber, Money, TierCode};
