//! Record store adapter for the provisioning pipeline.
//!
//! A record store keeps JSON documents grouped by collection and offers
//! single-record create/find/update/delete by id. Unique fields are
//! enforced by the store itself, which is the hard backstop behind the
//! pipeline's read-then-write uniqueness checks.

pub mod error;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::RecordId;
pub use error::{Result, StoreError};
pub use filter::RecordFilter;
pub use memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use record::{Fields, Record, field_value};
pub use store::{RecordStore, RecordStoreExt};
