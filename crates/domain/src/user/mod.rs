//! Privileged user accounts created by the single-resource pipeline.

mod record;
mod request;

pub use record::{Role, User};
pub use request::{NewUser, NewUserRequest};
