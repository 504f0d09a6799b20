use chrono::{DateTime, Utc};
use common::RecordId;
use record_store::{Record, RecordFilter};
use serde::{Deserialize, Serialize};

/// Access level of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    #[default]
    Admin,
    SuperAdmin,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted user account.
///
/// Email and phone are independent natural keys, each unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    /// bcrypt hash of the generated credential.
    pub credential_hash: String,
    /// URLs of identity documents uploaded before creation.
    #[serde(default)]
    pub documents: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for User {
    const COLLECTION: &'static str = "users";
    const UNIQUE_FIELDS: &'static [&'static str] = &["email", "phone"];

    fn id(&self) -> RecordId {
        self.id
    }
}

impl User {
    /// Filter selecting the user with the given email.
    pub fn email_filter(email: &str) -> RecordFilter {
        RecordFilter::eq("email", email)
    }

    /// Filter selecting the user with the given phone.
    pub fn phone_filter(phone: &str) -> RecordFilter {
        RecordFilter::eq("phone", phone)
    }
}
