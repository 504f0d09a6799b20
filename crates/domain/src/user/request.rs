use chrono::Utc;
use common::RecordId;
use serde::{Deserialize, Serialize};

use super::{Role, User};
use crate::error::DomainError;

const MIN_PHONE_DIGITS: usize = 8;
const MAX_PHONE_DIGITS: usize = 15;

/// Request to create a privileged user, as received.
///
/// `documents` are URLs of identity-document images the caller already
/// uploaded to object storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub documents: Vec<String>,
}

impl NewUserRequest {
    /// Validates and normalizes the request.
    ///
    /// Emails are lower-cased; spaces, dashes and parentheses are stripped
    /// from phone numbers.
    pub fn validate(&self) -> Result<NewUser, DomainError> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(DomainError::validation("fullName", "full name is required"));
        }

        let email = normalize_email(&self.email)?;
        let phone = normalize_phone(&self.phone)?;

        for url in &self.documents {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(DomainError::validation(
                    "documents",
                    format!("document must be an http(s) URL, got {url:?}"),
                ));
            }
        }

        Ok(NewUser {
            full_name: full_name.to_string(),
            email,
            phone,
            role: self.role,
            documents: self.documents.clone(),
        })
    }
}

/// A validated, normalized user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub documents: Vec<String>,
}

impl NewUser {
    /// Builds the record to persist.
    pub fn into_user(self, id: RecordId, credential_hash: String) -> User {
        User {
            id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            role: self.role,
            credential_hash,
            documents: self.documents,
            created_at: Utc::now(),
        }
    }
}

fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation(
            "email",
            format!("{raw:?} is not a valid email address"),
        ));
    }
    Ok(email)
}

fn normalize_phone(raw: &str) -> Result<String, DomainError> {
    let phone: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = phone.strip_prefix('+').unwrap_or(&phone);
    if digits.len() < MIN_PHONE_DIGITS
        || digits.len() > MAX_PHONE_DIGITS
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(DomainError::validation(
            "phone",
            format!("{raw:?} is not a valid phone number"),
        ));
    }
    Ok(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NewUserRequest {
        NewUserRequest {
            full_name: " Ana Lima ".to_string(),
            email: "Ana@Shop.Test".to_string(),
            phone: "+55 (11) 99999-0000".to_string(),
            role: Role::Admin,
            documents: vec!["https://cdn.test/docs/front.png".to_string()],
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let user = request().validate().unwrap();
        assert_eq!(user.full_name, "Ana Lima");
        assert_eq!(user.email, "ana@shop.test");
        assert_eq!(user.phone, "+5511999990000");
        assert_eq!(user.documents.len(), 1);
    }

    #[test]
    fn test_rejects_bad_email() {
        for email in ["", "ana", "ana@", "@shop.test", "ana@shop", "a@b@c.d"] {
            let mut r = request();
            r.email = email.to_string();
            assert!(
                matches!(
                    r.validate(),
                    Err(DomainError::Validation { field: "email", .. })
                ),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_bad_phone() {
        for phone in ["", "123", "abcdefghij", "+1234567890123456"] {
            let mut r = request();
            r.phone = phone.to_string();
            assert!(
                matches!(
                    r.validate(),
                    Err(DomainError::Validation { field: "phone", .. })
                ),
                "{phone:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_non_url_document() {
        let mut r = request();
        r.documents.push("front.png".to_string());
        assert!(matches!(
            r.validate(),
            Err(DomainError::Validation {
                field: "documents",
                ..
            })
        ));
    }

    #[test]
    fn test_into_user_keeps_fields() {
        let id = RecordId::new();
        let user = request()
            .validate()
            .unwrap()
            .into_user(id, "hash".to_string());
        assert_eq!(user.id, id);
        assert_eq!(user.credential_hash, "hash");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_role_defaults_when_missing() {
        let body = serde_json::json!({
            "fullName": "Ana",
            "email": "ana@shop.test",
            "phone": "11999990000"
        });
        let r: NewUserRequest = serde_json::from_value(body).unwrap();
        assert_eq!(r.role, Role::Admin);
        assert!(r.documents.is_empty());
    }
}
