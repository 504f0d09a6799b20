//! Externally hosted artifacts attached to records.

use serde::{Deserialize, Serialize};

/// Reference to a file hosted by object storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactReference {
    /// Public URL of the hosted file.
    pub url: String,
    /// Provider-assigned id (the storage path).
    pub provider_id: String,
}

/// Where a record's artifact stands.
///
/// Replaces a `"pending"` placeholder string so callers can tell "never
/// attempted" apart from "attempted and failed".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ArtifactState {
    /// No artifact has been produced yet.
    #[default]
    Pending,

    /// The artifact is hosted and attached.
    Attached(ArtifactReference),

    /// Generation or upload failed; the record exists without an artifact.
    Failed { reason: String },
}

impl ArtifactState {
    /// Returns true if an artifact is attached.
    pub fn is_attached(&self) -> bool {
        matches!(self, ArtifactState::Attached(_))
    }

    /// Returns true if a reconcile pass should retry this artifact.
    pub fn needs_reconcile(&self) -> bool {
        matches!(self, ArtifactState::Pending | ArtifactState::Failed { .. })
    }

    /// Returns the attached reference, if any.
    pub fn reference(&self) -> Option<&ArtifactReference> {
        match self {
            ArtifactState::Attached(reference) => Some(reference),
            _ => None,
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactState::Pending => "pending",
            ArtifactState::Attached(_) => "attached",
            ArtifactState::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reference() -> ArtifactReference {
        ArtifactReference {
            url: "https://cdn.test/products/product_1.png".to_string(),
            provider_id: "products/product_1".to_string(),
        }
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(ArtifactState::default(), ArtifactState::Pending);
    }

    #[test]
    fn test_needs_reconcile() {
        assert!(ArtifactState::Pending.needs_reconcile());
        assert!(
            ArtifactState::Failed {
                reason: "x".to_string()
            }
            .needs_reconcile()
        );
        assert!(!ArtifactState::Attached(reference()).needs_reconcile());
    }

    #[test]
    fn test_reference() {
        assert!(ArtifactState::Pending.reference().is_none());
        assert_eq!(
            ArtifactState::Attached(reference()).reference(),
            Some(&reference())
        );
    }

    #[test]
    fn test_tagged_serialization() {
        assert_eq!(
            serde_json::to_value(ArtifactState::Pending).unwrap(),
            json!({"state": "pending"})
        );
        assert_eq!(
            serde_json::to_value(ArtifactState::Attached(reference())).unwrap(),
            json!({
                "state": "attached",
                "url": "https://cdn.test/products/product_1.png",
                "providerId": "products/product_1"
            })
        );
        let failed: ArtifactState =
            serde_json::from_value(json!({"state": "failed", "reason": "upload refused"})).unwrap();
        assert_eq!(
            failed,
            ArtifactState::Failed {
                reason: "upload refused".to_string()
            }
        );
    }
}
