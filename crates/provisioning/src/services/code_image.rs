//! Scannable-code image generation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ProvisioningError, Result};

/// An encoded image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Trait for turning a target URL into a scannable-code image.
#[async_trait]
pub trait CodeImageGenerator: Send + Sync {
    /// Encodes `target_url` into an image.
    async fn generate(&self, target_url: &str) -> Result<ImagePayload>;
}

#[derive(Debug, Default)]
struct InMemoryGeneratorState {
    generated: Vec<String>,
    fail_on_generate: bool,
}

/// Deterministic generator that emits an SVG placeholder carrying the
/// encoded URL.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCodeImageGenerator {
    state: Arc<RwLock<InMemoryGeneratorState>>,
}

impl InMemoryCodeImageGenerator {
    /// Creates a new generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `generate` call fail.
    pub async fn set_fail_on_generate(&self, fail: bool) {
        self.state.write().await.fail_on_generate = fail;
    }

    /// Returns how many images were generated.
    pub async fn generated_count(&self) -> usize {
        self.state.read().await.generated.len()
    }

    /// Returns the URLs encoded so far, in call order.
    pub async fn generated_urls(&self) -> Vec<String> {
        self.state.read().await.generated.clone()
    }
}

#[async_trait]
impl CodeImageGenerator for InMemoryCodeImageGenerator {
    async fn generate(&self, target_url: &str) -> Result<ImagePayload> {
        let mut state = self.state.write().await;

        if state.fail_on_generate {
            return Err(ProvisioningError::CodeGeneration(format!(
                "encoder refused {target_url}"
            )));
        }

        state.generated.push(target_url.to_string());
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" data-target=\"{target_url}\"/>"
        );
        Ok(ImagePayload {
            bytes: svg.into_bytes(),
            content_type: "image/svg+xml".to_string(),
        })
    }
}
