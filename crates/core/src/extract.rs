//! Text extraction capability.
//!
//! Format-agnostic from the core's perspective: PDF/DOCX/plain-text parsing
//! is an external concern behind this trait.

use crate::error::IngestionError;
use async_trait::async_trait;

/// Turns an uploaded file into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> std::result::Result<String, IngestionError>;
}
