//! Plain-text document extraction.
//!
//! Handles the text-like formats the console accepts (`.txt`, `.md`,
//! `.json`, `.csv`); anything else is rejected up front rather than
//! producing garbage chunks.

use agentforge_core::error::IngestionError;
use agentforge_core::extract::TextExtractor;
use async_trait::async_trait;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "json", "csv", "log"];

/// UTF-8 extractor for text-like files.
#[derive(Debug, Default, Clone)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract_text(&self, file_name: &str, bytes: &[u8]) -> Result<String, IngestionError> {
        let extension = file_name
            .rsplit('.')
            .next()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
            return Err(IngestionError::ExtractionFailed(format!(
                "unsupported file format '{extension}'"
            )));
        }

        String::from_utf8(bytes.to_vec())
            .map_err(|_| IngestionError::ExtractionFailed("file is not valid UTF-8".into()))
    }
}
