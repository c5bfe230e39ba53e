use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::models::{DocumentSource, TextOverview};

/// Characters shown by [`DocumentContext::preview`].
pub const PREVIEW_CHARS: usize = 500;

/// An immutable snapshot of the loaded document text.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub source: DocumentSource,
    /// File path the text was read from.
    pub origin: String,
    pub content: String,
    pub content_hash: String,
    pub loaded_at: DateTime<Utc>,
}

/// The currently loaded document, shared between request handlers.
pub type SharedDocument = Arc<RwLock<Option<Arc<DocumentContext>>>>;

impl DocumentContext {
    pub fn new(source: DocumentSource, origin: impl Into<String>, content: String) -> Self {
        Self {
            source,
            origin: origin.into(),
            content_hash: hash_text(&content),
            content,
            loaded_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Lines with more than 10 characters after trimming.
    pub fn meaningful_lines(&self) -> usize {
        self.content
            .lines()
            .filter(|line| line.trim().chars().count() > 10)
            .count()
    }

    pub fn preview(&self) -> String {
        let mut preview: String = self.content.chars().take(PREVIEW_CHARS).collect();
        if self.char_count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        preview
    }

    pub fn overview(&self) -> TextOverview {
        TextOverview {
            text_length: self.char_count(),
            total_chunks: self.meaningful_lines(),
            first_500_chars: self.preview(),
            source: self.source,
        }
    }
}

pub fn new_shared_document() -> SharedDocument {
    Arc::new(RwLock::new(None))
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overview_counts_meaningful_lines() {
        let doc = DocumentContext::new(
            DocumentSource::Pdf,
            "report.pdf",
            "=== PAGE 1 ===\nshort\nAhmed Ali Hassan  IT  19 days\n\n".to_string(),
        );

        let overview = doc.overview();
        assert_eq!(overview.total_chunks, 2);
        assert_eq!(overview.text_length, doc.content.chars().count());
        assert_eq!(overview.first_500_chars, doc.content);
        assert_eq!(doc.content_hash.len(), 64);
    }

    #[test]
    fn preview_is_truncated_on_char_boundary() {
        let doc = DocumentContext::new(DocumentSource::Database, "a.db", "ح".repeat(600));
        let preview = doc.preview();
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn same_text_same_hash() {
        let a = DocumentContext::new(DocumentSource::Pdf, "a", "text".to_string());
        let b = DocumentContext::new(DocumentSource::Pdf, "b", "text".to_string());
        assert_eq!(a.content_hash, b.content_hash);
        assert!(!a.is_empty());
    }
}
