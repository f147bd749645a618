//! Outgoing message content.

use std::path::Path;

use crate::error::ChatError;

/// MIME type used when none can be guessed from the file name.
const FALLBACK_MIME: &str = "application/octet-stream";

/// A file to upload alongside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl OutgoingFile {
    /// Create a file from in-memory bytes, guessing the MIME type from the name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_raw()
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Override the guessed MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Text and attachments the user is about to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDraft {
    pub text: Option<String>,
    pub files: Vec<OutgoingFile>,
}

impl MessageDraft {
    /// A text-only draft.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            files: Vec::new(),
        }
    }

    /// Add an attachment.
    pub fn with_file(mut self, file: OutgoingFile) -> Self {
        self.files.push(file);
        self
    }

    /// The text with surrounding whitespace removed, or None if blank.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn has_attachments(&self) -> bool {
        !self.files.is_empty()
    }

    /// Reject drafts that would send nothing.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.trimmed_text().is_none() && self.files.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mime_guess() {
        assert_eq!(OutgoingFile::new("photo.png", vec![]).mime, "image/png");
        assert_eq!(OutgoingFile::new("report.pdf", vec![]).mime, "application/pdf");
        assert_eq!(OutgoingFile::new("blob", vec![]).mime, FALLBACK_MIME);
        assert!(OutgoingFile::new("photo.jpg", vec![]).is_image());
    }

    #[test]
    fn test_blank_draft_is_rejected() {
        assert!(matches!(
            MessageDraft::text("   ").validate(),
            Err(ChatError::EmptyMessage)
        ));
        assert!(matches!(
            MessageDraft::default().validate(),
            Err(ChatError::EmptyMessage)
        ));
    }

    #[test]
    fn test_attachment_only_draft_is_valid() {
        let draft = MessageDraft::default().with_file(OutgoingFile::new("a.txt", b"x".to_vec()));
        assert!(draft.validate().is_ok());
        assert!(draft.trimmed_text().is_none());
        assert!(draft.has_attachments());
    }

    #[test]
    fn test_text_is_trimmed() {
        let draft = MessageDraft::text("  hello \n");
        assert_eq!(draft.trimmed_text(), Some("hello"));
    }

    #[tokio::test]
    async fn test_from_path_reads_bytes() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"a,b\n1,2\n").unwrap();

        let outgoing = OutgoingFile::from_path(file.path()).await.unwrap();
        assert_eq!(outgoing.bytes, b"a,b\n1,2\n");
        assert_eq!(outgoing.mime, "text/csv");
        assert!(outgoing.file_name.ends_with(".csv"));
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let result = OutgoingFile::from_path("/nonexistent/file.txt").await;
        assert!(matches!(result, Err(ChatError::Io(_))));
    }
}
