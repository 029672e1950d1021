//! Input checks applied by the front-end before anything reaches the network

use std::fmt;
use std::path::Path;

pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_UPLOAD_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyMessage,
    MessageTooLong { chars: usize },
    InvalidEmail,
    FileTooLarge { bytes: u64 },
    UnsupportedFileType { extension: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyMessage => write!(f, "Message cannot be empty"),
            ValidationIssue::MessageTooLong { chars } => write!(
                f,
                "Message is too long ({chars} characters, maximum is {MAX_MESSAGE_CHARS})"
            ),
            ValidationIssue::InvalidEmail => write!(f, "Please enter a valid email address"),
            ValidationIssue::FileTooLarge { bytes } => write!(
                f,
                "File is too large ({bytes} bytes, maximum is {MAX_UPLOAD_BYTES})"
            ),
            ValidationIssue::UnsupportedFileType { extension } => {
                write!(f, "File type '{extension}' is not supported")
            }
        }
    }
}

impl std::error::Error for ValidationIssue {}

/// Trimmed message must be 1..=4000 characters
pub fn validate_message(message: &str) -> Result<&str, ValidationIssue> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ValidationIssue::EmptyMessage);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(ValidationIssue::MessageTooLong { chars });
    }
    Ok(trimmed)
}

pub fn validate_email(email: &str) -> Result<(), ValidationIssue> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationIssue::InvalidEmail);
    };
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) || domain.contains('@') {
        return Err(ValidationIssue::InvalidEmail);
    }
    Ok(())
}

/// Checks size and extension, returning the MIME type to upload with
pub fn validate_upload(path: &Path, size: u64) -> Result<&'static str, ValidationIssue> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationIssue::FileTooLarge { bytes: size });
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    ALLOWED_UPLOAD_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .ok_or(ValidationIssue::UnsupportedFileType { extension })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_bounds() {
        assert_eq!(validate_message("   "), Err(ValidationIssue::EmptyMessage));
        assert_eq!(validate_message("  hi "), Ok("hi"));
        assert!(validate_message(&"a".repeat(MAX_MESSAGE_CHARS)).is_ok());
        assert_eq!(
            validate_message(&"a".repeat(MAX_MESSAGE_CHARS + 1)),
            Err(ValidationIssue::MessageTooLong { chars: MAX_MESSAGE_CHARS + 1 })
        );
    }

    #[test]
    fn test_email_format() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada lovelace@example.com").is_err());
    }

    #[test]
    fn test_upload_constraints() {
        assert_eq!(validate_upload(Path::new("notes.PDF"), 1024), Ok("application/pdf"));
        assert!(matches!(
            validate_upload(Path::new("tool.exe"), 10),
            Err(ValidationIssue::UnsupportedFileType { .. })
        ));
        assert!(matches!(
            validate_upload(Path::new("big.pdf"), MAX_UPLOAD_BYTES + 1),
            Err(ValidationIssue::FileTooLarge { .. })
        ));
    }
}
