//! Upload validation rules and stored file naming.

use crate::error::CoreError;

/// Maximum size of an uploaded document.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Maximum size of a profile image.
pub const MAX_PROFILE_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Extensions accepted for documents (lowercase, without the dot).
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "jpg", "jpeg", "png", "gif",
];

/// Lowercased extension of `file_name`, if any.
pub fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check a document upload's name and size.
pub fn validate_document(file_name: &str, size: usize) -> Result<(), CoreError> {
    let ext = extension(file_name).unwrap_or_default();
    if !DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Invalid file type. Allowed types: {}",
            DOCUMENT_EXTENSIONS.join(", ")
        )));
    }
    if size == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".to_string()));
    }
    if size > MAX_DOCUMENT_BYTES {
        return Err(CoreError::Validation(
            "File too large. Maximum size is 10MB".to_string(),
        ));
    }
    Ok(())
}

/// Check a profile image's declared content type and size.
pub fn validate_profile_image(content_type: Option<&str>, size: usize) -> Result<(), CoreError> {
    if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return Err(CoreError::Validation(
            "Please upload an image file".to_string(),
        ));
    }
    if size == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".to_string()));
    }
    if size > MAX_PROFILE_IMAGE_BYTES {
        return Err(CoreError::Validation(
            "Image too large. Maximum size is 5MB".to_string(),
        ));
    }
    Ok(())
}

/// Name a file is stored under: `<prefix>-<unique>.<ext>`.
///
/// The original name never reaches the filesystem, only its extension.
pub fn stored_file_name(prefix: &str, unique: &str, original_name: &str) -> String {
    match extension(original_name) {
        Some(ext) => format!("{prefix}-{unique}.{ext}"),
        None => format!("{prefix}-{unique}"),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_extension_lowercased() {
        assert_eq!(extension("Report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension("README"), None);
        assert_eq!(extension(".env"), None);
    }

    #[test]
    fn test_document_type_allow_list() {
        assert!(validate_document("minutes.docx", 10).is_ok());
        assert_matches!(
            validate_document("payload.exe", 10),
            Err(CoreError::Validation(ref msg)) if msg.contains("Invalid file type")
        );
        assert!(validate_document("noext", 10).is_err());
    }

    #[test]
    fn test_document_size_limit() {
        assert!(validate_document("a.pdf", MAX_DOCUMENT_BYTES).is_ok());
        assert!(validate_document("a.pdf", MAX_DOCUMENT_BYTES + 1).is_err());
        assert!(validate_document("a.pdf", 0).is_err());
    }

    #[test]
    fn test_profile_image_rules() {
        assert!(validate_profile_image(Some("image/png"), 1024).is_ok());
        assert!(validate_profile_image(Some("application/pdf"), 1024).is_err());
        assert!(validate_profile_image(None, 1024).is_err());
        assert!(validate_profile_image(Some("image/jpeg"), MAX_PROFILE_IMAGE_BYTES + 1).is_err());
    }

    #[test]
    fn test_stored_file_name_keeps_only_extension() {
        assert_eq!(
            stored_file_name("document", "abc123", "../../etc/passwd.TXT"),
            "document-abc123.txt"
        );
        assert_eq!(stored_file_name("profile", "x", "photo"), "profile-x");
    }
}
