use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Document-level metadata supplied by a corpus source manifest.
///
/// Every ingested document arrives with one of these records; the chunk
/// metadata builder copies its provenance fields onto each chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentManifest {
    pub source_id: String,
    pub document_id: String,
    pub license_info: String,
    pub source_org: String,
    pub canonical_url: String,
    pub year: i32,
    pub content_type: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// 0 = highest priority.
    #[serde(default)]
    pub priority: u8,
}

impl DocumentManifest {
    /// Rejects manifests whose identity fields are absent or blank.
    ///
    /// Licensing must always be stated explicitly, even if the value is
    /// literally "unknown"; a blank `license_info` is a manifest defect.
    pub fn validate_identity(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("source_id", &self.source_id),
            ("document_id", &self.document_id),
            ("license_info", &self.license_info),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::MissingRequiredField(field.to_owned()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> DocumentManifest {
        DocumentManifest {
            source_id: "nguzo-saba-essays".into(),
            document_id: "doc-42".into(),
            license_info: "public-domain".into(),
            source_org: "Us Organization".into(),
            canonical_url: "https://example.org/essays/42".into(),
            year: 1966,
            content_type: "essay".into(),
            tags: BTreeSet::from(["primary".to_owned()]),
            priority: 0,
        }
    }

    #[test]
    fn complete_manifest_passes_identity_check() {
        assert!(manifest().validate_identity().is_ok());
    }

    #[test]
    fn blank_license_is_rejected() {
        let mut m = manifest();
        m.license_info = "   ".into();
        let err = m.validate_identity().expect_err("blank license");
        assert!(matches!(err, AppError::MissingRequiredField(field) if field == "license_info"));
    }

    #[test]
    fn missing_document_id_is_rejected() {
        let mut m = manifest();
        m.document_id = String::new();
        let err = m.validate_identity().expect_err("blank document id");
        assert!(matches!(err, AppError::MissingRequiredField(field) if field == "document_id"));
    }

    #[test]
    fn manifest_deserializes_with_defaulted_tags_and_priority() {
        let raw = serde_json::json!({
            "source_id": "press-archive",
            "document_id": "doc-7",
            "license_info": "CC-BY-4.0",
            "source_org": "LA Times",
            "canonical_url": "https://example.org/press/7",
            "year": 1971,
            "content_type": "press"
        });
        let parsed: DocumentManifest =
            serde_json::from_value(raw).expect("manifest without tags/priority parses");
        assert!(parsed.tags.is_empty());
        assert_eq!(parsed.priority, 0);
    }
}
