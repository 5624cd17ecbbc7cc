//! Files index data models
//!
//! A record ties one file on disk to the KPI it belongs to.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Store-assigned identifier of an index record
pub type FileIndexId = i64;

/// One indexed file tied to a KPI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileIndexRecord {
    /// Unique identifier, assigned by the store on creation
    pub id: FileIndexId,
    /// KPI key the file belongs to
    pub kpi: String,
    /// Absolute or relative path of the file on disk
    pub file_path: String,
    /// Who uploaded the file, if known
    pub uploaded_by: Option<String>,
    /// When the file was uploaded (Unix timestamp)
    pub uploaded_at: Option<i64>,
}

impl FileIndexRecord {
    /// Name offered to clients downloading this file: the last component of
    /// the path, split on the host's separator
    pub fn file_name(&self) -> &str {
        Path::new(&self.file_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file_path)
    }
}

/// Payload for creating an index record
///
/// Every field is optional at the JSON level so that missing required fields
/// are reported by [`NewFileIndexRecord::validate`] instead of a parse error.
/// An `id` in the body is ignored; the store assigns one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFileIndexRecord {
    /// KPI key the file belongs to (required)
    pub kpi: Option<String>,
    /// Path of the file on disk (required)
    pub file_path: Option<String>,
    /// Who uploaded the file
    pub uploaded_by: Option<String>,
    /// When the file was uploaded (Unix timestamp)
    pub uploaded_at: Option<i64>,
}

impl NewFileIndexRecord {
    /// Create a payload with the required fields set
    pub fn new(kpi: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            kpi: Some(kpi.into()),
            file_path: Some(file_path.into()),
            ..Default::default()
        }
    }

    /// Check required fields
    ///
    /// # Returns
    /// * `Ok(())` - `kpi` and `filePath` are present and not blank
    /// * `Err(AppError::Validation)` - naming every missing field
    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        if is_blank(&self.kpi) {
            missing.push("kpi");
        }
        if is_blank(&self.file_path) {
            missing.push("filePath");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Required fields as borrowed strings, `None` if either is absent
    pub(crate) fn required_fields(&self) -> Option<(&str, &str)> {
        self.kpi.as_deref().zip(self.file_path.as_deref())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> FileIndexRecord {
        FileIndexRecord {
            id: 1,
            kpi: "sales".to_string(),
            file_path: path.to_string(),
            uploaded_by: None,
            uploaded_at: None,
        }
    }

    #[test]
    fn test_file_name_last_segment() {
        assert_eq!(record("/data/kpi/report.csv").file_name(), "report.csv");
        assert_eq!(record("relative/out.txt").file_name(), "out.txt");
        assert_eq!(record("plain.txt").file_name(), "plain.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_name_keeps_backslashes_on_unix() {
        assert_eq!(record("/data/a\\b.txt").file_name(), "a\\b.txt");
        assert_eq!(record("C:\\exports\\q1.txt").file_name(), "C:\\exports\\q1.txt");
    }

    #[test]
    fn test_required_fields() {
        let payload = NewFileIndexRecord::new("sales", "/a.txt");
        assert_eq!(payload.required_fields(), Some(("sales", "/a.txt")));
        assert_eq!(NewFileIndexRecord::default().required_fields(), None);
    }

    #[test]
    fn test_file_name_trailing_separator() {
        assert_eq!(record("/data/kpi/").file_name(), "kpi");
    }

    #[test]
    fn test_record_json_is_camel_case() {
        let json = serde_json::to_value(record("/a/b.txt")).unwrap();
        assert_eq!(json["filePath"], "/a/b.txt");
        assert_eq!(json["kpi"], "sales");
        assert!(json.get("file_path").is_none());
    }

    #[test]
    fn test_new_record_ignores_id() {
        let payload: NewFileIndexRecord =
            serde_json::from_str(r#"{"id": 99, "kpi": "k", "filePath": "/f"}"#).unwrap();
        assert_eq!(payload, NewFileIndexRecord::new("k", "/f"));
    }

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let err = NewFileIndexRecord::default().validate().unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("kpi"));
                assert!(msg.contains("filePath"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_blank() {
        let payload = NewFileIndexRecord::new("  ", "/f");
        assert!(matches!(payload.validate(), Err(AppError::Validation(_))));
        assert!(NewFileIndexRecord::new("k", "/f").validate().is_ok());
    }
}
