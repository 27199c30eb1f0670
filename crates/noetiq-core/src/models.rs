//! Core data models for Noetiq.
//!
//! These types are shared across all Noetiq crates and represent the values
//! that cross the storage gateway boundary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::defaults::{random_icon, FALLBACK_NOTE_ICON, UNTITLED_NOTE};
use crate::error::{Error, Result};
use crate::temporal::describe_edit_date_local;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Backend-assigned vault identifier (the vault's folder id).
    VaultId
);

string_id!(
    /// Stable identity of a note within its vault (the note's filename).
    NoteId
);

// =============================================================================
// VAULT TYPES
// =============================================================================

/// A named, password-gated collection of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    #[serde(rename = "folder_id", alias = "id")]
    pub id: VaultId,
    pub icon: String,
    pub name: String,
    pub description: String,
}

/// The mutable fields of a vault, used for both creation and full replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultDraft {
    pub icon: String,
    pub name: String,
    pub description: String,
}

impl VaultDraft {
    pub fn new(
        icon: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            icon: icon.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Draft with an icon picked from the default palette.
    pub fn with_random_icon(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(random_icon(), name, description)
    }

    /// Reject a draft whose name is empty or whitespace-only.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Vault name is required".to_string()));
        }
        Ok(())
    }
}

/// Unencrypted metadata readable before unlocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInfo {
    pub hint: String,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Cached metadata for one note of the open vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteIndexEntry {
    pub filename: NoteId,
    #[serde(default)]
    pub icon: String,
    #[serde(rename = "notetitle", default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_timestamp: Option<DateTime<Utc>>,
}

impl NoteIndexEntry {
    /// Title for list rendering; blank titles read as "Untitled".
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_NOTE
        } else {
            &self.title
        }
    }

    pub fn display_icon(&self) -> &str {
        if self.icon.is_empty() {
            FALLBACK_NOTE_ICON
        } else {
            &self.icon
        }
    }
}

/// "1 note" / "N notes" label for a vault's note list header.
pub fn note_count_label(count: usize) -> String {
    if count == 1 {
        "1 note".to_string()
    } else {
        format!("{} notes", count)
    }
}

/// One header block of a note document, for a table-of-contents view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineHeading {
    pub text: String,
    pub level: u8,
}

/// Block-structured note payload, opaque to everything but the editor.
///
/// A fresh note holds the empty object `{}`. A populated note carries a
/// `blocks` array whose elements have a `type` and a `data` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteDocument(JsonValue);

impl Default for NoteDocument {
    fn default() -> Self {
        Self(json!({}))
    }
}

impl NoteDocument {
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// Parse the plaintext payload returned by the gateway.
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(Self(serde_json::from_str(raw)?))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_value(self) -> JsonValue {
        self.0
    }

    pub fn blocks(&self) -> &[JsonValue] {
        self.0
            .get("blocks")
            .and_then(JsonValue::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.blocks().is_empty()
    }

    /// Header blocks in document order.
    pub fn outline(&self) -> Vec<OutlineHeading> {
        self.blocks()
            .iter()
            .filter(|block| block.get("type").and_then(JsonValue::as_str) == Some("header"))
            .filter_map(|block| {
                let data = block.get("data")?;
                let text = data.get("text")?.as_str()?.to_string();
                let level = data
                    .get("level")
                    .and_then(JsonValue::as_u64)
                    .map(|l| l.clamp(1, 6) as u8)
                    .unwrap_or(2);
                Some(OutlineHeading { text, level })
            })
            .collect()
    }
}

/// Full content of the active note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteContent {
    pub note: NoteId,
    pub title: String,
    pub icon: String,
    pub document: NoteDocument,
    /// Last modification time as reported by the gateway, if it answered.
    pub edited: Option<DateTime<Utc>>,
}

impl NoteContent {
    /// "Last edited ..." suffix in the local timezone.
    pub fn edited_label(&self) -> Option<String> {
        self.edited.map(describe_edit_date_local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_draft_validate_rejects_blank_names() {
        assert!(VaultDraft::new("📦", "", "d").validate().is_err());
        assert!(VaultDraft::new("📦", "   \t", "d").validate().is_err());
        assert!(VaultDraft::new("📦", "Work", "").validate().is_ok());
    }

    #[test]
    fn test_vault_draft_validate_error_is_validation() {
        let err = VaultDraft::new("📦", " ", "").validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_vault_serializes_folder_id() {
        let vault = Vault {
            id: VaultId::new("abc"),
            icon: "📦".to_string(),
            name: "Work".to_string(),
            description: "stuff".to_string(),
        };
        let json = serde_json::to_value(&vault).unwrap();
        assert_eq!(json["folder_id"], "abc");

        let back: Vault =
            serde_json::from_str(r#"{"id":"xyz","icon":"","name":"n","description":""}"#).unwrap();
        assert_eq!(back.id.as_str(), "xyz");
    }

    #[test]
    fn test_index_entry_defaults_missing_fields() {
        let entry: NoteIndexEntry = serde_json::from_str(r#"{"filename":"a.json"}"#).unwrap();
        assert_eq!(entry.filename, NoteId::new("a.json"));
        assert_eq!(entry.title, "");
        assert!(entry.edit_timestamp.is_none());
        assert_eq!(entry.display_title(), "Untitled");
        assert_eq!(entry.display_icon(), "📝");
    }

    #[test]
    fn test_index_entry_reads_notetitle() {
        let entry: NoteIndexEntry =
            serde_json::from_str(r#"{"filename":"a.json","icon":"🔥","notetitle":"Plan"}"#)
                .unwrap();
        assert_eq!(entry.display_title(), "Plan");
        assert_eq!(entry.display_icon(), "🔥");
    }

    #[test]
    fn test_note_count_label() {
        assert_eq!(note_count_label(0), "0 notes");
        assert_eq!(note_count_label(1), "1 note");
        assert_eq!(note_count_label(7), "7 notes");
    }

    #[test]
    fn test_document_default_is_empty_object() {
        let doc = NoteDocument::default();
        assert_eq!(doc.as_value(), &json!({}));
        assert!(doc.is_empty());
        assert!(doc.outline().is_empty());
    }

    #[test]
    fn test_document_from_blank_payload() {
        let doc = NoteDocument::from_json("  ").unwrap();
        assert_eq!(doc, NoteDocument::default());
    }

    #[test]
    fn test_document_from_invalid_payload() {
        let err = NoteDocument::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_document_outline_extracts_headers() {
        let doc = NoteDocument::new(json!({
            "time": 1700000000000u64,
            "blocks": [
                {"type": "header", "data": {"text": "Intro", "level": 1}},
                {"type": "paragraph", "data": {"text": "body"}},
                {"type": "header", "data": {"text": "Details", "level": 3}},
                {"type": "header", "data": {"text": "No level"}},
                {"type": "header", "data": {"level": 2}}
            ]
        }));

        let outline = doc.outline();
        assert_eq!(
            outline,
            vec![
                OutlineHeading { text: "Intro".into(), level: 1 },
                OutlineHeading { text: "Details".into(), level: 3 },
                OutlineHeading { text: "No level".into(), level: 2 },
            ]
        );
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_document_json_text() {
        let doc = NoteDocument::new(json!({"blocks": []}));
        let text = doc.to_json().unwrap();
        assert_eq!(NoteDocument::from_json(&text).unwrap(), doc);
    }
}
