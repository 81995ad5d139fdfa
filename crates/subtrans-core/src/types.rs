//! Core types and data structures for the Subtrans translation engine
//!
//! These are read-only views of repository objects (locations, contents,
//! content types) plus the update struct used to stage a translation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub type LocationId = u64;
pub type ContentId = u64;
pub type ContentTypeId = u64;
pub type VersionNo = u32;

/// A language registered in the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Language code (e.g., "eng-GB", "fre-FR")
    pub code: String,

    /// Human readable name
    #[serde(default)]
    pub name: String,

    /// Disabled languages cannot be loaded
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Version-independent content metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInfo {
    pub id: ContentId,
    pub content_type_id: ContentTypeId,
    pub main_language_code: String,
    pub always_available: bool,
    pub current_version_no: VersionNo,
}

/// Lifecycle state of a content version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Draft,
    Published,
    Archived,
}

/// Metadata of one content version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub content_info: ContentInfo,
    pub version_no: VersionNo,
    pub status: VersionStatus,
    /// Languages present in this version
    pub language_codes: Vec<String>,
}

/// A node of the content tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub parent_id: Option<LocationId>,
    pub priority: i32,
    pub content_info: ContentInfo,
}

/// Content loaded in one or more languages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub version_info: VersionInfo,

    /// Field values by language code, then field identifier
    pub fields: BTreeMap<String, BTreeMap<String, FieldValue>>,
}

impl Content {
    pub fn id(&self) -> ContentId {
        self.version_info.content_info.id
    }

    pub fn content_info(&self) -> &ContentInfo {
        &self.version_info.content_info
    }

    pub fn content_type_id(&self) -> ContentTypeId {
        self.version_info.content_info.content_type_id
    }

    /// Value of a field in the given language, if the content was loaded with it
    pub fn get_field_value(&self, identifier: &str, language_code: &str) -> Option<&FieldValue> {
        self.fields
            .get(language_code)
            .and_then(|fields| fields.get(identifier))
    }

    /// Languages the content was loaded in
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Field type category, deciding how a field value is carried into a new language
///
/// Each category gets its own arm in [`crate::remap::FieldRemapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTypeCategory {
    /// Binary image stored outside the repository
    Image,
    /// Any value that can be copied as-is
    Generic,
}

impl FieldTypeCategory {
    /// Categorize a field type identifier
    pub fn from_type_identifier(identifier: &str) -> Self {
        match identifier {
            "ezimage" | "image" => Self::Image,
            _ => Self::Generic,
        }
    }
}

/// Schema entry of a content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub identifier: String,

    /// Field type identifier (e.g., "ezstring", "ezimage")
    #[serde(rename = "field_type")]
    pub field_type_identifier: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub position: u32,
}

impl FieldDefinition {
    pub fn new(identifier: impl Into<String>, field_type_identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            field_type_identifier: field_type_identifier.into(),
            required: false,
            position: 0,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn category(&self) -> FieldTypeCategory {
        FieldTypeCategory::from_type_identifier(&self.field_type_identifier)
    }
}

/// Content type with its ordered field definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    pub id: ContentTypeId,
    pub identifier: String,
    pub field_definitions: Vec<FieldDefinition>,
}

/// Value of an image field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_text: Option<String>,

    /// Path of an external file the repository should ingest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_path: Option<String>,
}

impl ImageValue {
    /// Explicit "no image" value
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_input_path(path: impl Into<String>) -> Self {
        Self {
            input_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// True when the stored uri is set and non-empty
    pub fn has_uri(&self) -> bool {
        self.uri.as_deref().is_some_and(|uri| !uri.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_uri() && self.input_path.as_deref().map_or(true, str::is_empty)
    }
}

/// A field value, tagged by field type category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Generic(Value),
    Image(ImageValue),
}

impl FieldValue {
    /// Interpret a raw stored value according to its field category
    ///
    /// A stored image that does not parse as an image value is read as empty.
    pub fn from_raw(category: FieldTypeCategory, raw: Value) -> Self {
        match category {
            FieldTypeCategory::Generic => Self::Generic(raw),
            FieldTypeCategory::Image => {
                if raw.is_null() {
                    Self::Image(ImageValue::empty())
                } else {
                    Self::Image(serde_json::from_value(raw).unwrap_or_default())
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Generic(Value::Null) => true,
            Self::Generic(Value::String(s)) => s.trim().is_empty(),
            Self::Generic(Value::Array(items)) => items.is_empty(),
            Self::Generic(Value::Object(map)) => map.is_empty(),
            Self::Generic(_) => false,
            Self::Image(image) => image.is_empty(),
        }
    }

    pub fn as_image(&self) -> Option<&ImageValue> {
        match self {
            Self::Image(image) => Some(image),
            Self::Generic(_) => None,
        }
    }
}

/// One staged field assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAssignment {
    pub field_identifier: String,

    /// Defaults to the update's initial language
    pub language_code: Option<String>,

    pub value: FieldValue,
}

/// Staged changes applied to a draft by `ContentService::update_content`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentUpdateStruct {
    pub initial_language_code: Option<String>,
    pub fields: Vec<FieldAssignment>,
}

impl ContentUpdateStruct {
    /// Set a field in the initial language
    pub fn set_field(&mut self, identifier: impl Into<String>, value: FieldValue) {
        self.fields.push(FieldAssignment {
            field_identifier: identifier.into(),
            language_code: None,
            value,
        });
    }

    /// Set a field in an explicit language
    pub fn set_field_in(
        &mut self,
        identifier: impl Into<String>,
        language_code: impl Into<String>,
        value: FieldValue,
    ) {
        self.fields.push(FieldAssignment {
            field_identifier: identifier.into(),
            language_code: Some(language_code.into()),
            value,
        });
    }

    /// Assigned value for a field, last assignment wins
    pub fn field(&self, identifier: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .rev()
            .find(|assignment| assignment.field_identifier == identifier)
            .map(|assignment| &assignment.value)
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionStatus::Draft => write!(f, "draft"),
            VersionStatus::Published => write!(f, "published"),
            VersionStatus::Archived => write!(f, "archived"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_category() {
        assert_eq!(
            FieldTypeCategory::from_type_identifier("ezimage"),
            FieldTypeCategory::Image
        );
        assert_eq!(
            FieldTypeCategory::from_type_identifier("ezstring"),
            FieldTypeCategory::Generic
        );
        assert_eq!(
            FieldDefinition::new("body", "ezrichtext").category(),
            FieldTypeCategory::Generic
        );
    }

    #[test]
    fn test_image_value_from_raw() {
        let value = FieldValue::from_raw(
            FieldTypeCategory::Image,
            json!({"id": "12-1-eng-GB", "uri": "/var/storage/images/a.png"}),
        );
        let image = value.as_image().unwrap();
        assert_eq!(image.id.as_deref(), Some("12-1-eng-GB"));
        assert!(image.has_uri());
        assert!(!value.is_empty());

        let empty = FieldValue::from_raw(FieldTypeCategory::Image, Value::Null);
        assert!(empty.is_empty());

        let no_uri = FieldValue::from_raw(FieldTypeCategory::Image, json!({"id": "7", "uri": ""}));
        assert!(!no_uri.as_image().unwrap().has_uri());
    }

    #[test]
    fn test_generic_emptiness() {
        assert!(FieldValue::Generic(Value::Null).is_empty());
        assert!(FieldValue::Generic(json!("  ")).is_empty());
        assert!(!FieldValue::Generic(json!(0)).is_empty());
        assert!(!FieldValue::Generic(json!(false)).is_empty());
        assert!(!FieldValue::Generic(json!("Hello")).is_empty());
    }

    #[test]
    fn test_update_struct_last_assignment_wins() {
        let mut update = ContentUpdateStruct::default();
        update.set_field("title", FieldValue::Generic(json!("first")));
        update.set_field_in("title", "fre-FR", FieldValue::Generic(json!("second")));

        assert_eq!(update.fields.len(), 2);
        assert_eq!(update.field("title"), Some(&FieldValue::Generic(json!("second"))));
        assert_eq!(update.field("missing"), None);
    }
}
