//! Serialized shape of a repository snapshot

use crate::types::{
    ContentId, ContentInfo, ContentType, ContentTypeId, FieldTypeCategory, Language, LocationId,
    VersionNo, VersionStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Raw field values by language code, then field identifier
pub type RawFields = BTreeMap<String, BTreeMap<String, Value>>;

/// Whole repository, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryDocument {
    pub languages: Vec<Language>,
    pub users: Vec<UserRecord>,
    pub content_types: Vec<ContentType>,
    pub contents: Vec<ContentRecord>,
    pub locations: Vec<LocationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,

    #[serde(default)]
    pub login: String,

    /// May create, update and publish drafts
    #[serde(default = "default_true")]
    pub can_edit: bool,

    /// Contents this user may not read
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub denied_content: Vec<ContentId>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: ContentId,
    pub content_type_id: ContentTypeId,
    pub main_language_code: String,

    #[serde(default)]
    pub always_available: bool,

    pub current_version: VersionNo,
    pub versions: Vec<VersionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version_no: VersionNo,
    pub status: VersionStatus,

    #[serde(default)]
    pub fields: RawFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: LocationId,

    #[serde(default)]
    pub parent_id: Option<LocationId>,

    pub content_id: ContentId,

    #[serde(default)]
    pub priority: i32,
}

impl RepositoryDocument {
    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|language| language.code == code)
    }

    pub fn user(&self, id: u64) -> Option<&UserRecord> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn content_type(&self, id: ContentTypeId) -> Option<&ContentType> {
        self.content_types.iter().find(|content_type| content_type.id == id)
    }

    pub fn content(&self, id: ContentId) -> Option<&ContentRecord> {
        self.contents.iter().find(|content| content.id == id)
    }

    pub fn content_mut(&mut self, id: ContentId) -> Option<&mut ContentRecord> {
        self.contents.iter_mut().find(|content| content.id == id)
    }

    pub fn location(&self, id: LocationId) -> Option<&LocationRecord> {
        self.locations.iter().find(|location| location.id == id)
    }

    /// Children of a location, stable-sorted by priority
    pub fn children_of(&self, parent_id: LocationId) -> Vec<&LocationRecord> {
        let mut children: Vec<&LocationRecord> = self
            .locations
            .iter()
            .filter(|location| location.parent_id == Some(parent_id))
            .collect();
        children.sort_by_key(|location| location.priority);
        children
    }

    /// Field categories of a content type, by field identifier
    pub fn field_categories(&self, id: ContentTypeId) -> Option<HashMap<String, FieldTypeCategory>> {
        self.content_type(id).map(|content_type| {
            content_type
                .field_definitions
                .iter()
                .map(|definition| (definition.identifier.clone(), definition.category()))
                .collect()
        })
    }

    /// Check identifiers are unique per collection
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        fn unique<I: IntoIterator<Item = u64>>(what: &str, ids: I) -> std::result::Result<(), String> {
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(id) {
                    return Err(format!("duplicate {} id {}", what, id));
                }
            }
            Ok(())
        }

        unique("location", self.locations.iter().map(|l| l.id))?;
        unique("content", self.contents.iter().map(|c| c.id))?;
        unique("content type", self.content_types.iter().map(|t| t.id))?;
        unique("user", self.users.iter().map(|u| u.id))?;

        for content in &self.contents {
            let mut versions = HashSet::new();
            for version in &content.versions {
                if !versions.insert(version.version_no) {
                    return Err(format!(
                        "duplicate version {} on content {}",
                        version.version_no, content.id
                    ));
                }
            }
        }

        Ok(())
    }
}

impl ContentRecord {
    pub fn info(&self) -> ContentInfo {
        ContentInfo {
            id: self.id,
            content_type_id: self.content_type_id,
            main_language_code: self.main_language_code.clone(),
            always_available: self.always_available,
            current_version_no: self.current_version,
        }
    }

    pub fn version(&self, version_no: VersionNo) -> Option<&VersionRecord> {
        self.versions.iter().find(|version| version.version_no == version_no)
    }

    pub fn version_mut(&mut self, version_no: VersionNo) -> Option<&mut VersionRecord> {
        self.versions.iter_mut().find(|version| version.version_no == version_no)
    }

    pub fn published(&self) -> Option<&VersionRecord> {
        self.version(self.current_version)
            .filter(|version| version.status == VersionStatus::Published)
    }

    pub fn next_version_no(&self) -> VersionNo {
        self.versions
            .iter()
            .map(|version| version.version_no)
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl VersionRecord {
    pub fn language_codes(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }
}
