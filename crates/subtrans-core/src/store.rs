//! File-backed repository
//!
//! [`JsonRepository`] keeps a whole [`RepositoryDocument`] in memory and
//! implements every service trait on top of it. When opened from a file,
//! each mutation (draft creation, update, publish) is written back before
//! the call returns, so a crash mid-run leaves the same state a live
//! repository would: published translations stay published, abandoned
//! drafts stay around.

pub mod document;

pub use document::{
    ContentRecord, LocationRecord, RawFields, RepositoryDocument, UserRecord, VersionRecord,
};

use crate::error::{Error, RepositoryError, Result};
use crate::repository::{
    ContentService, ContentTypeService, LanguageService, LocationService, ServiceResult,
};
use crate::types::{
    Content, ContentId, ContentInfo, ContentType, ContentTypeId, ContentUpdateStruct,
    FieldTypeCategory, FieldValue, Language, Location, LocationId, VersionInfo, VersionNo, VersionStatus,
};
use serde_json::Value;
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Repository persisted as a single JSON snapshot
#[derive(Debug)]
pub struct JsonRepository {
    path: Option<PathBuf>,
    document: RefCell<RepositoryDocument>,
    current_user: UserRecord,
}

impl JsonRepository {
    /// Open a snapshot file, acting as the given user
    pub fn open(path: impl AsRef<Path>, user_id: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let document: RepositoryDocument =
            serde_json::from_str(&content).map_err(|source| Error::Snapshot {
                path: path.clone(),
                source,
            })?;

        info!(
            path = %path.display(),
            locations = document.locations.len(),
            contents = document.contents.len(),
            "Opened repository snapshot"
        );

        let mut repository = Self::from_document(document, user_id)?;
        repository.path = Some(path);
        Ok(repository)
    }

    /// In-memory repository; nothing is written to disk
    pub fn from_document(document: RepositoryDocument, user_id: u64) -> Result<Self> {
        document
            .check_consistency()
            .map_err(|message| Error::Configuration { message })?;

        let current_user = document
            .user(user_id)
            .cloned()
            .ok_or_else(|| Error::Configuration {
                message: format!("No user with id {} in repository", user_id),
            })?;

        Ok(Self {
            path: None,
            document: RefCell::new(document),
            current_user,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current_user(&self) -> &UserRecord {
        &self.current_user
    }

    /// Borrow the current document state
    pub fn document(&self) -> Ref<'_, RepositoryDocument> {
        self.document.borrow()
    }

    /// Write the document back to its file, through a sibling temp file
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let serialized =
            serde_json::to_string_pretty(&*self.document.borrow()).map_err(|source| {
                Error::Snapshot {
                    path: path.clone(),
                    source,
                }
            })?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, serialized).map_err(|source| Error::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;

        trace!(path = %path.display(), "Repository snapshot written");
        Ok(())
    }

    fn persist(&self) -> ServiceResult<()> {
        self.save()
            .map_err(|err| RepositoryError::from(anyhow::Error::new(err)))
    }

    fn ensure_can_edit(&self, content_id: ContentId) -> ServiceResult<()> {
        if self.current_user.can_edit {
            Ok(())
        } else {
            Err(RepositoryError::permission_denied(
                "edit",
                format!("content {}", content_id),
            ))
        }
    }

    fn ensure_can_read(&self, content_id: ContentId) -> ServiceResult<()> {
        if self.current_user.denied_content.contains(&content_id) {
            Err(RepositoryError::permission_denied(
                "read",
                format!("content {}", content_id),
            ))
        } else {
            Ok(())
        }
    }

    fn location_from_record(
        document: &RepositoryDocument,
        record: &LocationRecord,
    ) -> Option<Location> {
        document.content(record.content_id).map(|content| Location {
            id: record.id,
            parent_id: record.parent_id,
            priority: record.priority,
            content_info: content.info(),
        })
    }
}

/// Pick the languages to load from a version
fn resolve_languages(
    record: &ContentRecord,
    version: &VersionRecord,
    languages: &[&str],
    use_always_available: bool,
) -> ServiceResult<Vec<String>> {
    if languages.is_empty() {
        return Ok(version.language_codes());
    }

    let present: Vec<String> = languages
        .iter()
        .filter(|code| version.fields.contains_key(**code))
        .map(|code| code.to_string())
        .collect();
    if !present.is_empty() {
        return Ok(present);
    }

    if use_always_available
        && record.always_available
        && version.fields.contains_key(&record.main_language_code)
    {
        return Ok(vec![record.main_language_code.clone()]);
    }

    Err(RepositoryError::not_found(
        "content translation",
        format!("{}/{}", record.id, languages.join(",")),
    ))
}

/// Build a typed content view of one version
fn build_content(
    document: &RepositoryDocument,
    record: &ContentRecord,
    version: &VersionRecord,
    languages: &[String],
) -> ServiceResult<Content> {
    let categories = document
        .field_categories(record.content_type_id)
        .ok_or_else(|| RepositoryError::not_found("content type", record.content_type_id))?;

    let fields = version
        .fields
        .iter()
        .filter(|(code, _)| languages.contains(*code))
        .map(|(code, raw_fields)| {
            let typed: BTreeMap<String, FieldValue> = raw_fields
                .iter()
                .map(|(identifier, raw)| {
                    let category = categories
                        .get(identifier)
                        .copied()
                        .unwrap_or(FieldTypeCategory::Generic);
                    (identifier.clone(), FieldValue::from_raw(category, raw.clone()))
                })
                .collect();
            (code.clone(), typed)
        })
        .collect();

    Ok(Content {
        version_info: VersionInfo {
            content_info: record.info(),
            version_no: version.version_no,
            status: version.status,
            language_codes: version.language_codes(),
        },
        fields,
    })
}

/// Convert a staged value into its stored form
fn to_raw(value: FieldValue, content_id: ContentId, version_no: VersionNo, language: &str) -> Value {
    match value {
        FieldValue::Generic(raw) => raw,
        FieldValue::Image(mut image) => {
            match image.input_path.take().filter(|path| !path.is_empty()) {
                Some(input_path) => serde_json::json!({
                    "id": format!("{}-{}-{}", content_id, version_no, language),
                    "uri": input_path,
                    "alternative_text": image.alternative_text,
                }),
                None if image.is_empty() => Value::Null,
                None => serde_json::to_value(image).unwrap_or(Value::Null),
            }
        }
    }
}

impl LanguageService for JsonRepository {
    fn load_language(&self, code: &str) -> ServiceResult<Language> {
        self.document
            .borrow()
            .language(code)
            .filter(|language| language.enabled)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("language", code))
    }
}

impl LocationService for JsonRepository {
    fn load_location(&self, id: LocationId) -> ServiceResult<Location> {
        let document = self.document.borrow();
        document
            .location(id)
            .and_then(|record| Self::location_from_record(&document, record))
            .ok_or_else(|| RepositoryError::not_found("location", id))
    }

    fn load_location_children(&self, location: &Location) -> ServiceResult<Vec<Location>> {
        let document = self.document.borrow();
        let children = document
            .children_of(location.id)
            .into_iter()
            .filter_map(|record| {
                let child = Self::location_from_record(&document, record);
                if child.is_none() {
                    warn!(
                        location_id = record.id,
                        content_id = record.content_id,
                        "Location points to missing content, not listed"
                    );
                }
                child
            })
            .collect();
        Ok(children)
    }
}

impl ContentService for JsonRepository {
    fn load_content_by_content_info(
        &self,
        content_info: &ContentInfo,
        languages: &[&str],
    ) -> ServiceResult<Content> {
        self.load_content(content_info.id, languages, None, false)
    }

    fn load_content(
        &self,
        content_id: ContentId,
        languages: &[&str],
        version_no: Option<VersionNo>,
        use_always_available: bool,
    ) -> ServiceResult<Content> {
        self.ensure_can_read(content_id)?;

        let document = self.document.borrow();
        let record = document
            .content(content_id)
            .ok_or_else(|| RepositoryError::not_found("content", content_id))?;

        let version = match version_no {
            Some(no) => record.version(no),
            None => record.published(),
        }
        .ok_or_else(|| {
            RepositoryError::not_found(
                "version",
                format!("{}/{}", content_id, version_no.unwrap_or(record.current_version)),
            )
        })?;

        let resolved = resolve_languages(record, version, languages, use_always_available)?;
        build_content(&document, record, version, &resolved)
    }

    fn create_content_draft(&self, content_info: &ContentInfo) -> ServiceResult<Content> {
        self.ensure_can_edit(content_info.id)?;

        let content = {
            let mut document = self.document.borrow_mut();
            let record = document
                .content_mut(content_info.id)
                .ok_or_else(|| RepositoryError::not_found("content", content_info.id))?;

            let fields = record
                .published()
                .map(|version| version.fields.clone())
                .ok_or_else(|| {
                    RepositoryError::not_found("published version", content_info.id)
                })?;

            let version_no = record.next_version_no();
            record.versions.push(VersionRecord {
                version_no,
                status: VersionStatus::Draft,
                fields,
            });
            debug!(content_id = content_info.id, version_no, "Draft created");

            let record = document
                .content(content_info.id)
                .ok_or_else(|| RepositoryError::not_found("content", content_info.id))?;
            let version = record
                .version(version_no)
                .ok_or_else(|| RepositoryError::unknown("draft vanished after creation"))?;
            build_content(&document, record, version, &version.language_codes())?
        };

        self.persist()?;
        Ok(content)
    }

    fn update_content(
        &self,
        version_info: &VersionInfo,
        update: ContentUpdateStruct,
    ) -> ServiceResult<Content> {
        let content_id = version_info.content_info.id;
        let version_no = version_info.version_no;
        self.ensure_can_edit(content_id)?;

        let content = {
            let mut document = self.document.borrow_mut();
            let content_type_id = document
                .content(content_id)
                .map(|record| record.content_type_id)
                .ok_or_else(|| RepositoryError::not_found("content", content_id))?;
            let categories = document
                .field_categories(content_type_id)
                .ok_or_else(|| RepositoryError::not_found("content type", content_type_id))?;

            let record = document
                .content_mut(content_id)
                .ok_or_else(|| RepositoryError::not_found("content", content_id))?;
            let main_language = record.main_language_code.clone();
            let version = record.version_mut(version_no).ok_or_else(|| {
                RepositoryError::not_found("version", format!("{}/{}", content_id, version_no))
            })?;

            if version.status != VersionStatus::Draft {
                return Err(RepositoryError::validation(format!(
                    "Version {} of content {} is {}, not a draft",
                    version_no, content_id, version.status
                )));
            }

            let initial_language = update
                .initial_language_code
                .clone()
                .unwrap_or(main_language);
            version.fields.entry(initial_language.clone()).or_default();

            for assignment in update.fields {
                let Some(category) = categories.get(&assignment.field_identifier) else {
                    return Err(RepositoryError::validation(format!(
                        "Field '{}' does not exist on content type {}",
                        assignment.field_identifier, content_type_id
                    )));
                };

                let matches = matches!(
                    (category, &assignment.value),
                    (FieldTypeCategory::Image, FieldValue::Image(_))
                        | (FieldTypeCategory::Generic, FieldValue::Generic(_))
                );
                if !matches {
                    return Err(RepositoryError::validation(format!(
                        "Field '{}' expects a {:?} value",
                        assignment.field_identifier, category
                    )));
                }

                let language = assignment
                    .language_code
                    .unwrap_or_else(|| initial_language.clone());
                let raw = to_raw(assignment.value, content_id, version_no, &language);
                version
                    .fields
                    .entry(language)
                    .or_insert_with(BTreeMap::new)
                    .insert(assignment.field_identifier, raw);
            }

            let record = document
                .content(content_id)
                .ok_or_else(|| RepositoryError::not_found("content", content_id))?;
            let version = record.version(version_no).ok_or_else(|| {
                RepositoryError::not_found("version", format!("{}/{}", content_id, version_no))
            })?;
            build_content(&document, record, version, &version.language_codes())?
        };

        debug!(content_id, version_no, "Draft updated");
        self.persist()?;
        Ok(content)
    }

    fn publish_version(&self, version_info: &VersionInfo) -> ServiceResult<Content> {
        let content_id = version_info.content_info.id;
        let version_no = version_info.version_no;
        self.ensure_can_edit(content_id)?;

        let content = {
            let mut document = self.document.borrow_mut();
            let content_type_id = document
                .content(content_id)
                .map(|record| record.content_type_id)
                .ok_or_else(|| RepositoryError::not_found("content", content_id))?;
            let content_type = document
                .content_type(content_type_id)
                .cloned()
                .ok_or_else(|| RepositoryError::not_found("content type", content_type_id))?;

            let record = document
                .content_mut(content_id)
                .ok_or_else(|| RepositoryError::not_found("content", content_id))?;
            let version = record.version(version_no).ok_or_else(|| {
                RepositoryError::not_found("version", format!("{}/{}", content_id, version_no))
            })?;

            if version.status != VersionStatus::Draft {
                return Err(RepositoryError::validation(format!(
                    "Version {} of content {} is {}, only drafts can be published",
                    version_no, content_id, version.status
                )));
            }

            for (language, fields) in &version.fields {
                for definition in content_type.field_definitions.iter().filter(|d| d.required) {
                    let empty = fields
                        .get(&definition.identifier)
                        .map(|raw| FieldValue::from_raw(definition.category(), raw.clone()).is_empty())
                        .unwrap_or(true);
                    if empty {
                        return Err(RepositoryError::validation(format!(
                            "Field '{}' is required in language '{}'",
                            definition.identifier, language
                        )));
                    }
                }
            }

            for version in record.versions.iter_mut() {
                if version.status == VersionStatus::Published {
                    version.status = VersionStatus::Archived;
                }
            }
            if let Some(version) = record.version_mut(version_no) {
                version.status = VersionStatus::Published;
            }
            record.current_version = version_no;

            let record = document
                .content(content_id)
                .ok_or_else(|| RepositoryError::not_found("content", content_id))?;
            let version = record.version(version_no).ok_or_else(|| {
                RepositoryError::not_found("version", format!("{}/{}", content_id, version_no))
            })?;
            build_content(&document, record, version, &version.language_codes())?
        };

        info!(content_id, version_no, "Version published");
        self.persist()?;
        Ok(content)
    }
}

impl ContentTypeService for JsonRepository {
    fn load_content_type(&self, id: ContentTypeId) -> ServiceResult<ContentType> {
        self.document
            .borrow()
            .content_type(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("content type", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::ImageValue;
    use serde_json::json;

    fn document() -> RepositoryDocument {
        serde_json::from_value(json!({
            "languages": [
                {"code": "eng-GB", "name": "English"},
                {"code": "fre-FR", "name": "French"},
                {"code": "ger-DE", "name": "German", "enabled": false}
            ],
            "users": [
                {"id": 14, "login": "admin"},
                {"id": 10, "login": "anonymous", "can_edit": false, "denied_content": [51]}
            ],
            "content_types": [{"id": 1, "identifier": "article", "field_definitions": [
                {"identifier": "title", "field_type": "ezstring", "required": true},
                {"identifier": "image", "field_type": "ezimage"}
            ]}],
            "contents": [
                {"id": 50, "content_type_id": 1, "main_language_code": "eng-GB",
                 "current_version": 1, "versions": [{"version_no": 1, "status": "published",
                    "fields": {"eng-GB": {"title": "Home", "image": {"id": "50-1-eng-GB", "uri": "images/home.png"}}}}]},
                {"id": 51, "content_type_id": 1, "main_language_code": "eng-GB",
                 "always_available": true,
                 "current_version": 1, "versions": [{"version_no": 1, "status": "published",
                    "fields": {"eng-GB": {"title": "About", "image": null}}}]}
            ],
            "locations": [
                {"id": 2, "content_id": 50},
                {"id": 3, "parent_id": 2, "content_id": 51},
                {"id": 4, "parent_id": 2, "content_id": 999}
            ]
        }))
        .unwrap()
    }

    fn repository() -> JsonRepository {
        JsonRepository::from_document(document(), 14).unwrap()
    }

    #[test]
    fn test_unknown_user_rejected() {
        let err = JsonRepository::from_document(document(), 99).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_load_language() {
        let repo = repository();
        assert_eq!(repo.load_language("fre-FR").unwrap().name, "French");
        assert_eq!(
            repo.load_language("xxx-XX").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            repo.load_language("ger-DE").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_children_skip_locations_without_content() {
        let repo = repository();
        let root = repo.load_location(2).unwrap();
        let children = repo.load_location_children(&root).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, 3);
        assert_eq!(children[0].content_info.id, 51);
    }

    #[test]
    fn test_load_content_language_resolution() {
        let repo = repository();

        let content = repo.load_content(50, &["eng-GB"], None, false).unwrap();
        assert_eq!(
            content.get_field_value("title", "eng-GB"),
            Some(&FieldValue::Generic(json!("Home")))
        );
        assert!(content.get_field_value("image", "eng-GB").unwrap().as_image().unwrap().has_uri());

        let err = repo.load_content(50, &["fre-FR"], None, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // always-available content falls back to its main language only when asked to
        assert!(repo.load_content(51, &["fre-FR"], None, false).is_err());
        let fallback = repo.load_content(51, &["fre-FR"], None, true).unwrap();
        assert_eq!(fallback.languages().collect::<Vec<_>>(), vec!["eng-GB"]);
    }

    #[test]
    fn test_draft_update_publish_cycle() {
        let repo = repository();
        let info = repo.load_location(2).unwrap().content_info;

        let draft = repo.create_content_draft(&info).unwrap();
        assert_eq!(draft.version_info.version_no, 2);
        assert_eq!(draft.version_info.status, VersionStatus::Draft);

        let mut update = repo.new_content_update_struct();
        update.initial_language_code = Some("fre-FR".to_string());
        update.set_field("title", FieldValue::Generic(json!("Accueil")));
        update.set_field(
            "image",
            FieldValue::Image(ImageValue::from_input_path("/nfs/50-1-eng-GB")),
        );
        let updated = repo.update_content(&draft.version_info, update).unwrap();
        assert_eq!(updated.version_info.language_codes, vec!["eng-GB", "fre-FR"]);

        let image = updated.get_field_value("image", "fre-FR").unwrap().as_image().unwrap();
        assert_eq!(image.uri.as_deref(), Some("/nfs/50-1-eng-GB"));
        assert_eq!(image.id.as_deref(), Some("50-2-fre-FR"));

        let published = repo.publish_version(&updated.version_info).unwrap();
        assert_eq!(published.version_info.status, VersionStatus::Published);

        let loaded = repo.load_content(50, &["fre-FR"], None, false).unwrap();
        assert_eq!(loaded.version_info.version_no, 2);
        assert_eq!(
            repo.document().content(50).unwrap().version(1).unwrap().status,
            VersionStatus::Archived
        );
    }

    #[test]
    fn test_update_rejects_unknown_field_and_wrong_category() {
        let repo = repository();
        let info = repo.load_location(2).unwrap().content_info;
        let draft = repo.create_content_draft(&info).unwrap();

        let mut update = ContentUpdateStruct::default();
        update.set_field("subtitle", FieldValue::Generic(json!("x")));
        let err = repo.update_content(&draft.version_info, update).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);

        let mut update = ContentUpdateStruct::default();
        update.set_field("image", FieldValue::Generic(json!("/path")));
        let err = repo.update_content(&draft.version_info, update).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[test]
    fn test_publish_requires_required_fields() {
        let repo = repository();
        let info = repo.load_location(2).unwrap().content_info;
        let draft = repo.create_content_draft(&info).unwrap();

        let mut update = ContentUpdateStruct::default();
        update.initial_language_code = Some("fre-FR".to_string());
        update.set_field("title", FieldValue::Generic(Value::Null));
        let updated = repo.update_content(&draft.version_info, update).unwrap();

        let err = repo.publish_version(&updated.version_info).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert!(err.to_string().contains("'title' is required in language 'fre-FR'"));

        // the published version is untouched and the draft is left behind
        let doc = repo.document();
        let record = doc.content(50).unwrap();
        assert_eq!(record.current_version, 1);
        assert_eq!(record.version(2).unwrap().status, VersionStatus::Draft);
    }

    #[test]
    fn test_publish_rejects_non_draft() {
        let repo = repository();
        let content = repo.load_content(50, &[], None, false).unwrap();
        let err = repo.publish_version(&content.version_info).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[test]
    fn test_permissions() {
        let repo = JsonRepository::from_document(document(), 10).unwrap();
        let info = repo.load_location(2).unwrap().content_info;

        let err = repo.create_content_draft(&info).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let err = repo.load_content(51, &["eng-GB"], None, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_open_and_persist_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repository.json");
        fs::write(&path, serde_json::to_string(&document()).unwrap()).unwrap();

        let repo = JsonRepository::open(&path, 14).unwrap();
        let info = repo.load_location(2).unwrap().content_info;
        repo.create_content_draft(&info).unwrap();

        let reopened = JsonRepository::open(&path, 14).unwrap();
        assert_eq!(reopened.document().content(50).unwrap().versions.len(), 2);
        assert!(!dir.path().join("repository.json.tmp").exists());
    }

    #[test]
    fn test_open_invalid_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonRepository::open(&path, 14).unwrap_err(),
            Error::Snapshot { .. }
        ));
        assert!(matches!(
            JsonRepository::open(dir.path().join("missing.json"), 14).unwrap_err(),
            Error::Io { .. }
        ));
    }
}
