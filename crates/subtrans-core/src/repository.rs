//! Repository service traits
//!
//! The collector and translator never touch storage directly; they go
//! through these services. [`crate::store::JsonRepository`] implements all
//! of them on top of a snapshot file, and tests script their own.
//!
//! Every call is synchronous and may fail with a [`RepositoryError`].

use crate::error::RepositoryError;
use crate::types::{
    Content, ContentId, ContentInfo, ContentType, ContentTypeId, ContentUpdateStruct, Language,
    Location, LocationId, VersionInfo, VersionNo,
};

/// Result type for repository calls
pub type ServiceResult<T> = std::result::Result<T, RepositoryError>;

/// Language registry
pub trait LanguageService {
    fn load_language(&self, code: &str) -> ServiceResult<Language>;
}

/// Content tree navigation
pub trait LocationService {
    fn load_location(&self, id: LocationId) -> ServiceResult<Location>;

    /// Direct children, in the order the repository lists them
    fn load_location_children(&self, location: &Location) -> ServiceResult<Vec<Location>>;
}

/// Content loading, drafting and publishing
pub trait ContentService {
    /// Load the published version of a content item in one of `languages`
    ///
    /// An empty `languages` slice loads every language of the version.
    fn load_content_by_content_info(
        &self,
        content_info: &ContentInfo,
        languages: &[&str],
    ) -> ServiceResult<Content>;

    /// Load a content item by id
    ///
    /// `version_no` defaults to the published version. When none of
    /// `languages` exists, `use_always_available` allows falling back to the
    /// main language of always-available content.
    fn load_content(
        &self,
        content_id: ContentId,
        languages: &[&str],
        version_no: Option<VersionNo>,
        use_always_available: bool,
    ) -> ServiceResult<Content>;

    /// Create a new draft from the published version
    fn create_content_draft(&self, content_info: &ContentInfo) -> ServiceResult<Content>;

    fn new_content_update_struct(&self) -> ContentUpdateStruct {
        ContentUpdateStruct::default()
    }

    /// Apply staged field values to a draft
    fn update_content(
        &self,
        version_info: &VersionInfo,
        update: ContentUpdateStruct,
    ) -> ServiceResult<Content>;

    /// Publish a draft, making it the current version
    fn publish_version(&self, version_info: &VersionInfo) -> ServiceResult<Content>;
}

/// Content type schema lookups
pub trait ContentTypeService {
    fn load_content_type(&self, id: ContentTypeId) -> ServiceResult<ContentType>;
}

/// Everything a subtree translation run needs from the repository
pub trait Repository: LanguageService + LocationService + ContentService + ContentTypeService {}

impl<T> Repository for T where T: LanguageService + LocationService + ContentService + ContentTypeService {}
