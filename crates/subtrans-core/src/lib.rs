//! Subtrans Core - Subtree translation engine for content repositories
//!
//! This crate walks a location subtree of a content repository and creates,
//! for every node, a new translation copied from a reference language.
//!
//! # Main Components
//!
//! - **Repository services**: traits the engine talks to ([`repository`]),
//!   with a file-backed implementation in [`store`]
//! - **Collector**: snapshots the subtree in the reference language
//! - **Translator**: per-node escape/draft/update/publish state machine
//! - **Field remap policy**: how each field type category is carried over
//!
//! # Example
//!
//! ```no_run
//! use subtrans_core::{
//!     JsonRepository, LocationService, NoopObserver, SubtreeCollector, SubtreeTranslator,
//!     TranslationOptions,
//! };
//!
//! fn example() -> subtrans_core::Result<()> {
//!     let repository = JsonRepository::open("repository.json", 14)?;
//!     let root = repository.load_location(2)?;
//!
//!     let tree = SubtreeCollector::new(&repository, "eng-GB").collect(&root)?;
//!     let options = TranslationOptions::new("eng-GB", "fre-FR").image_base_path("var/storage/");
//!     let summary = SubtreeTranslator::new(&repository, options).translate(tree, &mut NoopObserver);
//!
//!     println!("{} object(s) have been translated", summary.translated);
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod definitions;
pub mod error;
pub mod remap;
pub mod repository;
pub mod store;
pub mod translator;
pub mod types;

// Re-export main types for convenience
pub use collector::{LocationNode, SubtreeCollector};
pub use definitions::FieldDefinitionCache;
pub use error::{Error, ErrorKind, RepositoryError, Result};
pub use remap::FieldRemapper;
pub use repository::{
    ContentService, ContentTypeService, LanguageService, LocationService, Repository,
    ServiceResult,
};
pub use store::{JsonRepository, RepositoryDocument};
pub use translator::{
    NodeOutcome, NodeReport, NoopObserver, SubtreeTranslator, TranslationObserver,
    TranslationOptions, TranslationSummary,
};
pub use types::{
    Content, ContentId, ContentInfo, ContentType, ContentTypeId, ContentUpdateStruct,
    FieldAssignment, FieldDefinition, FieldTypeCategory, FieldValue, ImageValue, Language,
    Location, LocationId, VersionInfo, VersionNo, VersionStatus,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
