//! Subtree collection
//!
//! Snapshots a location subtree in the reference language before anything
//! is mutated. The walk uses an explicit work stack, so arbitrarily deep
//! trees cannot exhaust the call stack.
//!
//! Failure policy:
//! - the root must load, otherwise [`Error::RootUnavailable`];
//! - a child whose content does not load in the reference language is
//!   dropped together with its whole subtree;
//! - a node whose children cannot be listed is kept as a leaf.

use crate::error::{Error, RepositoryError, Result};
use crate::repository::{ContentService, LocationService};
use crate::types::{Content, Location, LocationId};
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// One collected location with its reference-language content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationNode {
    pub location: Location,
    pub content: Content,

    /// Collected children, in repository listing order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LocationNode>,
}

impl LocationNode {
    pub fn id(&self) -> LocationId {
        self.location.id
    }

    /// Number of nodes in this subtree, including this one
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Location ids in depth-first pre-order
    pub fn ids(&self) -> Vec<LocationId> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            ids.push(node.id());
            stack.extend(node.children.iter().rev());
        }
        ids
    }
}

/// Collected entry before the tree is assembled
struct Entry {
    location: Location,
    content: Content,
    depth: usize,
    children: Vec<usize>,
}

/// Collects a subtree, loading each node in the reference language
pub struct SubtreeCollector<'a, R> {
    repository: &'a R,
    reference_language: String,
    max_depth: Option<usize>,
}

impl<'a, R> SubtreeCollector<'a, R>
where
    R: LocationService + ContentService,
{
    pub fn new(repository: &'a R, reference_language: impl Into<String>) -> Self {
        Self {
            repository,
            reference_language: reference_language.into(),
            max_depth: None,
        }
    }

    /// Stop descending below this depth (the root is depth 0)
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Collect the subtree rooted at `root`
    #[instrument(skip(self, root), fields(root = root.id, language = %self.reference_language))]
    pub fn collect(&self, root: &Location) -> Result<LocationNode> {
        let language = self.reference_language.as_str();

        let root_content = self
            .repository
            .load_content_by_content_info(&root.content_info, &[language])
            .map_err(|source| Error::RootUnavailable {
                location_id: root.id,
                language: self.reference_language.clone(),
                source,
            })?;

        let mut entries = vec![Entry {
            location: root.clone(),
            content: root_content,
            depth: 0,
            children: Vec::new(),
        }];
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            let depth = entries[index].depth;
            if self.max_depth.is_some_and(|max| depth >= max) {
                continue;
            }

            let children = match self
                .repository
                .load_location_children(&entries[index].location)
            {
                Ok(children) => children,
                Err(err) => {
                    warn!(
                        location_id = entries[index].location.id,
                        kind = %err.kind(),
                        error = %err,
                        "Could not list children, keeping location as a leaf"
                    );
                    continue;
                }
            };

            for child in children {
                match self
                    .repository
                    .load_content_by_content_info(&child.content_info, &[language])
                {
                    Ok(content) => {
                        let child_index = entries.len();
                        entries.push(Entry {
                            location: child,
                            content,
                            depth: depth + 1,
                            children: Vec::new(),
                        });
                        entries[index].children.push(child_index);
                        stack.push(child_index);
                    }
                    Err(err) => {
                        debug!(
                            location_id = child.id,
                            content_id = child.content_info.id,
                            kind = %err.kind(),
                            error = %err,
                            "Skipping location and its subtree"
                        );
                    }
                }
            }
        }

        debug!(collected = entries.len(), "Subtree collected");
        assemble(entries)
            .ok_or_else(|| RepositoryError::unknown("collected subtree has no root").into())
    }
}

/// Build the nested tree from collected entries
///
/// Children always have a larger index than their parent, so walking the
/// entries backwards finishes every child before its parent needs it.
fn assemble(entries: Vec<Entry>) -> Option<LocationNode> {
    let mut built: Vec<Option<LocationNode>> = Vec::with_capacity(entries.len());
    built.resize_with(entries.len(), || None);

    for (index, entry) in entries.into_iter().enumerate().rev() {
        let children = entry
            .children
            .iter()
            .filter_map(|child| built[*child].take())
            .collect();
        built[index] = Some(LocationNode {
            location: entry.location,
            content: entry.content,
            children,
        });
    }

    built.into_iter().next().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::{JsonRepository, RepositoryDocument};
    use serde_json::json;

    fn repository() -> JsonRepository {
        let content = |id: u64, languages: &[&str]| {
            let fields: serde_json::Map<String, serde_json::Value> = languages
                .iter()
                .map(|code| (code.to_string(), json!({"name": format!("node {}", id)})))
                .collect();
            json!({"id": id, "content_type_id": 1, "main_language_code": "eng-GB",
                   "current_version": 1,
                   "versions": [{"version_no": 1, "status": "published", "fields": fields}]})
        };

        let document: RepositoryDocument = serde_json::from_value(json!({
            "languages": [{"code": "eng-GB"}, {"code": "fre-FR"}],
            "users": [{"id": 14}],
            "content_types": [{"id": 1, "identifier": "folder",
                "field_definitions": [{"identifier": "name", "field_type": "ezstring"}]}],
            "contents": [
                content(110, &["eng-GB"]),
                content(111, &["eng-GB"]),
                content(112, &["fre-FR"]),
                content(113, &["eng-GB"]),
                content(114, &["eng-GB"]),
                content(115, &["eng-GB"])
            ],
            "locations": [
                {"id": 10, "content_id": 110},
                {"id": 11, "parent_id": 10, "content_id": 111},
                {"id": 12, "parent_id": 10, "content_id": 112},
                {"id": 13, "parent_id": 12, "content_id": 113},
                {"id": 14, "parent_id": 11, "content_id": 114},
                {"id": 15, "parent_id": 10, "content_id": 115}
            ]
        }))
        .unwrap();
        JsonRepository::from_document(document, 14).unwrap()
    }

    #[test]
    fn test_collect_nests_children_in_listing_order() {
        let repo = repository();
        let root = repo.load_location(10).unwrap();
        let tree = SubtreeCollector::new(&repo, "eng-GB").collect(&root).unwrap();

        assert_eq!(tree.id(), 10);
        let child_ids: Vec<u64> = tree.children.iter().map(|c| c.id()).collect();
        assert_eq!(child_ids, vec![11, 15]);
        assert_eq!(tree.children[0].children[0].id(), 14);
        assert_eq!(tree.ids(), vec![10, 11, 14, 15]);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_child_without_reference_translation_drops_subtree() {
        let repo = repository();
        let root = repo.load_location(10).unwrap();
        let tree = SubtreeCollector::new(&repo, "eng-GB").collect(&root).unwrap();

        // 12 only exists in fre-FR; 13 is loadable but sits below 12
        assert!(!tree.ids().contains(&12));
        assert!(!tree.ids().contains(&13));
    }

    #[test]
    fn test_root_failure_is_fatal() {
        let repo = repository();
        let root = repo.load_location(12).unwrap();
        let err = SubtreeCollector::new(&repo, "eng-GB").collect(&root).unwrap_err();

        match err {
            Error::RootUnavailable {
                location_id,
                source,
                ..
            } => {
                assert_eq!(location_id, 12);
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_max_depth_limits_collection() {
        let repo = repository();
        let root = repo.load_location(10).unwrap();

        let tree = SubtreeCollector::new(&repo, "eng-GB")
            .with_max_depth(Some(1))
            .collect(&root)
            .unwrap();
        assert_eq!(tree.ids(), vec![10, 11, 15]);

        let tree = SubtreeCollector::new(&repo, "eng-GB")
            .with_max_depth(Some(0))
            .collect(&root)
            .unwrap();
        assert_eq!(tree.ids(), vec![10]);
    }

    #[test]
    fn test_content_loaded_in_reference_language_only() {
        let repo = repository();
        let root = repo.load_location(10).unwrap();
        let tree = SubtreeCollector::new(&repo, "eng-GB").collect(&root).unwrap();
        assert_eq!(tree.content.languages().collect::<Vec<_>>(), vec!["eng-GB"]);
    }
}
