//! Subtree translation
//!
//! Walks a collected tree depth-first and, for each node, creates a draft,
//! copies every field from the reference language into the target language
//! through the [`FieldRemapper`], and publishes it.
//!
//! Each node ends in one of three states:
//!
//! | outcome      | counted | children visited |
//! |--------------|---------|------------------|
//! | `Escaped`    | no      | no               |
//! | `Translated` | yes     | yes              |
//! | `Failed`     | no      | no               |
//!
//! A failure never stops the walk; the next sibling is processed as usual.
//! Nothing is retried and abandoned drafts are left in the repository.

use crate::collector::LocationNode;
use crate::definitions::FieldDefinitionCache;
use crate::error::ErrorKind;
use crate::remap::FieldRemapper;
use crate::repository::{ContentService, ContentTypeService, ServiceResult};
use crate::types::{Content, ContentId, LocationId, VersionNo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, trace, warn};

/// Parameters of one translation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOptions {
    /// Language the field values are copied from
    pub reference_language: String,

    /// Language being created
    pub target_language: String,

    /// Leave nodes that already have a target-language version untouched
    pub escape_translated: bool,

    /// Prefix for reference image ids when re-linking image files
    pub image_base_path: String,
}

impl TranslationOptions {
    pub fn new(reference_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            reference_language: reference_language.into(),
            target_language: target_language.into(),
            escape_translated: false,
            image_base_path: String::new(),
        }
    }

    pub fn escape_translated(mut self, escape: bool) -> Self {
        self.escape_translated = escape;
        self
    }

    pub fn image_base_path(mut self, path: impl Into<String>) -> Self {
        self.image_base_path = path.into();
        self
    }
}

/// How a node ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeOutcome {
    /// Draft updated and published
    Translated { version_no: VersionNo },
    /// Target language already present
    Escaped,
    /// Draft creation, update or publish failed
    Failed { kind: ErrorKind, message: String },
}

impl NodeOutcome {
    /// Short status used in line reports
    pub fn label(&self) -> &'static str {
        match self {
            NodeOutcome::Translated { .. } => "OK",
            NodeOutcome::Escaped => "escaped",
            NodeOutcome::Failed { .. } => "KO",
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, NodeOutcome::Translated { .. })
    }
}

/// Result of processing one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReport {
    pub location_id: LocationId,
    pub content_id: ContentId,
    /// Distance from the collected root
    pub depth: usize,
    pub outcome: NodeOutcome,
}

/// Accumulated results of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSummary {
    pub translated: usize,
    pub escaped: usize,
    pub failed: usize,
    /// Collected nodes below escaped or failed nodes
    pub not_visited: usize,
    pub nodes: Vec<NodeReport>,
}

impl TranslationSummary {
    fn record(&mut self, report: NodeReport) {
        match report.outcome {
            NodeOutcome::Translated { .. } => self.translated += 1,
            NodeOutcome::Escaped => self.escaped += 1,
            NodeOutcome::Failed { .. } => self.failed += 1,
        }
        self.nodes.push(report);
    }

    pub fn processed(&self) -> usize {
        self.nodes.len()
    }
}

/// Receives per-node events while the walk is running
pub trait TranslationObserver {
    /// Called before anything is attempted on a node
    fn node_started(&mut self, _location_id: LocationId, _content_id: ContentId) {}

    /// Called once the node reached its final state
    fn node_finished(&mut self, report: &NodeReport);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TranslationObserver for NoopObserver {
    fn node_finished(&mut self, _report: &NodeReport) {}
}

/// Translates collected subtrees
pub struct SubtreeTranslator<'a, R> {
    repository: &'a R,
    options: TranslationOptions,
    remapper: FieldRemapper,
    definitions: FieldDefinitionCache,
}

impl<'a, R> SubtreeTranslator<'a, R>
where
    R: ContentService + ContentTypeService,
{
    pub fn new(repository: &'a R, options: TranslationOptions) -> Self {
        let remapper = FieldRemapper::new(options.image_base_path.clone());
        Self {
            repository,
            options,
            remapper,
            definitions: FieldDefinitionCache::new(),
        }
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    /// Field definition lookups done so far
    pub fn definition_cache(&self) -> &FieldDefinitionCache {
        &self.definitions
    }

    /// Translate one collected tree
    pub fn translate(
        &mut self,
        root: LocationNode,
        observer: &mut dyn TranslationObserver,
    ) -> TranslationSummary {
        self.translate_all(vec![root], observer)
    }

    /// Translate sibling trees in order
    pub fn translate_all(
        &mut self,
        nodes: Vec<LocationNode>,
        observer: &mut dyn TranslationObserver,
    ) -> TranslationSummary {
        let mut summary = TranslationSummary::default();
        let mut stack: Vec<(LocationNode, usize)> =
            nodes.into_iter().rev().map(|node| (node, 0)).collect();

        while let Some((node, depth)) = stack.pop() {
            let LocationNode {
                location,
                content,
                children,
            } = node;
            let _span = info_span!(
                "node",
                location_id = location.id,
                content_id = content.id(),
                depth
            )
            .entered();

            observer.node_started(location.id, content.id());

            let outcome = if self.options.escape_translated && self.is_translated(&content) {
                debug!("Target language already present, escaping");
                NodeOutcome::Escaped
            } else {
                match self.translate_content(&content) {
                    Ok(published) => {
                        info!(version_no = published.version_info.version_no, "Translated");
                        NodeOutcome::Translated {
                            version_no: published.version_info.version_no,
                        }
                    }
                    Err(err) => {
                        warn!(kind = %err.kind(), error = %err, "Translation failed");
                        NodeOutcome::Failed {
                            kind: err.kind(),
                            message: err.to_string(),
                        }
                    }
                }
            };

            if outcome.is_translated() {
                stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
            } else {
                summary.not_visited += children.iter().map(LocationNode::len).sum::<usize>();
            }

            let report = NodeReport {
                location_id: location.id,
                content_id: content.id(),
                depth,
                outcome,
            };
            observer.node_finished(&report);
            summary.record(report);
        }

        summary
    }

    /// Whether the content already loads in the target language
    fn is_translated(&self, content: &Content) -> bool {
        match self.repository.load_content(
            content.id(),
            &[self.options.target_language.as_str()],
            None,
            false,
        ) {
            Ok(_) => true,
            Err(err) => {
                trace!(kind = %err.kind(), error = %err, "Not translated yet");
                false
            }
        }
    }

    /// Draft, remap, update and publish one content item
    fn translate_content(&mut self, content: &Content) -> ServiceResult<Content> {
        let draft = self.repository.create_content_draft(content.content_info())?;

        let mut update = self.repository.new_content_update_struct();
        update.initial_language_code = Some(self.options.target_language.clone());

        let definitions = self
            .definitions
            .definitions_for(self.repository, content.content_type_id())?;
        for definition in definitions {
            let reference =
                content.get_field_value(&definition.identifier, &self.options.reference_language);
            update.set_field(
                definition.identifier.clone(),
                self.remapper.remap(definition, reference),
            );
        }

        let updated = self.repository.update_content(&draft.version_info, update)?;
        self.repository.publish_version(&updated.version_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(NodeOutcome::Translated { version_no: 2 }.label(), "OK");
        assert_eq!(NodeOutcome::Escaped.label(), "escaped");
        assert_eq!(
            NodeOutcome::Failed {
                kind: ErrorKind::Unknown,
                message: "boom".to_string()
            }
            .label(),
            "KO"
        );
    }

    #[test]
    fn test_summary_counts_by_outcome() {
        let mut summary = TranslationSummary::default();
        for (id, outcome) in [
            (1, NodeOutcome::Translated { version_no: 2 }),
            (2, NodeOutcome::Escaped),
            (
                3,
                NodeOutcome::Failed {
                    kind: ErrorKind::ValidationFailed,
                    message: "title is required".to_string(),
                },
            ),
            (4, NodeOutcome::Translated { version_no: 5 }),
        ] {
            summary.record(NodeReport {
                location_id: id,
                content_id: id + 100,
                depth: 0,
                outcome,
            });
        }

        assert_eq!(summary.translated, 2);
        assert_eq!(summary.escaped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed(), 4);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = NodeOutcome::Failed {
            kind: ErrorKind::PermissionDenied,
            message: "denied".to_string(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["kind"], "permission_denied");
    }
}
