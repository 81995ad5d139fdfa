//! Per-run memo of content type field definitions

use crate::repository::{ContentTypeService, ServiceResult};
use crate::types::{ContentTypeId, FieldDefinition};
use std::collections::HashMap;
use tracing::trace;

/// Lazily loads and keeps field definitions by content type id
///
/// Failed lookups are not remembered; the next request tries again.
#[derive(Debug, Default)]
pub struct FieldDefinitionCache {
    definitions: HashMap<ContentTypeId, Vec<FieldDefinition>>,
    loads: usize,
}

impl FieldDefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered field definitions of a content type
    pub fn definitions_for<S>(
        &mut self,
        service: &S,
        content_type_id: ContentTypeId,
    ) -> ServiceResult<&[FieldDefinition]>
    where
        S: ContentTypeService + ?Sized,
    {
        if !self.definitions.contains_key(&content_type_id) {
            let content_type = service.load_content_type(content_type_id)?;
            trace!(
                content_type_id,
                identifier = %content_type.identifier,
                fields = content_type.field_definitions.len(),
                "Content type loaded"
            );
            self.loads += 1;
            self.definitions
                .insert(content_type_id, content_type.field_definitions);
        }

        Ok(self
            .definitions
            .get(&content_type_id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Number of repository lookups performed so far
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
