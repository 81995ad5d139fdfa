//! Field remap policy
//!
//! Decides, per field type category, what value a new translation gets from
//! the reference-language value. Generic values are copied as they are.
//! Images are not copied byte-for-byte: the new translation references the
//! externally stored file of the reference image instead.

use crate::types::{FieldDefinition, FieldTypeCategory, FieldValue, ImageValue};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRemapper {
    image_base_path: String,
}

impl FieldRemapper {
    /// `image_base_path` is prepended verbatim to reference image ids
    pub fn new(image_base_path: impl Into<String>) -> Self {
        Self {
            image_base_path: image_base_path.into(),
        }
    }

    pub fn image_base_path(&self) -> &str {
        &self.image_base_path
    }

    /// Target-language value for one field
    pub fn remap(&self, definition: &FieldDefinition, reference: Option<&FieldValue>) -> FieldValue {
        match definition.category() {
            FieldTypeCategory::Image => self.remap_image(reference),
            FieldTypeCategory::Generic => reference
                .cloned()
                .unwrap_or(FieldValue::Generic(Value::Null)),
        }
    }

    fn remap_image(&self, reference: Option<&FieldValue>) -> FieldValue {
        match reference.and_then(FieldValue::as_image) {
            Some(image) if image.has_uri() => {
                let id = image.id.as_deref().unwrap_or_default();
                FieldValue::Image(ImageValue::from_input_path(format!(
                    "{}{}",
                    self.image_base_path, id
                )))
            }
            _ => FieldValue::Image(ImageValue::empty()),
        }
    }
}
