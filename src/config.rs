//! Apply-time options

use crate::tree::WORD_IDX;

/// Rendering of an attribute a matched node does not carry
pub const DEFAULT_NULL_MARKER: &str = "None";

/// Options shared by every template of a compiled set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureConfig {
    /// Node attribute that candidate positions are matched against
    pub position_attribute: String,
    /// Stand-in value for absent attributes
    pub null_marker: String,
    /// Prefix features with `[INV_]ATTRS:LABEL[...]`; when off, emit bare values
    pub label_features: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            position_attribute: WORD_IDX.to_string(),
            null_marker: DEFAULT_NULL_MARKER.to_string(),
            label_features: true,
        }
    }
}

impl FeatureConfig {
    pub fn with_position_attribute(mut self, attribute: &str) -> Self {
        self.position_attribute = attribute.to_string();
        self
    }

    pub fn with_null_marker(mut self, marker: &str) -> Self {
        self.null_marker = marker.to_string();
        self
    }

    pub fn with_label_features(mut self, label: bool) -> Self {
        self.label_features = label;
        self
    }
}
