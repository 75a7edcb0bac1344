// SPDX-License-Identifier: AGPL-3.0-or-later
//! Converter options

use crate::traits::{ConversionError, ParseConfig, RenderConfig, Result};
use serde::{Deserialize, Serialize};

/// Toggles consumed by [`crate::Converter`].
///
/// Missing keys in a TOML file fall back to the defaults: bracket tags and
/// images allowed, HTML input not allowed, escaping and normalization on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Interpret bracket tags; otherwise the input is literal text
    pub allow_bbcode: bool,
    /// Interpret HTML input; otherwise the input is literal text
    pub allow_html: bool,
    /// Recognize image tags
    pub allow_images: bool,
    /// HTML-escape text content in HTML output
    pub escape_html: bool,
    /// Run the normalization passes before rendering
    pub optimize: bool,
    pub sanitize: SanitizePolicy,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            allow_bbcode: true,
            allow_html: false,
            allow_images: true,
            escape_html: true,
            optimize: true,
            sanitize: SanitizePolicy::default(),
        }
    }
}

impl ConverterConfig {
    /// Read options from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| ConversionError::SerializationError(e.to_string()))
    }

    pub fn parse_config(&self) -> ParseConfig {
        ParseConfig {
            allow_images: self.allow_images,
            sanitize: self.sanitize.clone(),
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            escape_html: self.escape_html,
            ..RenderConfig::default()
        }
    }
}

/// Content removed from HTML input before it becomes a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizePolicy {
    /// Elements dropped together with their content
    pub remove_elements: Vec<String>,
    /// Attributes starting with this prefix are blanked (event handlers).
    /// An empty prefix disables the rule.
    pub event_attribute_prefix: String,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            remove_elements: ["script", "style", "noscript", "select", "object", "embed", "iframe"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            event_attribute_prefix: "on".to_string(),
        }
    }
}

impl SanitizePolicy {
    /// Selector pattern matching every element to drop
    pub fn removal_pattern(&self) -> String {
        self.remove_elements.join(", ")
    }

    pub fn is_event_attribute(&self, name: &str) -> bool {
        !self.event_attribute_prefix.is_empty()
            && name
                .to_ascii_lowercase()
                .starts_with(&self.event_attribute_prefix.to_ascii_lowercase())
    }
}
