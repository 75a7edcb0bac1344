// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parser and Renderer traits for format handlers

use crate::ast::Tree;
use crate::config::SanitizePolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// Error type for parsing and rendering
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Unsupported format: {format}. Use 'bbcode', 'html' or 'markdown'.")]
    UnsupportedFormat { format: String },

    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// Markup syntaxes known to the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    BbCode,
    Html,
    Markdown,
}

impl Format {
    /// Short display name
    pub const fn label(&self) -> &'static str {
        match self {
            Self::BbCode => "bbcode",
            Self::Html => "html",
            Self::Markdown => "markdown",
        }
    }

    pub const ALL: [Self; 3] = [Self::BbCode, Self::Html, Self::Markdown];
}

impl FromStr for Format {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bbcode" => Ok(Self::BbCode),
            "html" | "htm" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(ConversionError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration for parsing
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Recognize image tags (`[img]`, `<img>`)
    pub allow_images: bool,
    /// What nested-element ingestion strips before building the tree
    pub sanitize: SanitizePolicy,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            allow_images: true,
            sanitize: SanitizePolicy::default(),
        }
    }
}

/// Configuration for rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// HTML-escape text content (HTML output only)
    pub escape_html: bool,
    /// Indentation per nesting level of markdown lists (default: 2 spaces)
    pub indent: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            escape_html: true,
            indent: "  ".to_string(),
        }
    }
}

/// Parser trait: convert source text to a tree
pub trait Parser {
    /// The source format this parser handles
    fn format(&self) -> Format;

    /// Parse a string into a tree. Malformed markup degrades to text.
    fn parse(&self, input: &str, config: &ParseConfig) -> Result<Tree>;
}

/// Renderer trait: walk a tree and emit target text.
///
/// Renderers never mutate the tree and keep no state between calls.
pub trait Renderer {
    /// The target format this renderer produces
    fn format(&self) -> Format;

    /// Render a tree to a string
    fn render(&self, tree: &Tree, config: &RenderConfig) -> Result<String>;
}

/// Extension trait for reader input (not dyn-compatible)
pub trait ParserExt: Parser {
    /// Read the whole input into memory, then parse it
    fn parse_reader<R: Read>(&self, reader: R, config: &ParseConfig) -> Result<Tree> {
        let mut input = String::new();
        let mut reader = reader;
        reader.read_to_string(&mut input)?;
        self.parse(&input, config)
    }
}

/// Extension trait for writer output (not dyn-compatible)
pub trait RendererExt: Renderer {
    /// Render to a writer
    fn render_writer<W: Write>(
        &self,
        tree: &Tree,
        writer: &mut W,
        config: &RenderConfig,
    ) -> Result<()> {
        let output = self.render(tree, config)?;
        writer.write_all(output.as_bytes())?;
        Ok(())
    }
}

// Blanket implementations
impl<T: Parser> ParserExt for T {}
impl<T: Renderer> RendererExt for T {}
