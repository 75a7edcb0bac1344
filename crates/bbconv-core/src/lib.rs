// SPDX-License-Identifier: AGPL-3.0-or-later
//! bbconv core - bracket-tag markup through a shared document tree
//!
//! This crate provides:
//! - An arena document tree that every syntax is parsed into
//! - A bracket-tag tokenizer and tolerant stack parser
//! - Normalization passes run between parsing and rendering
//! - Renderers for bracket tags, HTML and Markdown
//! - HTML ingestion over a pluggable document backend ([`DomAdapter`])
//! - The [`Converter`] entry points tying the stages together

pub mod ast;
pub mod config;
pub mod convert;
pub mod dom;
pub mod formats;
pub mod optimizer;
pub mod tags;
pub mod tokenizer;
pub mod traits;

pub use ast::{
    attr, Attributes, ListStyle, Node, NodeId, NodeKind, NodeRef, Tree, MAX_NESTING_DEPTH,
};
pub use config::{ConverterConfig, SanitizePolicy};
pub use convert::{Converter, ConverterBuilder};
pub use dom::{DomAdapter, DomDocument, SelectorList, TEXT_NODE_NAME};
pub use optimizer::Optimizer;
pub use traits::{
    ConversionError, Format, ParseConfig, Parser, ParserExt, RenderConfig, Renderer,
    RendererExt, Result,
};
