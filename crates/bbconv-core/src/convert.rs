// SPDX-License-Identifier: AGPL-3.0-or-later
//! Conversion entry points
//!
//! Every conversion runs tokenize, parse, optimize and render to completion
//! on a tree owned by the call. Handlers keep no state between calls, so one
//! [`Converter`] can serve any number of conversions.

use crate::ast::Tree;
use crate::config::ConverterConfig;
use crate::dom::DomAdapter;
use crate::formats::{BbcodeHandler, HtmlHandler, HtmlRenderer, MarkdownHandler};
use crate::optimizer::Optimizer;
use crate::traits::{ConversionError, Format, Parser, Renderer, Result};

/// Converts between bracket tags and HTML through the shared tree
pub struct Converter<A> {
    bbcode: BbcodeHandler,
    html: HtmlHandler<A>,
    markdown: MarkdownHandler,
    optimizer: Optimizer,
    config: ConverterConfig,
}

impl<A: DomAdapter> Converter<A> {
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, ConverterConfig::default())
    }

    pub fn with_config(adapter: A, config: ConverterConfig) -> Self {
        Self {
            bbcode: BbcodeHandler::new(),
            html: HtmlHandler::new(adapter),
            markdown: MarkdownHandler::new(),
            optimizer: Optimizer::new(),
            config,
        }
    }

    pub fn builder() -> ConverterBuilder<A> {
        ConverterBuilder::new()
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConverterConfig {
        &mut self.config
    }

    /// Bracket-tag text to HTML
    pub fn bbcode_to_html(&self, input: &str) -> Result<String> {
        let tree = self.parse_format(input, Format::BbCode)?;
        self.render_format(&tree, Format::Html)
    }

    /// HTML to bracket-tag text
    pub fn html_to_bbcode(&self, input: &str) -> Result<String> {
        let tree = self.parse_format(input, Format::Html)?;
        self.render_format(&tree, Format::BbCode)
    }

    /// Parse `input` written in `format` (`"bbcode"` or `"html"`)
    pub fn parse_to_tree(&self, input: &str, format: &str) -> Result<Tree> {
        match format.parse()? {
            Format::Markdown => Err(ConversionError::UnsupportedFormat {
                format: format.to_string(),
            }),
            parsed => self.parse_format(input, parsed),
        }
    }

    /// Render `tree` as `format` (`"bbcode"`, `"html"` or `"markdown"`).
    ///
    /// With normalization on, a normalized copy is rendered; the caller's
    /// tree is left as it was.
    pub fn render_tree(&self, tree: &Tree, format: &str) -> Result<String> {
        let format: Format = format.parse()?;
        if self.config.optimize {
            let mut normalized = tree.clone();
            self.optimizer.optimize(&mut normalized);
            self.render_format(&normalized, format)
        } else {
            self.render_format(tree, format)
        }
    }

    fn parse_format(&self, input: &str, format: Format) -> Result<Tree> {
        tracing::debug!(%format, input_len = input.len(), "parsing");
        let parse_config = self.config.parse_config();
        let mut tree = match format {
            _ if input.is_empty() => Tree::new(),
            Format::BbCode if self.config.allow_bbcode => self.bbcode.parse(input, &parse_config)?,
            Format::Html if self.config.allow_html => self.html.parse(input, &parse_config)?,
            Format::BbCode | Format::Html => {
                tracing::debug!(%format, "input format disabled, keeping text literal");
                Tree::from_text(input)
            }
            Format::Markdown => {
                return Err(ConversionError::UnsupportedFormat {
                    format: format.to_string(),
                })
            }
        };
        if self.config.optimize {
            self.optimizer.optimize(&mut tree);
        }
        Ok(tree)
    }

    fn render_format(&self, tree: &Tree, format: Format) -> Result<String> {
        let render_config = self.config.render_config();
        let output = match format {
            Format::BbCode => self.bbcode.render(tree, &render_config)?,
            Format::Html => HtmlRenderer.render(tree, &render_config)?,
            Format::Markdown => self.markdown.render(tree, &render_config)?,
        };
        tracing::debug!(%format, output_len = output.len(), "rendered");
        Ok(output)
    }
}

/// Builder for a [`Converter`] whose adapter is supplied later
pub struct ConverterBuilder<A> {
    adapter: Option<A>,
    config: ConverterConfig,
}

impl<A> Default for ConverterBuilder<A> {
    fn default() -> Self {
        Self {
            adapter: None,
            config: ConverterConfig::default(),
        }
    }
}

impl<A: DomAdapter> ConverterBuilder<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dom_adapter(mut self, adapter: A) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn config(mut self, config: ConverterConfig) -> Self {
        self.config = config;
        self
    }

    /// Fails when no document adapter was given
    pub fn build(self) -> Result<Converter<A>> {
        let adapter = self
            .adapter
            .ok_or(ConversionError::MissingCollaborator("document adapter"))?;
        Ok(Converter::with_config(adapter, self.config))
    }
}
