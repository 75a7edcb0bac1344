// SPDX-License-Identifier: AGPL-3.0-or-later
//! Format handlers for each supported format

pub mod bbcode;
pub mod html;
pub mod markdown;

pub use bbcode::BbcodeHandler;
pub use html::{escape_html, tree_from_document, HtmlHandler, HtmlRenderer};
pub use markdown::MarkdownHandler;
