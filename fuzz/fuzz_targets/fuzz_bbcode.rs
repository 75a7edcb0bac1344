// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use bbconv_core::formats::{BbcodeHandler, HtmlRenderer, MarkdownHandler};
use bbconv_core::{Optimizer, ParseConfig, Parser, RenderConfig, Renderer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let handler = BbcodeHandler::new();
    let Ok(mut tree) = handler.parse(input, &ParseConfig::default()) else {
        return;
    };
    Optimizer::new().optimize(&mut tree);

    let config = RenderConfig::default();
    let _ = handler.render(&tree, &config);
    let _ = HtmlRenderer.render(&tree, &config);
    let _ = MarkdownHandler::new().render(&tree, &config);

    // Normalizing twice changes nothing
    let mut again = tree.clone();
    Optimizer::new().optimize(&mut again);
    assert_eq!(tree, again);
});
