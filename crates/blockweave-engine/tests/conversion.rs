use std::sync::Arc;

use blockweave_engine::{
    Block, ContentHandling, ConversionOptions, Converter, CssFramework, DiagnosticKind,
    HandlerError, HandlerRegistry, MalformedBlock, OptimizationLevel, OutputTarget, SsrOptions,
    convert, convert_json,
};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.json",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn markup_of(json: &str, options: ConversionOptions) -> String {
    convert_json(json, options)
        .unwrap()
        .markup()
        .unwrap()
        .to_string()
}

#[test]
fn centered_paragraph_gets_one_alignment_class() {
    let block = Block::new("core/paragraph")
        .with_attr("align", "center")
        .with_inner("<p>Centered</p>");
    let options = ConversionOptions::builder()
        .css_framework(CssFramework::Tailwind)
        .build();

    let markup = convert(&[block], options).unwrap().markup().unwrap().to_string();
    assert_snapshot!(markup, @r#"<p class="mb-4 text-center">Centered</p>"#);
}

#[test]
fn child_output_fills_placeholder_in_order() {
    let block = Block::new("acme/box")
        .with_inner("<div>")
        .with_child(Block::new("core/paragraph").with_inner("<p>child</p>"))
        .with_inner("</div>");
    let conversion = convert(&[block], ConversionOptions::default()).unwrap();
    assert_eq!(conversion.markup(), Some("<div><p>child</p></div>"));
}

#[test]
fn unregistered_block_reuses_rendered_html_in_hybrid_mode() {
    let mut block = Block::new("acme/promo")
        .with_attr("align", "wide")
        .with_rendered("<section class=\"promo\" data-x=\"1\"><p>Deal</p></section>");
    block.inner_content = vec![Some("<section>ignored</section>".to_string())];
    let options = ConversionOptions::builder()
        .css_framework(CssFramework::Tailwind)
        .content_handling(ContentHandling::Hybrid)
        .build();

    let markup = convert(&[block], options).unwrap().markup().unwrap().to_string();
    assert_snapshot!(
        markup,
        @r#"<section class="promo max-w-screen-xl mx-auto" data-x="1"><p>Deal</p></section>"#
    );
}

#[test]
fn rendered_html_without_new_classes_is_byte_identical() {
    let rendered = "<div  class='x'  >\n  <p>as authored</p>\n</div>";
    let block = Block::new("acme/anything")
        .with_attr("className", "x")
        .with_rendered(rendered);
    let options = ConversionOptions::builder()
        .content_handling(ContentHandling::Rendered)
        .build();
    let conversion = convert(&[block], options).unwrap();
    assert_eq!(conversion.markup(), Some(rendered));
}

#[test]
fn raw_post_keeps_template_whitespace() {
    let markup = markup_of(&fixture("post"), ConversionOptions::default());
    assert!(markup.starts_with("\n<h2 class=\"wp-block-heading\">Welcome</h2>\n"));
    assert!(markup.contains("<blockquote>Great!</blockquote>"));
    assert!(!markup.contains("testimonial"));
}

#[test]
fn hybrid_post_reuses_leaf_rendered_html() {
    let options = ConversionOptions::builder()
        .content_handling(ContentHandling::Hybrid)
        .build();
    let markup = markup_of(&fixture("post"), options);
    assert!(markup.contains("<blockquote class=\"testimonial\">Great!</blockquote>"));
    assert!(markup.contains("<section class=\"wp-block-group\">"));
}

#[test]
fn post_with_minimal_ssr() {
    let options = ConversionOptions::builder()
        .ssr(true)
        .ssr_options(SsrOptions::Level(OptimizationLevel::Minimal))
        .build();
    let conversion = convert_json(&fixture("post"), options).unwrap();
    assert!(conversion.resource_hints.is_empty());
    assert_snapshot!(
        conversion.markup().unwrap(),
        @r#"<h2 class="wp-block-heading">Welcome</h2><p class="has-text-align-center">Hello <em>world</em></p><section class="wp-block-group"><figure class="wp-block-image"><img src="https://cdn.example.com/hero.png" alt=""/></figure><blockquote>Great!</blockquote></section><figure class="wp-block-image"><img src="https://img.example.org/late.png" alt=""></figure>"#
    );
}

#[test]
fn post_with_balanced_ssr_and_tailwind() {
    let options = ConversionOptions::builder()
        .css_framework(CssFramework::Tailwind)
        .ssr(true)
        .build();
    let conversion = convert_json(&fixture("post"), options).unwrap();

    assert_snapshot!(
        conversion.markup().unwrap(),
        @r#"<h2 class="wp-block-heading font-bold text-3xl">Welcome</h2><p class="has-text-align-center mb-4 text-center">Hello <em>world</em></p><section class="wp-block-group my-6"><figure class="wp-block-image my-4"><img src="https://cdn.example.com/hero.png" alt=""/></figure><blockquote>Great!</blockquote></section><figure class="wp-block-image my-4"><img src="https://img.example.org/late.png" alt="" loading="lazy" decoding="async"></figure>"#
    );
    assert_snapshot!(
        conversion.head_markup(),
        @r#"<link rel="preconnect" href="https://cdn.example.com"><link rel="preconnect" href="https://img.example.org">"#
    );
}

#[test]
fn critical_path_only_drops_blocks_past_the_fold() {
    let flags = blockweave_engine::SsrFlags {
        critical_path_only: true,
        above_the_fold_budget: 2,
        ..OptimizationLevel::Balanced.flags()
    };
    let options = ConversionOptions::builder()
        .ssr(true)
        .ssr_options(SsrOptions::Flags(flags))
        .build();
    let conversion = convert_json(&fixture("post"), options).unwrap();
    assert_snapshot!(
        conversion.markup().unwrap(),
        @r#"<h2 class="wp-block-heading">Welcome</h2><p class="has-text-align-center">Hello <em>world</em></p>"#
    );
}

#[test]
fn broken_blocks_are_isolated() {
    let conversion = convert_json(&fixture("broken"), ConversionOptions::default()).unwrap();
    assert_eq!(conversion.markup(), Some("<p>before</p><p>after</p>"));

    let kinds: Vec<String> = conversion
        .diagnostics
        .iter()
        .map(|d| format!("{} {}", d.path, d.block_name))
        .collect();
    assert_eq!(kinds, vec!["1 ", "2 core/columns", "3 core/image"]);

    assert_eq!(
        conversion.diagnostics[1].kind,
        DiagnosticKind::Malformed(MalformedBlock::PlaceholderMismatch {
            placeholders: 2,
            children: 1
        })
    );
    assert_eq!(
        conversion.diagnostics[2].kind,
        DiagnosticKind::HandlerFailed(HandlerError::MissingAttribute("url"))
    );
}

#[test]
fn unknown_framework_name_is_fatal() {
    let framework = "bulma".parse::<CssFramework>();
    assert!(framework.is_err());
    assert_eq!(
        framework.unwrap_err().to_string(),
        "unknown CSS framework: bulma"
    );
}

#[test]
fn hooks_run_around_optimization() {
    let options = ConversionOptions::builder()
        .ssr(true)
        .ssr_options(SsrOptions::Level(OptimizationLevel::Minimal))
        .pre_optimize_hook(|html| html.replace("Hello", "Hello   there"))
        .post_optimize_hook(|html| format!("{html}<!-- end -->"))
        .build();
    let block = Block::new("core/paragraph").with_inner("<p>Hello</p>");
    let conversion = convert(&[block], options).unwrap();
    assert_eq!(conversion.markup(), Some("<p>Hello there</p><!-- end -->"));
}

#[test]
fn minified_inline_blocks_keep_separating_space() {
    let blocks = [
        Block::new("acme/inline").with_inner("Hello <b>big</b> "),
        Block::new("acme/inline").with_inner("world"),
        Block::new("core/paragraph").with_inner(" <p>next</p>"),
    ];
    let options = ConversionOptions::builder()
        .ssr(true)
        .ssr_options(SsrOptions::Level(OptimizationLevel::Minimal))
        .chunk_size(1)
        .build();
    let converter = Converter::new(Arc::new(HandlerRegistry::with_builtins()), options).unwrap();

    let whole = converter.convert(&blocks);
    assert_eq!(whole.markup(), Some("Hello <b>big</b> world<p>next</p>"));
    assert_eq!(converter.chunked(&blocks).into_markup(), "Hello <b>big</b> world<p>next</p>");
}

#[test]
fn vue_target_keeps_attribute_names() {
    let options = ConversionOptions::builder()
        .output_target(OutputTarget::Vue)
        .build();
    let block = Block::new("core/paragraph").with_inner("<p class=\"lead\" for=\"x\">Hi</p>");
    let conversion = convert(&[block], options).unwrap();
    let nodes = conversion.nodes().unwrap();
    assert!(nodes[0].attr("class").is_some());
    assert!(nodes[0].attr("className").is_none());
}

#[test]
fn react_nodes_carry_decoded_text() {
    let options = ConversionOptions::builder()
        .output_target(OutputTarget::React)
        .build();
    let block = Block::new("core/paragraph").with_inner("<p title=\"a &amp; b\">Tom &amp; Jerry</p>");
    let conversion = convert(&[block], options).unwrap();
    let nodes = conversion.nodes().unwrap();
    assert_eq!(nodes[0].text_content(), "Tom & Jerry");
    assert_eq!(
        nodes[0].attr("title"),
        Some(&blockweave_engine::NodeAttrValue::Text("a & b".into()))
    );
}

#[test]
fn converters_with_separate_registries_are_independent() {
    let mut custom = HandlerRegistry::new();
    custom.register(
        "core/paragraph",
        blockweave_engine::handler_fn(|_, _| Ok("<p>custom</p>".to_string())),
    );
    let block = Block::new("core/paragraph").with_inner("<p>template</p>");

    let a = Converter::new(Arc::new(custom), ConversionOptions::default()).unwrap();
    let b = Converter::new(
        Arc::new(HandlerRegistry::with_builtins()),
        ConversionOptions::default(),
    )
    .unwrap();

    assert_eq!(a.convert_block(&block).markup(), Some("<p>custom</p>"));
    assert_eq!(b.convert_block(&block).markup(), Some("<p>template</p>"));
}
