//! # Conversion Engine
//!
//! Walks a block tree depth-first in pre-order and assembles its markup.
//! For every block:
//!
//! 1. The block is validated; a malformed block renders as nothing and is
//!    reported as a [`Diagnostic`].
//! 2. With SSR enabled, the block is classified critical or not.
//! 3. Its content is reconciled: rendered HTML is reused, or the template is
//!    filled with its children, each converted recursively at this point.
//! 4. The handler renders the block (caller transformers first, then the
//!    registry, then the fallback). A failing handler blanks only this block.
//! 5. Resolved classes and hydration markers are merged into the root tag,
//!    and the block's own media elements are deferred.
//!
//! Each top-level block then goes through the text stage: pre hook, the SSR
//! text pass (duplicate styles, preconnect origins, minify) and post hook.
//! Because everything after the tree walk works per top-level block, a
//! chunked conversion produces exactly the same bytes.

use std::sync::{Arc, OnceLock};

use blockweave_markup::{Node, NodeFlavor, parse_fragment, rewrite_first_start_tag};
use uuid::Uuid;

use crate::block::{Block, BlockInput, BlockPath};
use crate::chunked::ChunkedConversion;
use crate::classes::resolve_classes;
use crate::error::{ConvertError, Diagnostic, DiagnosticKind};
use crate::options::{ConversionOptions, OutputTarget};
use crate::reconcile::{ContentSource, TemplatePart, content_source, inject_classes, template_parts};
use crate::registry::{BlockHandler, HandlerContext, HandlerRegistry};
use crate::ssr::{Criticality, OptimizationContext, ResourceHint};

/// Attribute naming the block type on an interactive block's root element.
pub const BLOCK_NAME_ATTR: &str = "data-block";
/// Attribute carrying the stable identity of an interactive block.
pub const BLOCK_ID_ATTR: &str = "data-block-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Markup(String),
    Nodes(Vec<Node>),
}

impl Output {
    pub fn markup(&self) -> Option<&str> {
        match self {
            Output::Markup(markup) => Some(markup),
            Output::Nodes(_) => None,
        }
    }

    pub fn nodes(&self) -> Option<&[Node]> {
        match self {
            Output::Nodes(nodes) => Some(nodes),
            Output::Markup(_) => None,
        }
    }
}

/// Result of converting a block list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub output: Output,
    /// Blocks that rendered as empty output, and why.
    pub diagnostics: Vec<Diagnostic>,
    /// Hints for the document head, collected by the SSR pass.
    pub resource_hints: Vec<ResourceHint>,
}

impl Conversion {
    pub fn markup(&self) -> Option<&str> {
        self.output.markup()
    }

    pub fn nodes(&self) -> Option<&[Node]> {
        self.output.nodes()
    }

    /// Resource hints as `<link>` tags.
    pub fn head_markup(&self) -> String {
        self.resource_hints
            .iter()
            .map(ResourceHint::to_markup)
            .collect()
    }
}

/// Converts block trees with one registry and one set of options.
#[derive(Debug)]
pub struct Converter {
    registry: Arc<HandlerRegistry>,
    options: ConversionOptions,
}

impl Converter {
    /// Fails when the options are invalid; nothing is converted then.
    pub fn new(registry: Arc<HandlerRegistry>, options: ConversionOptions) -> Result<Self, ConvertError> {
        options.validate()?;
        Ok(Self { registry, options })
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Converts a block list; outputs are concatenated in input order.
    pub fn convert(&self, blocks: &[Block]) -> Conversion {
        let mut session = Session::new(self);
        let mut markup = String::new();
        for (index, block) in blocks.iter().enumerate() {
            markup.push_str(&session.top_level(index, block));
        }
        Conversion {
            output: session.output(markup),
            diagnostics: session.take_diagnostics(),
            resource_hints: session.take_resource_hints(),
        }
    }

    pub fn convert_block(&self, block: &Block) -> Conversion {
        self.convert(std::slice::from_ref(block))
    }

    /// Lazily converts `blocks` in chunks of `streaming.chunk_size`.
    pub fn chunked<'a>(&'a self, blocks: &'a [Block]) -> ChunkedConversion<'a> {
        ChunkedConversion::new(self, blocks)
    }
}

/// Per-call conversion state. Never shared between calls.
pub(crate) struct Session<'c> {
    converter: &'c Converter,
    optimizer: Option<OptimizationContext>,
    diagnostics: Vec<Diagnostic>,
    resource_hints: Vec<ResourceHint>,
}

impl<'c> Session<'c> {
    pub(crate) fn new(converter: &'c Converter) -> Self {
        Self {
            converter,
            optimizer: converter.options.ssr_flags().map(OptimizationContext::new),
            diagnostics: Vec::new(),
            resource_hints: Vec::new(),
        }
    }

    /// Converts the top-level block at `index` and runs its text stage.
    pub(crate) fn top_level(&mut self, index: usize, block: &Block) -> String {
        let fragment = self.convert_node(block, &BlockPath::root(index));
        self.finish_fragment(fragment)
    }

    pub(crate) fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn take_resource_hints(&mut self) -> Vec<ResourceHint> {
        std::mem::take(&mut self.resource_hints)
    }

    pub(crate) fn output(&self, markup: String) -> Output {
        let flavor = match self.converter.options.output_target {
            OutputTarget::Markup => return Output::Markup(markup),
            OutputTarget::React => NodeFlavor::React,
            OutputTarget::Vue => NodeFlavor::Vue,
            OutputTarget::Svelte => NodeFlavor::Svelte,
        };
        Output::Nodes(parse_fragment(&markup, flavor))
    }

    fn finish_fragment(&mut self, fragment: String) -> String {
        let converter = self.converter;
        let options = &converter.options;
        let fragment = match &options.pre_optimize_hook {
            Some(hook) => hook(&fragment),
            None => fragment,
        };
        let fragment = match self.optimizer.as_mut() {
            Some(optimizer) => {
                let (html, hints) = optimizer.finish_fragment(fragment);
                self.resource_hints.extend(hints);
                html
            }
            None => fragment,
        };
        match &options.post_optimize_hook {
            Some(hook) => hook(&fragment),
            None => fragment,
        }
    }

    fn convert_node(&mut self, block: &Block, path: &BlockPath) -> String {
        if let Err(malformed) = block.validate() {
            self.report(block, path, DiagnosticKind::Malformed(malformed));
            return String::new();
        }

        let criticality = self.optimizer.as_mut().map(|o| o.classify(path));
        if criticality == Some(Criticality::NonCritical)
            && self
                .optimizer
                .as_ref()
                .is_some_and(|o| o.flags().critical_path_only)
        {
            log::debug!("Skipping non-critical block {path} ({})", block.name);
            return String::new();
        }

        let converter = self.converter;
        let options = &converter.options;
        let source = content_source(block, options.content_handling);
        // Media in children is handled when the children are converted; only
        // this block's own literals are rewritten here.
        let children_converted = source == ContentSource::Template && !block.is_leaf();

        let mut children = Vec::with_capacity(block.inner_blocks.len());
        let content = match source {
            ContentSource::Rendered => block.rendered_html.clone().unwrap_or_default(),
            ContentSource::Template => {
                let mut out = String::new();
                for part in template_parts(&block.inner_content) {
                    match part {
                        TemplatePart::Literal(literal) => match criticality {
                            Some(c) if children_converted => {
                                out.push_str(&self.rewrite_media(literal, c))
                            }
                            _ => out.push_str(literal),
                        },
                        TemplatePart::Child(i) => {
                            let Some(child) = block.inner_blocks.get(i) else {
                                continue;
                            };
                            let html = self.convert_node(child, &path.child(i));
                            out.push_str(&html);
                            children.push(html);
                        }
                    }
                }
                out
            }
        };

        let handler: &dyn BlockHandler = match options.block_transformers.get(&block.name) {
            Some(handler) => handler.as_ref(),
            None => converter.registry.resolve(&block.name),
        };
        log::debug!("Rendering {path} ({}) from {source:?} content", block.name);

        let cx = HandlerContext {
            content: &content,
            source,
            children: &children,
            options,
            path,
        };
        let rendered = match handler.render(block, &cx) {
            Ok(html) => html,
            Err(e) => {
                self.report(block, path, DiagnosticKind::HandlerFailed(e));
                return String::new();
            }
        };

        let classes = resolve_classes(
            &block.name,
            &block.attributes,
            options.css_framework,
            options.custom_class_map.as_ref(),
        );
        let mut html = inject_classes(&rendered, &classes);
        if options.is_interactive(&block.name) || handler.is_interactive(block) {
            html = add_hydration_markers(&html, &block.name, path);
        }
        match criticality {
            Some(c) if !children_converted => self.rewrite_media(&html, c),
            _ => html,
        }
    }

    fn rewrite_media(&mut self, html: &str, criticality: Criticality) -> String {
        match self.optimizer.as_mut() {
            Some(optimizer) => optimizer.rewrite_media(html, criticality),
            None => html.to_string(),
        }
    }

    fn report(&mut self, block: &Block, path: &BlockPath, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            path: path.clone(),
            block_name: block.name.clone(),
            kind,
        };
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

/// Stable identity of a block for hydration: the same path and name always
/// give the same id.
pub fn block_id(path: &BlockPath, block_name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{path}:{block_name}").as_bytes())
}

fn add_hydration_markers(html: &str, block_name: &str, path: &BlockPath) -> String {
    let id = block_id(path, block_name).to_string();
    rewrite_first_start_tag(html, |tag| {
        let named = tag.set_attr_if_absent(BLOCK_NAME_ATTR, block_name);
        let identified = tag.set_attr_if_absent(BLOCK_ID_ATTR, &id);
        named || identified
    })
}

fn builtin_registry() -> Arc<HandlerRegistry> {
    static REGISTRY: OnceLock<Arc<HandlerRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Arc::new(HandlerRegistry::with_builtins()))
        .clone()
}

/// Converts `blocks` with the built-in handlers.
pub fn convert(blocks: &[Block], options: ConversionOptions) -> Result<Conversion, ConvertError> {
    Ok(Converter::new(builtin_registry(), options)?.convert(blocks))
}

/// Converts a JSON document holding one block or a list of blocks.
pub fn convert_json(json: &str, options: ConversionOptions) -> Result<Conversion, ConvertError> {
    let converter = Converter::new(builtin_registry(), options)?;
    let input: BlockInput = serde_json::from_str(json)?;
    Ok(converter.convert(&input.into_blocks()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::options::CssFramework;
    use crate::registry::handler_fn;
    use pretty_assertions::assert_eq;

    fn markup(options: ConversionOptions, blocks: &[Block]) -> String {
        let conversion = convert(blocks, options).unwrap();
        conversion.markup().unwrap().to_string()
    }

    #[test]
    fn template_children_fill_placeholders_in_order() {
        let block = Block::new("acme/wrapper")
            .with_inner("<div>")
            .with_child(Block::new("core/paragraph").with_inner("<p>a</p>"))
            .with_inner("</div>");
        assert_eq!(
            markup(ConversionOptions::default(), &[block]),
            "<div><p>a</p></div>"
        );
    }

    #[test]
    fn malformed_child_is_blanked_and_siblings_survive() {
        let mut broken = Block::new("core/paragraph").with_inner("<p>broken</p>");
        broken.inner_content.push(None);
        let block = Block::new("core/group")
            .with_inner("<div>")
            .with_child(broken)
            .with_child(Block::new("core/paragraph").with_inner("<p>ok</p>"))
            .with_inner("</div>");

        let conversion = convert(&[block], ConversionOptions::default()).unwrap();
        assert_eq!(conversion.markup(), Some("<div><p>ok</p></div>"));
        assert_eq!(conversion.diagnostics.len(), 1);
        assert_eq!(conversion.diagnostics[0].path, BlockPath::root(0).child(0));
    }

    #[test]
    fn failing_transformer_is_isolated() {
        let options = ConversionOptions::builder()
            .block_transformer(
                "acme/bad",
                handler_fn(|_, _| Err(HandlerError::Failed("boom".into()))),
            )
            .build();
        let blocks = [
            Block::new("core/paragraph").with_inner("<p>1</p>"),
            Block::new("acme/bad").with_inner("<p>2</p>"),
            Block::new("core/paragraph").with_inner("<p>3</p>"),
        ];
        let conversion = convert(&blocks, options).unwrap();
        assert_eq!(conversion.markup(), Some("<p>1</p><p>3</p>"));
        assert!(matches!(
            conversion.diagnostics[0].kind,
            DiagnosticKind::HandlerFailed(HandlerError::Failed(_))
        ));
    }

    #[test]
    fn transformers_take_precedence_over_registry() {
        let options = ConversionOptions::builder()
            .block_transformer(
                "core/separator",
                handler_fn(|_, _| Ok("<hr class=\"fancy\">".to_string())),
            )
            .build();
        assert_eq!(
            markup(options, &[Block::new("core/separator")]),
            "<hr class=\"fancy\">"
        );
    }

    #[test]
    fn interactive_blocks_get_stable_markers() {
        let block = Block::new("core/search").with_inner("<form role=\"search\"></form>");
        let html = markup(ConversionOptions::default(), &[block.clone()]);
        let id = block_id(&BlockPath::root(0), "core/search");
        assert_eq!(
            html,
            format!("<form role=\"search\" data-block=\"core/search\" data-block-id=\"{id}\"></form>")
        );
        assert_eq!(html, markup(ConversionOptions::default(), &[block]));
    }

    #[test]
    fn block_ids_differ_by_position() {
        assert_ne!(
            block_id(&BlockPath::root(0), "core/search"),
            block_id(&BlockPath::root(1), "core/search")
        );
    }

    #[test]
    fn invalid_options_fail_before_converting() {
        let options = ConversionOptions::builder()
            .css_framework(CssFramework::Custom)
            .build();
        assert!(matches!(
            convert(&[Block::new("core/paragraph")], options),
            Err(ConvertError::Options(_))
        ));
    }

    #[test]
    fn json_documents_accept_one_block_or_many() {
        let one = r#"{"blockName": "core/paragraph", "attrs": {}, "innerBlocks": [], "innerContent": ["<p>x</p>"]}"#;
        let many = format!("[{one}, {one}]");
        assert_eq!(
            convert_json(one, ConversionOptions::default()).unwrap().markup(),
            Some("<p>x</p>")
        );
        assert_eq!(
            convert_json(&many, ConversionOptions::default()).unwrap().markup(),
            Some("<p>x</p><p>x</p>")
        );
        assert!(matches!(
            convert_json("{not json", ConversionOptions::default()),
            Err(ConvertError::Json(_))
        ));
    }

    #[test]
    fn react_target_builds_nodes() {
        let options = ConversionOptions::builder()
            .output_target(OutputTarget::React)
            .css_framework(CssFramework::Tailwind)
            .build();
        let block = Block::new("core/paragraph").with_inner("<p>Hi</p>");
        let conversion = convert(&[block], options).unwrap();
        let nodes = conversion.nodes().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag(), Some("p"));
        assert!(nodes[0].attr("className").is_some());
        assert_eq!(nodes[0].text_content(), "Hi");
    }
}
