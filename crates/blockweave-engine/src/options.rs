//! Conversion options.
//!
//! Options are immutable once built. Every option has a default, so
//! `ConversionOptions::default()` converts to plain markup with no framework
//! classes, template content and no SSR pass.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classes::ClassMap;
use crate::error::OptionsError;
use crate::registry::BlockHandler;
use crate::ssr::{SsrFlags, SsrOptions};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    #[default]
    Markup,
    React,
    Vue,
    Svelte,
}

impl FromStr for OutputTarget {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markup" | "html" => Ok(OutputTarget::Markup),
            "react" => Ok(OutputTarget::React),
            "vue" => Ok(OutputTarget::Vue),
            "svelte" => Ok(OutputTarget::Svelte),
            _ => Err(OptionsError::UnknownOutputTarget(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CssFramework {
    #[default]
    None,
    Tailwind,
    Bootstrap,
    Custom,
}

impl FromStr for CssFramework {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CssFramework::None),
            "tailwind" => Ok(CssFramework::Tailwind),
            "bootstrap" => Ok(CssFramework::Bootstrap),
            "custom" => Ok(CssFramework::Custom),
            _ => Err(OptionsError::UnknownFramework(s.to_string())),
        }
    }
}

/// Where a block's markup comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentHandling {
    /// Always rebuild from `innerContent` and converted children.
    #[default]
    Raw,
    /// Reuse `renderedHtml` whenever present.
    Rendered,
    /// Reuse `renderedHtml` for leaves, rebuild containers.
    Hybrid,
}

impl FromStr for ContentHandling {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(ContentHandling::Raw),
            "rendered" => Ok(ContentHandling::Rendered),
            "hybrid" => Ok(ContentHandling::Hybrid),
            _ => Err(OptionsError::UnknownContentHandling(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingOptions {
    /// Top-level blocks per chunk.
    pub chunk_size: usize,
    /// Completed chunks held before the producer pauses.
    pub max_buffered_chunks: usize,
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 64,
            max_buffered_chunks: 2,
        }
    }
}

/// Caller-supplied text rewrite run around the SSR pass.
pub type TextHook = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub const DEFAULT_INTERACTIVE_BLOCKS: [&str; 4] =
    ["core/search", "core/navigation", "core/details", "core/file"];

#[derive(Clone)]
pub struct ConversionOptions {
    pub output_target: OutputTarget,
    pub css_framework: CssFramework,
    pub custom_class_map: Option<ClassMap>,
    /// Per-name handlers that take precedence over the registry.
    pub block_transformers: BTreeMap<String, Arc<dyn BlockHandler>>,
    pub content_handling: ContentHandling,
    pub ssr: bool,
    pub ssr_options: SsrOptions,
    pub streaming: StreamingOptions,
    /// Blocks whose root element gets hydration markers.
    pub interactive_blocks: Vec<String>,
    pub pre_optimize_hook: Option<TextHook>,
    pub post_optimize_hook: Option<TextHook>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            output_target: OutputTarget::default(),
            css_framework: CssFramework::default(),
            custom_class_map: None,
            block_transformers: BTreeMap::new(),
            content_handling: ContentHandling::default(),
            ssr: false,
            ssr_options: SsrOptions::default(),
            streaming: StreamingOptions::default(),
            interactive_blocks: DEFAULT_INTERACTIVE_BLOCKS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pre_optimize_hook: None,
            post_optimize_hook: None,
        }
    }
}

impl fmt::Debug for ConversionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionOptions")
            .field("output_target", &self.output_target)
            .field("css_framework", &self.css_framework)
            .field("custom_class_map", &self.custom_class_map)
            .field(
                "block_transformers",
                &self.block_transformers.keys().collect::<Vec<_>>(),
            )
            .field("content_handling", &self.content_handling)
            .field("ssr", &self.ssr)
            .field("ssr_options", &self.ssr_options)
            .field("streaming", &self.streaming)
            .field("interactive_blocks", &self.interactive_blocks)
            .field("pre_optimize_hook", &self.pre_optimize_hook.is_some())
            .field("post_optimize_hook", &self.post_optimize_hook.is_some())
            .finish()
    }
}

impl ConversionOptions {
    pub fn builder() -> ConversionOptionsBuilder {
        ConversionOptionsBuilder::default()
    }

    /// Rejects option combinations that cannot produce any sensible output.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.streaming.chunk_size == 0 {
            return Err(OptionsError::ZeroLimit("chunk size"));
        }
        if self.streaming.max_buffered_chunks == 0 {
            return Err(OptionsError::ZeroLimit("buffered chunk limit"));
        }
        if self.css_framework == CssFramework::Custom && self.custom_class_map.is_none() {
            return Err(OptionsError::MissingCustomClassMap);
        }
        Ok(())
    }

    /// Effective SSR flags, `None` when the pass is disabled.
    pub fn ssr_flags(&self) -> Option<SsrFlags> {
        self.ssr.then(|| self.ssr_options.flags())
    }

    pub fn is_interactive(&self, block_name: &str) -> bool {
        self.interactive_blocks.iter().any(|n| n == block_name)
    }
}

#[derive(Default)]
pub struct ConversionOptionsBuilder {
    options: ConversionOptions,
}

impl ConversionOptionsBuilder {
    pub fn output_target(mut self, target: OutputTarget) -> Self {
        self.options.output_target = target;
        self
    }

    pub fn css_framework(mut self, framework: CssFramework) -> Self {
        self.options.css_framework = framework;
        self
    }

    pub fn custom_class_map(mut self, map: ClassMap) -> Self {
        self.options.custom_class_map = Some(map);
        self
    }

    pub fn block_transformer(
        mut self,
        name: impl Into<String>,
        handler: impl BlockHandler + 'static,
    ) -> Self {
        self.options
            .block_transformers
            .insert(name.into(), Arc::new(handler));
        self
    }

    pub fn content_handling(mut self, mode: ContentHandling) -> Self {
        self.options.content_handling = mode;
        self
    }

    pub fn ssr(mut self, enabled: bool) -> Self {
        self.options.ssr = enabled;
        self
    }

    pub fn ssr_options(mut self, ssr_options: SsrOptions) -> Self {
        self.options.ssr_options = ssr_options;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.options.streaming.chunk_size = chunk_size;
        self
    }

    pub fn max_buffered_chunks(mut self, limit: usize) -> Self {
        self.options.streaming.max_buffered_chunks = limit;
        self
    }

    pub fn streaming(mut self, streaming: StreamingOptions) -> Self {
        self.options.streaming = streaming;
        self
    }

    pub fn interactive_blocks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.interactive_blocks = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn pre_optimize_hook(
        mut self,
        hook: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.options.pre_optimize_hook = Some(Arc::new(hook));
        self
    }

    pub fn post_optimize_hook(
        mut self,
        hook: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.options.post_optimize_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> ConversionOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssr::OptimizationLevel;
    use rstest::rstest;

    #[rstest]
    #[case("none", CssFramework::None)]
    #[case("Tailwind", CssFramework::Tailwind)]
    #[case("bootstrap", CssFramework::Bootstrap)]
    #[case("custom", CssFramework::Custom)]
    fn framework_names(#[case] name: &str, #[case] expected: CssFramework) {
        assert_eq!(name.parse::<CssFramework>(), Ok(expected));
    }

    #[test]
    fn unknown_names_are_errors() {
        assert_eq!(
            "bulma".parse::<CssFramework>(),
            Err(OptionsError::UnknownFramework("bulma".into()))
        );
        assert_eq!(
            "angular".parse::<OutputTarget>(),
            Err(OptionsError::UnknownOutputTarget("angular".into()))
        );
        assert_eq!(
            "cached".parse::<ContentHandling>(),
            Err(OptionsError::UnknownContentHandling("cached".into()))
        );
    }

    #[test]
    fn defaults() {
        let options = ConversionOptions::default();
        assert_eq!(options.output_target, OutputTarget::Markup);
        assert_eq!(options.css_framework, CssFramework::None);
        assert_eq!(options.content_handling, ContentHandling::Raw);
        assert!(!options.ssr);
        assert_eq!(options.ssr_flags(), None);
        assert!(options.is_interactive("core/search"));
        assert!(options.validate().is_ok());
    }

    #[rstest]
    #[case(ConversionOptions::builder().chunk_size(0).build(), OptionsError::ZeroLimit("chunk size"))]
    #[case(
        ConversionOptions::builder().max_buffered_chunks(0).build(),
        OptionsError::ZeroLimit("buffered chunk limit")
    )]
    #[case(
        ConversionOptions::builder().css_framework(CssFramework::Custom).build(),
        OptionsError::MissingCustomClassMap
    )]
    fn invalid_options(#[case] options: ConversionOptions, #[case] expected: OptionsError) {
        assert_eq!(options.validate(), Err(expected));
    }

    #[test]
    fn ssr_flags_follow_level() {
        let options = ConversionOptions::builder()
            .ssr(true)
            .ssr_options(SsrOptions::Level(OptimizationLevel::Minimal))
            .build();
        assert_eq!(options.ssr_flags(), Some(OptimizationLevel::Minimal.flags()));
    }

    #[test]
    fn streaming_options_deserialize_partially() {
        let streaming: StreamingOptions = serde_json::from_str(r#"{"chunkSize": 8}"#).unwrap();
        assert_eq!(streaming.chunk_size, 8);
        assert_eq!(streaming.max_buffered_chunks, 2);
    }
}
