//! # Block Handler Registry
//!
//! Maps block names to [`BlockHandler`]s. Lookups never fail: unregistered
//! names resolve to a fallback handler that passes the block's reconciled
//! content through unchanged, so unknown block types still render.
//!
//! A registry is built up front and handed to a
//! [`Converter`](crate::Converter) behind an `Arc`. Conversions only read it.
//!
//! ```
//! use blockweave_engine::{HandlerRegistry, handler_fn};
//!
//! let mut registry = HandlerRegistry::with_builtins();
//! registry.register("acme/hello", handler_fn(|_, _| Ok("<p>hello</p>".to_string())));
//! assert!(registry.contains("acme/hello"));
//! assert!(!registry.contains("acme/unknown"));
//! ```

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::block::{Block, BlockPath};
use crate::error::HandlerError;
use crate::options::ConversionOptions;
use crate::reconcile::ContentSource;

/// Renders one block.
///
/// Handlers are called after the block's content has been reconciled and its
/// children converted; both are available through the [`HandlerContext`].
pub trait BlockHandler: Send + Sync {
    fn render(&self, block: &Block, cx: &HandlerContext<'_>) -> Result<String, HandlerError>;

    /// Whether this block needs hydration markers.
    fn is_interactive(&self, _block: &Block) -> bool {
        false
    }
}

impl<F> BlockHandler for F
where
    F: Fn(&Block, &HandlerContext<'_>) -> Result<String, HandlerError> + Send + Sync,
{
    fn render(&self, block: &Block, cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
        self(block, cx)
    }
}

/// Pins a closure to the handler signature so its argument and return types
/// can be inferred.
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&Block, &HandlerContext<'_>) -> Result<String, HandlerError> + Send + Sync,
{
    f
}

/// What a handler sees of the conversion in progress.
#[derive(Debug)]
pub struct HandlerContext<'a> {
    /// Reconciled markup: the rendered HTML, or the template with children
    /// substituted.
    pub content: &'a str,
    pub source: ContentSource,
    /// Converted children, in order. Empty when the content came from
    /// rendered HTML.
    pub children: &'a [String],
    pub options: &'a ConversionOptions,
    pub path: &'a BlockPath,
}

impl HandlerContext<'_> {
    /// Nesting depth, zero for top-level blocks.
    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    /// True when the reconciled content carries any markup of its own,
    /// beyond whitespace and child output.
    pub fn has_markup(&self) -> bool {
        match self.source {
            ContentSource::Rendered => !self.content.trim().is_empty(),
            ContentSource::Template => !self.is_only_children(),
        }
    }

    fn is_only_children(&self) -> bool {
        let mut rest = self.content;
        for child in self.children {
            rest = rest.trim_start();
            match rest.strip_prefix(child.as_str()) {
                Some(r) => rest = r,
                None => return false,
            }
        }
        rest.trim().is_empty()
    }

    /// Concatenated child output.
    pub fn children_markup(&self) -> String {
        self.children.concat()
    }
}

/// Handler for names with no registration: returns the reconciled content.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackHandler;

impl BlockHandler for FallbackHandler {
    fn render(&self, _block: &Block, cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
        Ok(cx.content.to_string())
    }
}

pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn BlockHandler>>,
    fallback: Arc<dyn BlockHandler>,
}

impl HandlerRegistry {
    /// An empty registry. Every name resolves to the fallback handler.
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
            fallback: Arc::new(FallbackHandler),
        }
    }

    /// A registry seeded with handlers for the core block set.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Stores `handler` for `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, handler: impl BlockHandler + 'static) {
        self.register_arc(name, Arc::new(handler));
    }

    pub fn register_arc(&mut self, name: impl Into<String>, handler: Arc<dyn BlockHandler>) {
        let name = name.into();
        if self.handlers.insert(name.clone(), handler).is_some() {
            log::debug!("Replaced handler for {name}");
        }
    }

    /// The handler for `name`, or the fallback.
    pub fn resolve(&self, name: &str) -> &dyn BlockHandler {
        match self.handlers.get(name) {
            Some(handler) => handler.as_ref(),
            None => self.fallback.as_ref(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
