//! # blockweave-engine
//!
//! Converts block trees, the serialized output of a block-based content
//! editor, into markup or framework node trees.
//!
//! ```
//! use blockweave_engine::{Block, ConversionOptions, CssFramework, convert};
//!
//! let block = Block::new("core/paragraph")
//!     .with_attr("align", "center")
//!     .with_inner("<p>Hello</p>");
//! let options = ConversionOptions::builder()
//!     .css_framework(CssFramework::Tailwind)
//!     .build();
//!
//! let conversion = convert(&[block], options).unwrap();
//! assert_eq!(conversion.markup(), Some("<p class=\"mb-4 text-center\">Hello</p>"));
//! ```
//!
//! The pieces, leaves first:
//!
//! - [`classes`]: framework class maps and [`resolve_classes`]
//! - [`registry`]: [`BlockHandler`]s by block name
//! - [`reconcile`]: rendered HTML versus content templates
//! - [`convert`](mod@convert): the tree walk
//! - [`ssr`]: first-paint optimization
//! - [`chunked`]: bounded-memory conversion of long documents

pub mod block;
pub mod chunked;
pub mod classes;
pub mod convert;
pub mod error;
pub mod options;
pub mod reconcile;
pub mod registry;
pub mod ssr;

pub use blockweave_markup::{Node, NodeAttr, NodeAttrValue};

pub use block::{AttrValue, Attributes, Block, BlockInput, BlockPath, MalformedBlock, ValueError};
pub use chunked::{Backpressure, CancelHandle, Chunk, ChunkedConversion};
pub use classes::{ClassMap, ClassRule, resolve_classes};
pub use convert::{Conversion, Converter, Output, block_id, convert, convert_json};
pub use error::{ConvertError, Diagnostic, DiagnosticKind, HandlerError, OptionsError};
pub use options::{
    ContentHandling, ConversionOptions, ConversionOptionsBuilder, CssFramework, OutputTarget,
    StreamingOptions, TextHook,
};
pub use reconcile::ContentSource;
pub use registry::{BlockHandler, FallbackHandler, HandlerContext, HandlerRegistry, handler_fn};
pub use ssr::{
    OptimizationLevel, ResourceHint, SsrFlags, SsrOptions, optimize_markup, resource_hints,
};
