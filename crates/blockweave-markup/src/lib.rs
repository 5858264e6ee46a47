//! # blockweave-markup
//!
//! Markup plumbing shared by the blockweave conversion engine:
//!
//! - [`lexer`]: lossless [Logos]-based tokenizer for HTML fragments
//! - [`tag`]: parse, edit and re-serialize start tags
//! - [`tree`]: build framework-flavored node trees from markup
//!
//! [Logos]: https://docs.rs/logos
//!
//! The lexer never drops bytes, so passes that only touch a few tokens can
//! splice their edits into the original text and leave everything else
//! byte-identical.
//!
//! ```
//! use blockweave_markup::rewrite_first_start_tag;
//!
//! let html = rewrite_first_start_tag("<p>Hi</p>", |tag| tag.add_classes(&["lead"]));
//! assert_eq!(html, "<p class=\"lead\">Hi</p>");
//! ```

pub mod lexer;
pub mod tag;
pub mod tree;

pub use lexer::{Token, TokenKind, lex, lex_with_spans, tag_name};
pub use tag::{
    Attribute, StartTag, is_block_level_element, is_void_element, rewrite_first_start_tag,
};
pub use tree::{Node, NodeAttr, NodeAttrValue, NodeFlavor, parse_fragment};
