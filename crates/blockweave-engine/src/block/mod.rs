//! # Block Model
//!
//! A [`Block`] is one node of the serialized output of a block editor: a
//! namespaced name, an attribute bag, child blocks and a content template.
//!
//! ## The Content Template
//!
//! `inner_content` interleaves literal markup with `None` placeholders. Each
//! placeholder is filled, in order, by the next child in `inner_blocks`:
//!
//! ```text
//! inner_content: ["<div>", None, "<hr>", None, "</div>"]
//! inner_blocks:  [A, B]
//! assembled:     "<div>" + A + "<hr>" + B + "</div>"
//! ```
//!
//! The placeholder count must equal the child count; a block violating this
//! is malformed (see [`Block::validate`]).

pub mod value;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub use value::{AttrValue, ValueError, ValueKind};

pub type Attributes = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Namespaced block name, e.g. `core/paragraph`. Empty when missing.
    #[serde(default, alias = "blockName", deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, alias = "attrs", deserialize_with = "null_as_default")]
    pub attributes: Attributes,
    #[serde(default)]
    pub inner_blocks: Vec<Block>,
    #[serde(default)]
    pub inner_content: Vec<Option<String>>,
    /// Pre-rendered HTML from the origin system, if any.
    #[serde(default, alias = "rendered", skip_serializing_if = "Option::is_none")]
    pub rendered_html: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn null_as_default<'de, D: Deserializer<'de>>(d: D) -> Result<Attributes, D::Error> {
    Ok(Option::<Attributes>::deserialize(d)?.unwrap_or_default())
}

/// Why a block cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedBlock {
    #[error("block has no name")]
    MissingName,
    #[error("innerContent has {placeholders} placeholders but there are {children} innerBlocks")]
    PlaceholderMismatch { placeholders: usize, children: usize },
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Appends a literal fragment to the content template.
    pub fn with_inner(mut self, html: impl Into<String>) -> Self {
        self.inner_content.push(Some(html.into()));
        self
    }

    /// Appends a child and the placeholder it fills.
    pub fn with_child(mut self, child: Block) -> Self {
        self.inner_blocks.push(child);
        self.inner_content.push(None);
        self
    }

    pub fn with_rendered(mut self, html: impl Into<String>) -> Self {
        self.rendered_html = Some(html.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// String attribute, `None` when absent, error when present with another shape.
    pub fn str_attr(&self, key: &str) -> Result<Option<&str>, ValueError> {
        self.attr(key).map(AttrValue::as_str).transpose()
    }

    pub fn is_leaf(&self) -> bool {
        self.inner_blocks.is_empty()
    }

    pub fn placeholder_count(&self) -> usize {
        self.inner_content.iter().filter(|c| c.is_none()).count()
    }

    /// Checks this block's own shape. Children are validated when they are
    /// converted so that one bad child only blanks that child.
    pub fn validate(&self) -> Result<(), MalformedBlock> {
        if self.name.trim().is_empty() {
            return Err(MalformedBlock::MissingName);
        }
        let placeholders = self.placeholder_count();
        if placeholders != self.inner_blocks.len() {
            return Err(MalformedBlock::PlaceholderMismatch {
                placeholders,
                children: self.inner_blocks.len(),
            });
        }
        Ok(())
    }

    /// Authored extra classes from the `className` attribute.
    pub fn authored_classes(&self) -> Vec<&str> {
        match self.attr("className") {
            Some(AttrValue::String(s)) => s.split_ascii_whitespace().collect(),
            _ => vec![],
        }
    }
}

/// Either one block or a list, as found in a serialized document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BlockInput {
    Many(Vec<Block>),
    One(Box<Block>),
}

impl BlockInput {
    pub fn into_blocks(self) -> Vec<Block> {
        match self {
            BlockInput::Many(blocks) => blocks,
            BlockInput::One(block) => vec![*block],
        }
    }
}

/// Position of a block in the tree: the sibling index at each level, starting
/// with the top-level index.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockPath(Vec<usize>);

impl BlockPath {
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    /// Zero for top-level blocks.
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Index among siblings.
    pub fn index(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }

    pub fn top_level_index(&self) -> usize {
        self.0.first().copied().unwrap_or(0)
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{idx}")?;
        }
        Ok(())
    }
}
