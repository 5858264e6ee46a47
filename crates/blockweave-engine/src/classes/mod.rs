//! # Class Resolution
//!
//! Maps a block's identity and attributes to CSS classes for a framework.
//!
//! ## Sources and Precedence
//!
//! Classes come from two [`ClassMap`]s: the framework's built-in map and an
//! optional caller-supplied custom map. Each map has a `defaults` rule that
//! applies to every block and per-block rules keyed by block name.
//!
//! - **Base classes** accumulate: built-in base first, then custom base.
//! - **Attribute slots** conflict: every attribute name is a semantic slot
//!   (`align`, `textAlign`, `fontSize`, ...). For each slot the first source
//!   with an entry for the attribute's value wins, in this order: custom
//!   block rule, custom defaults, built-in block rule, built-in defaults.
//! - **Authored classes** (`className`) are appended last.
//!
//! The style variant chosen in the editor is authored as an `is-style-*`
//! class; it is exposed to class maps as the derived `styleVariant` slot.
//!
//! ## Determinism
//!
//! [`resolve_classes`] is a pure function of its arguments. It never looks at
//! siblings, ancestors or previous calls.

mod bootstrap;
mod tailwind;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::block::{AttrValue, Attributes};
use crate::options::CssFramework;

/// Value key matching any attribute value.
pub const ANY_VALUE: &str = "*";

/// Attribute name of the derived style-variant slot.
pub const STYLE_VARIANT_SLOT: &str = "styleVariant";

const STYLE_VARIANT_PREFIX: &str = "is-style-";

/// Classes for one block name (or for all blocks, as `defaults`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRule {
    #[serde(default)]
    pub base: Vec<String>,
    /// attribute name -> attribute value key -> classes
    #[serde(default)]
    pub attributes: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl ClassRule {
    pub fn new<S: AsRef<str>>(base: &[S]) -> Self {
        Self {
            base: base.iter().map(|s| s.as_ref().to_string()).collect(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds classes for `attribute == value` (`value` may be [`ANY_VALUE`]).
    pub fn on<S: AsRef<str>>(mut self, attribute: &str, value: &str, classes: &[S]) -> Self {
        self.attributes
            .entry(attribute.to_string())
            .or_default()
            .insert(
                value.to_string(),
                classes.iter().map(|s| s.as_ref().to_string()).collect(),
            );
        self
    }

    fn slot_classes(&self, slot: &str, key: &str) -> Option<Vec<String>> {
        let values = self.attributes.get(slot)?;
        if let Some(classes) = values.get(key) {
            return Some(classes.clone());
        }
        let template = values.get(ANY_VALUE)?;
        let safe = sanitize_class_value(key)?;
        Some(
            template
                .iter()
                .map(|class| class.replace("{value}", &safe))
                .collect(),
        )
    }

    fn is_empty(&self) -> bool {
        self.base.is_empty() && self.attributes.is_empty()
    }
}

/// A framework's class table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMap {
    #[serde(default)]
    pub defaults: ClassRule,
    #[serde(default)]
    pub blocks: BTreeMap<String, ClassRule>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, rule: ClassRule) -> Self {
        self.defaults = rule;
        self
    }

    pub fn with_block(mut self, name: &str, rule: ClassRule) -> Self {
        self.blocks.insert(name.to_string(), rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.blocks.is_empty()
    }

    /// Merges `other` into this map. `other` wins for a block's base and for
    /// each attribute value it defines; everything else is kept.
    pub fn merge(&mut self, other: ClassMap) {
        merge_rule(&mut self.defaults, other.defaults);
        for (name, rule) in other.blocks {
            merge_rule(self.blocks.entry(name).or_default(), rule);
        }
    }

    fn base_for(&self, block_name: &str) -> &[String] {
        match self.blocks.get(block_name) {
            Some(rule) => &rule.base,
            None => &self.defaults.base,
        }
    }

    fn slot_names<'a>(&'a self, block_name: &str, out: &mut Vec<&'a str>) {
        let block = self.blocks.get(block_name).into_iter();
        for rule in block.chain(std::iter::once(&self.defaults)) {
            for slot in rule.attributes.keys() {
                if !out.contains(&slot.as_str()) {
                    out.push(slot);
                }
            }
        }
    }
}

fn merge_rule(into: &mut ClassRule, from: ClassRule) {
    if !from.base.is_empty() {
        into.base = from.base;
    }
    for (slot, values) in from.attributes {
        into.attributes.entry(slot).or_default().extend(values);
    }
}

/// Only `[A-Za-z0-9_-]` values may be spliced into class templates.
fn sanitize_class_value(value: &str) -> Option<String> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    ok.then(|| value.to_string())
}

/// Built-in map for a framework; `None` for [`CssFramework::None`] and
/// [`CssFramework::Custom`].
pub fn builtin_map(framework: CssFramework) -> Option<&'static ClassMap> {
    static TAILWIND: OnceLock<ClassMap> = OnceLock::new();
    static BOOTSTRAP: OnceLock<ClassMap> = OnceLock::new();
    match framework {
        CssFramework::Tailwind => Some(TAILWIND.get_or_init(tailwind::class_map)),
        CssFramework::Bootstrap => Some(BOOTSTRAP.get_or_init(bootstrap::class_map)),
        CssFramework::None | CssFramework::Custom => None,
    }
}

/// Resolves the ordered class list for a block.
///
/// With [`CssFramework::None`] the authored classes are returned verbatim.
pub fn resolve_classes(
    block_name: &str,
    attributes: &Attributes,
    framework: CssFramework,
    custom: Option<&ClassMap>,
) -> Vec<String> {
    let authored = authored_classes(attributes);
    if framework == CssFramework::None {
        return authored.into_iter().map(str::to_string).collect();
    }

    let builtin = builtin_map(framework);
    let mut classes: Vec<String> = Vec::new();

    for map in [builtin, custom].into_iter().flatten() {
        classes.extend(map.base_for(block_name).iter().cloned());
    }

    // Custom sources first: they take precedence per slot.
    let sources: Vec<&ClassRule> = [custom, builtin]
        .into_iter()
        .flatten()
        .flat_map(|map| {
            map.blocks
                .get(block_name)
                .into_iter()
                .chain(std::iter::once(&map.defaults))
        })
        .collect();

    let mut slots: Vec<&str> = Vec::new();
    for map in [builtin, custom].into_iter().flatten() {
        map.slot_names(block_name, &mut slots);
    }
    slots.sort_unstable();

    let variant = style_variant(&authored);
    for slot in slots {
        let key = if slot == STYLE_VARIANT_SLOT {
            variant.map(str::to_string)
        } else {
            attributes.get(slot).and_then(AttrValue::class_key)
        };
        let Some(key) = key else { continue };
        if let Some(found) = sources.iter().find_map(|rule| rule.slot_classes(slot, &key)) {
            classes.extend(found);
        }
    }

    classes.extend(authored.into_iter().map(str::to_string));
    dedupe(classes)
}

fn authored_classes(attributes: &Attributes) -> Vec<&str> {
    match attributes.get("className") {
        Some(AttrValue::String(s)) => s.split_ascii_whitespace().collect(),
        _ => vec![],
    }
}

fn style_variant<'a>(authored: &[&'a str]) -> Option<&'a str> {
    authored
        .iter()
        .find_map(|c| c.strip_prefix(STYLE_VARIANT_PREFIX))
        .filter(|v| !v.is_empty())
}

fn dedupe(classes: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(classes.len());
    for class in classes {
        if !class.is_empty() && !out.contains(&class) {
            out.push(class);
        }
    }
    out
}
