//! # SSR Optimization
//!
//! Rewrites converted markup for a fast first paint. The pass is split in two:
//!
//! 1. **Tree stage** (during conversion): every block is classified as
//!    critical or not by [`OptimizationContext::classify`], and its own media
//!    elements are deferred accordingly ([`OptimizationContext::rewrite_media`]).
//! 2. **Text stage** (per top-level fragment): duplicate styles are removed,
//!    external origins are collected for preconnect hints, and whitespace is
//!    collapsed ([`OptimizationContext::finish_fragment`]).
//!
//! Flags always apply in this order: classify, defer, lazy media, dedupe
//! styles, preconnect, minify.
//!
//! ## Above the Fold
//!
//! There is no layout information, so "above the fold" is approximated: a
//! block is critical when its depth is within `optimization_depth` and, with
//! `prioritize_above_the_fold`, while the pre-order budget of
//! `above_the_fold_budget` critical blocks lasts.
//!
//! ## Idempotence
//!
//! Every rewrite only adds attributes that are absent, drops second
//! occurrences, or collapses whitespace, so [`optimize_markup`] applied to its
//! own output returns it unchanged.

mod rewrite;

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::block::BlockPath;
use crate::error::OptionsError;

pub use rewrite::{MinifyState, collect_origins, minify, minify_fragment, remove_duplicate_styles};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    Minimal,
    #[default]
    Balanced,
    Maximum,
}

impl FromStr for OptimizationLevel {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Ok(OptimizationLevel::Minimal),
            "balanced" => Ok(OptimizationLevel::Balanced),
            "maximum" => Ok(OptimizationLevel::Maximum),
            _ => Err(OptionsError::UnknownOptimizationLevel(s.to_string())),
        }
    }
}

/// Concrete optimization switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsrFlags {
    /// Emit only critical blocks.
    pub critical_path_only: bool,
    /// Deepest nesting level (top level is 0) that can be critical.
    pub optimization_depth: usize,
    pub prioritize_above_the_fold: bool,
    /// Number of blocks, in document order, that fit above the fold.
    pub above_the_fold_budget: usize,
    pub defer_non_critical: bool,
    pub lazy_load_media: bool,
    pub preserve_first_image: bool,
    pub remove_duplicate_styles: bool,
    pub preconnect: bool,
    pub minify_output: bool,
}

impl OptimizationLevel {
    pub fn flags(self) -> SsrFlags {
        let minimal = SsrFlags {
            critical_path_only: false,
            optimization_depth: 2,
            prioritize_above_the_fold: false,
            above_the_fold_budget: 6,
            defer_non_critical: false,
            lazy_load_media: false,
            preserve_first_image: false,
            remove_duplicate_styles: true,
            preconnect: false,
            minify_output: true,
        };
        let balanced = SsrFlags {
            prioritize_above_the_fold: true,
            defer_non_critical: true,
            lazy_load_media: true,
            preserve_first_image: true,
            preconnect: true,
            ..minimal
        };
        match self {
            OptimizationLevel::Minimal => minimal,
            OptimizationLevel::Balanced => balanced,
            OptimizationLevel::Maximum => SsrFlags {
                optimization_depth: 1,
                above_the_fold_budget: 3,
                ..balanced
            },
        }
    }
}

impl Default for SsrFlags {
    fn default() -> Self {
        OptimizationLevel::default().flags()
    }
}

/// Either a level or an explicit flag set that replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsrOptions {
    Level(OptimizationLevel),
    Flags(SsrFlags),
}

impl Default for SsrOptions {
    fn default() -> Self {
        SsrOptions::Level(OptimizationLevel::default())
    }
}

impl SsrOptions {
    pub fn flags(&self) -> SsrFlags {
        match self {
            SsrOptions::Level(level) => level.flags(),
            SsrOptions::Flags(flags) => *flags,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HintRel {
    Preconnect,
}

/// A resource hint for the document head.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHint {
    pub rel: HintRel,
    pub href: String,
}

impl ResourceHint {
    pub fn preconnect(origin: impl Into<String>) -> Self {
        Self {
            rel: HintRel::Preconnect,
            href: origin.into(),
        }
    }

    pub fn to_markup(&self) -> String {
        let rel = match self.rel {
            HintRel::Preconnect => "preconnect",
        };
        format!(
            "<link rel=\"{rel}\" href=\"{}\">",
            html_escape::encode_double_quoted_attribute(&self.href)
        )
    }
}

/// Criticality of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    Critical,
    NonCritical,
}

impl Criticality {
    pub fn is_critical(self) -> bool {
        self == Criticality::Critical
    }
}

/// Per-conversion optimization state.
///
/// Carried across chunks so a chunked conversion makes exactly the decisions
/// a single pass would.
#[derive(Debug, Clone)]
pub struct OptimizationContext {
    flags: SsrFlags,
    budget_remaining: usize,
    first_image_kept: bool,
    seen_styles: HashSet<String>,
    seen_origins: HashSet<String>,
    minify_state: MinifyState,
}

impl OptimizationContext {
    pub fn new(flags: SsrFlags) -> Self {
        Self {
            flags,
            budget_remaining: flags.above_the_fold_budget,
            first_image_kept: false,
            seen_styles: HashSet::new(),
            seen_origins: HashSet::new(),
            minify_state: MinifyState::default(),
        }
    }

    pub fn flags(&self) -> &SsrFlags {
        &self.flags
    }

    /// Whether the above-the-fold budget is used up.
    pub fn fold_exhausted(&self) -> bool {
        self.flags.prioritize_above_the_fold && self.budget_remaining == 0
    }

    /// Classifies the next block in pre-order. Critical blocks consume budget.
    pub fn classify(&mut self, path: &BlockPath) -> Criticality {
        if path.depth() > self.flags.optimization_depth {
            return Criticality::NonCritical;
        }
        if !self.flags.prioritize_above_the_fold {
            return Criticality::Critical;
        }
        if self.budget_remaining == 0 {
            return Criticality::NonCritical;
        }
        self.budget_remaining -= 1;
        Criticality::Critical
    }

    /// Adds deferral attributes to the media elements of one block's own
    /// markup. The first image of the critical set stays eager.
    pub fn rewrite_media(&mut self, html: &str, criticality: Criticality) -> String {
        rewrite::rewrite_media(html, &self.flags, criticality, &mut self.first_image_kept)
    }

    /// Text stage for one top-level fragment: dedupe styles, collect
    /// preconnect origins, minify.
    pub fn finish_fragment(&mut self, html: String) -> (String, Vec<ResourceHint>) {
        let html = if self.flags.remove_duplicate_styles {
            remove_duplicate_styles(&html, &mut self.seen_styles)
        } else {
            html
        };
        let hints = if self.flags.preconnect {
            collect_origins(&html, &mut self.seen_origins)
                .into_iter()
                .map(ResourceHint::preconnect)
                .collect()
        } else {
            vec![]
        };
        let html = if self.flags.minify_output {
            minify_fragment(&html, &mut self.minify_state)
        } else {
            html
        };
        (html, hints)
    }
}

/// One-shot text pass over complete markup, treating everything as critical.
pub fn optimize_markup(html: &str, flags: &SsrFlags) -> String {
    let mut cx = OptimizationContext::new(*flags);
    let html = if flags.lazy_load_media {
        cx.rewrite_media(html, Criticality::Critical)
    } else {
        html.to_string()
    };
    cx.finish_fragment(html).0
}

/// Preconnect hints for every external origin referenced by `html`.
pub fn resource_hints(html: &str) -> Vec<ResourceHint> {
    collect_origins(html, &mut HashSet::new())
        .into_iter()
        .map(ResourceHint::preconnect)
        .collect()
}
