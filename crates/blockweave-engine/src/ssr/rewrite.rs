//! Token-level rewrites used by the SSR pass.
//!
//! All rewrites splice edited tokens into the original text; tokens that are
//! not edited keep their exact bytes.

use std::collections::HashSet;
use std::sync::OnceLock;

use blockweave_markup::{StartTag, Token, TokenKind, is_block_level_element, lex, tag_name};
use regex::Regex;

use super::{Criticality, SsrFlags};

/// Elements whose whitespace and comments are significant.
const PRESERVE_ELEMENTS: [&str; 2] = ["pre", "textarea"];

fn is_preserving(name: &str) -> bool {
    PRESERVE_ELEMENTS.iter().any(|p| p.eq_ignore_ascii_case(name))
}

pub(super) fn rewrite_media(
    html: &str,
    flags: &SsrFlags,
    criticality: Criticality,
    first_image_kept: &mut bool,
) -> String {
    let deferred = flags.lazy_load_media || (flags.defer_non_critical && !criticality.is_critical());
    let mut out = String::with_capacity(html.len() + 32);

    for token in lex(html) {
        if token.kind != TokenKind::StartTag {
            out.push_str(token.text);
            continue;
        }
        let Some(mut tag) = StartTag::parse(token.text) else {
            out.push_str(token.text);
            continue;
        };

        let changed = match tag.name.as_str() {
            "img" => {
                if criticality.is_critical() && !*first_image_kept {
                    *first_image_kept = true;
                    if flags.preserve_first_image {
                        out.push_str(token.text);
                        continue;
                    }
                }
                deferred
                    && (tag.set_attr_if_absent("loading", "lazy")
                        | tag.set_attr_if_absent("decoding", "async"))
            }
            "iframe" => deferred && tag.set_attr_if_absent("loading", "lazy"),
            "video" | "audio" => deferred && tag.set_attr_if_absent("preload", "none"),
            _ => false,
        };

        if changed {
            out.push_str(&tag.to_string());
        } else {
            out.push_str(token.text);
        }
    }
    out
}

/// Drops repeated `<style>` elements and stylesheet links, and duplicate
/// tokens inside `class` and `style` attributes. First occurrences win.
///
/// `seen` holds style keys already emitted, so dedupe can span fragments.
pub fn remove_duplicate_styles(html: &str, seen: &mut HashSet<String>) -> String {
    let tokens = lex(html);
    let mut out = String::with_capacity(html.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        i += 1;
        if token.kind != TokenKind::StartTag {
            out.push_str(token.text);
            continue;
        }
        let Some(mut tag) = StartTag::parse(token.text) else {
            out.push_str(token.text);
            continue;
        };

        if tag.name == "style" {
            let end = style_element_end(&tokens, i);
            let body = tokens[i..end]
                .iter()
                .filter(|t| t.kind == TokenKind::RawText)
                .map(|t| t.text.trim())
                .collect::<String>();
            let key = format!("style|{}|{}", tag.attr("media").unwrap_or(""), body);
            if !seen.insert(key) {
                i = end;
                continue;
            }
            out.push_str(token.text);
            continue;
        }

        if tag.name == "link"
            && tag
                .attr("rel")
                .is_some_and(|r| r.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case("stylesheet")))
            && let Some(href) = tag.attr("href")
        {
            let key = format!("link|{href}");
            if !seen.insert(key) {
                continue;
            }
            out.push_str(token.text);
            continue;
        }

        let classes_changed = dedupe_attr(&mut tag, "class", ' ');
        let style_changed = dedupe_attr(&mut tag, "style", ';');
        if classes_changed || style_changed {
            out.push_str(&tag.to_string());
        } else {
            out.push_str(token.text);
        }
    }
    out
}

/// Index just past the `</style>` closing the element that starts before `from`.
fn style_element_end(tokens: &[Token<'_>], from: usize) -> usize {
    let mut j = from;
    if tokens.get(j).is_some_and(|t| t.kind == TokenKind::RawText) {
        j += 1;
    }
    if tokens
        .get(j)
        .is_some_and(|t| t.kind == TokenKind::EndTag && tag_name(t.text).eq_ignore_ascii_case("style"))
    {
        j += 1;
    }
    j
}

fn dedupe_attr(tag: &mut StartTag, name: &str, separator: char) -> bool {
    let Some(value) = tag.attr(name) else {
        return false;
    };
    let parts: Vec<&str> = if separator == ' ' {
        value.split_ascii_whitespace().collect()
    } else {
        split_declarations(value)
    };
    let mut unique: Vec<&str> = Vec::with_capacity(parts.len());
    for part in &parts {
        if !unique.contains(part) {
            unique.push(part);
        }
    }
    if unique.len() == parts.len() {
        return false;
    }
    let joined = if separator == ' ' {
        unique.join(" ")
    } else {
        unique.join("; ")
    };
    tag.set_attr(name, &joined);
    true
}

/// Splits a `style` value on top-level `;`. Semicolons inside parentheses
/// (`url(data:...;base64,...)`) or quotes belong to the declaration.
fn split_declarations(style: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&style[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Elements whose `src`, `srcset` and `poster` load a resource.
const MEDIA_ELEMENTS: [&str; 7] = ["img", "source", "video", "audio", "iframe", "embed", "track"];

/// `<link rel>` values whose `href` is fetched by the page.
const FETCHED_LINK_RELS: [&str; 3] = ["stylesheet", "preload", "modulepreload"];

fn origin_regex() -> &'static Regex {
    static ORIGIN_REGEX: OnceLock<Regex> = OnceLock::new();
    ORIGIN_REGEX.get_or_init(|| {
        Regex::new(r"^(?i)(https?://[^/?#\s]+)").expect("Invalid origin regex")
    })
}

/// Attribute values of `tag` that the browser fetches while loading the page.
/// Navigation targets (`<a href>`, `<form action>`) are not resources.
fn resource_urls<'t>(tag: &'t StartTag) -> Vec<&'t str> {
    let mut urls = Vec::new();
    match tag.name.as_str() {
        name if MEDIA_ELEMENTS.contains(&name) => {
            urls.extend(["src", "poster"].into_iter().filter_map(|a| tag.attr(a)));
            if let Some(srcset) = tag.attr("srcset") {
                urls.extend(
                    srcset
                        .split(',')
                        .filter_map(|candidate| candidate.split_ascii_whitespace().next()),
                );
            }
        }
        "script" => urls.extend(tag.attr("src")),
        "link" => {
            let fetched = tag.attr("rel").is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|t| FETCHED_LINK_RELS.iter().any(|r| r.eq_ignore_ascii_case(t)))
            });
            if fetched {
                urls.extend(tag.attr("href"));
            }
        }
        _ => {}
    }
    urls
}

/// External origins of the resources `html` loads (media, scripts and
/// stylesheets), in order of first appearance, skipping any already in `seen`.
pub fn collect_origins(html: &str, seen: &mut HashSet<String>) -> Vec<String> {
    let mut found = Vec::new();
    for token in lex(html) {
        if token.kind != TokenKind::StartTag {
            continue;
        }
        let Some(tag) = StartTag::parse(token.text) else {
            continue;
        };
        for url in resource_urls(&tag) {
            if let Some(m) = origin_regex().captures(url.trim()).and_then(|c| c.get(1)) {
                let origin = m.as_str().to_ascii_lowercase();
                if seen.insert(origin.clone()) {
                    found.push(origin);
                }
            }
        }
    }
    found
}

struct Piece<'a> {
    kind: TokenKind,
    text: &'a str,
    preserved: bool,
}

fn is_block_boundary(piece: Option<&Piece<'_>>) -> bool {
    match piece {
        None => true,
        Some(p) => match p.kind {
            TokenKind::Declaration => true,
            TokenKind::StartTag | TokenKind::EndTag => is_block_level_element(tag_name(p.text)),
            _ => false,
        },
    }
}

/// Whitespace context carried from one fragment to the next, so that
/// minifying a document fragment by fragment gives the same bytes as
/// minifying it whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinifyState {
    /// Output so far ends in inline content.
    after_inline: bool,
    /// Trailing whitespace withheld until the next fragment shows whether it
    /// starts inline.
    pending_space: bool,
}

/// Collapses insignificant whitespace and drops comments.
///
/// Whitespace runs become one space, or nothing next to block-level tags and
/// at the document edges. Content of `<pre>`, `<textarea>`, `<script>` and
/// `<style>` is never touched. Conditional comments are kept.
pub fn minify(html: &str) -> String {
    minify_fragment(html, &mut MinifyState::default())
}

/// [`minify`] for one fragment of a longer document. Whitespace at the
/// fragment edges is resolved against `state` instead of being dropped.
pub fn minify_fragment(html: &str, state: &mut MinifyState) -> String {
    let mut pieces: Vec<Piece<'_>> = Vec::new();
    let mut preserve_depth = 0usize;

    for token in lex(html) {
        let mut preserved = preserve_depth > 0;
        match token.kind {
            TokenKind::StartTag
                if is_preserving(tag_name(token.text))
                    && !StartTag::parse(token.text).is_some_and(|t| t.self_closing) =>
            {
                preserve_depth += 1;
            }
            TokenKind::EndTag if is_preserving(tag_name(token.text)) => {
                preserve_depth = preserve_depth.saturating_sub(1);
                preserved = preserve_depth > 0;
            }
            TokenKind::Comment if !preserved && !token.text.starts_with("<!--[if") => continue,
            TokenKind::Whitespace if !preserved => {
                if pieces
                    .last()
                    .is_some_and(|p| p.kind == TokenKind::Whitespace && !p.preserved)
                {
                    continue;
                }
            }
            _ => {}
        }
        pieces.push(Piece {
            kind: token.kind,
            text: token.text,
            preserved,
        });
    }

    let collapsible = |p: &Piece<'_>| p.kind == TokenKind::Whitespace && !p.preserved;
    let mut out = String::with_capacity(html.len());

    // Whitespace withheld by the previous fragment, plus any this one starts with.
    let leading = pieces.first().is_some_and(|p| collapsible(p));
    let first_content = pieces.iter().position(|p| !collapsible(p));
    match first_content {
        None => {
            state.pending_space |= leading && state.after_inline;
            return out;
        }
        Some(i) => {
            let space = (state.pending_space || leading) && state.after_inline;
            if space && !is_block_boundary(pieces.get(i)) {
                out.push(' ');
            }
            state.pending_space = false;
        }
    }

    for (i, piece) in pieces.iter().enumerate() {
        if !collapsible(piece) {
            out.push_str(piece.text);
            continue;
        }
        let Some(prev) = i.checked_sub(1).and_then(|p| pieces.get(p)) else {
            continue;
        };
        let next = pieces.get(i + 1);
        if is_block_boundary(Some(prev)) {
            continue;
        }
        match next {
            None => state.pending_space = true,
            Some(next) if is_block_boundary(Some(next)) => {}
            Some(_) => out.push(' '),
        }
    }

    if let Some(last) = pieces.iter().rev().find(|p| !collapsible(p)) {
        state.after_inline = !is_block_boundary(Some(last));
    }
    out
}
