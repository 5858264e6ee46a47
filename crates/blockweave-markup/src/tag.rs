//! Start tag parsing and editing.
//!
//! A [`StartTag`] is an editable view of one `<name attr=value ...>` token.
//! Serializing an edited tag normalizes attribute quoting to double quotes;
//! callers that must stay byte-identical only serialize when something
//! actually changed (see [`rewrite_first_start_tag`]).

use std::fmt;

use crate::lexer::{TokenKind, lex};

/// A single attribute. `value` is `None` for bare attributes like `hidden`.
///
/// Values are kept exactly as written (entities are not decoded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// Parsed opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

impl StartTag {
    /// Parses a start tag token such as `<img src="a.png" alt='x' hidden />`.
    ///
    /// Returns `None` when `text` is not a start tag.
    pub fn parse(text: &str) -> Option<Self> {
        let inner = text.strip_prefix('<')?.strip_suffix('>')?;

        let name_end = inner
            .find(|c: char| c.is_ascii_whitespace() || c == '/')
            .unwrap_or(inner.len());
        let name = &inner[..name_end];
        if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }

        let (attributes, self_closing) = parse_attributes(&inner[name_end..]);
        Some(Self {
            name: name.to_ascii_lowercase(),
            attributes,
            self_closing,
        })
    }

    /// Value of the first attribute named `name` (ASCII case-insensitive).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Sets (or replaces) an attribute value.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => attr.value = Some(value.to_string()),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: Some(value.to_string()),
            }),
        }
    }

    /// Adds an attribute only when absent. Returns true when the tag changed.
    pub fn set_attr_if_absent(&mut self, name: &str, value: &str) -> bool {
        if self.has_attr(name) {
            return false;
        }
        self.set_attr(name, value);
        true
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attributes
            .retain(|a| !a.name.eq_ignore_ascii_case(name));
    }

    /// Class tokens in order of appearance.
    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Appends classes not yet present. Returns true when the tag changed.
    pub fn add_classes<S: AsRef<str>>(&mut self, classes: &[S]) -> bool {
        let mut merged: Vec<String> = self.classes().iter().map(|c| c.to_string()).collect();
        let before = merged.len();
        for class in classes {
            let class = class.as_ref();
            if !class.is_empty() && !merged.iter().any(|c| c == class) {
                merged.push(class.to_string());
            }
        }
        if merged.len() == before {
            return false;
        }
        self.set_attr("class", &merged.join(" "));
        true
    }

    pub fn is_void(&self) -> bool {
        is_void_element(&self.name)
    }
}

impl fmt::Display for StartTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for attr in &self.attributes {
            match &attr.value {
                Some(v) => write!(f, " {}=\"{}\"", attr.name, v.replace('"', "&quot;"))?,
                None => write!(f, " {}", attr.name)?,
            }
        }
        if self.self_closing {
            f.write_str(" /")?;
        }
        f.write_str(">")
    }
}

/// Parses the attribute list after the tag name. The flag is true when the
/// list ends in a `/` that is not part of an unquoted value (`<br/>`, but
/// not `<a href=/docs/>`).
fn parse_attributes(s: &str) -> (Vec<Attribute>, bool) {
    let bytes = s.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;
    let mut self_closing = false;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            self_closing = bytes[i] == b'/';
            i += 1;
        }
        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'/' | b'>')
        {
            i += 1;
        }
        if name_start == i {
            break;
        }
        self_closing = false;
        let name = s[name_start..i].to_string();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'=' {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let value = match bytes.get(j) {
                Some(&q @ (b'"' | b'\'')) => {
                    let start = j + 1;
                    let end = s[start..]
                        .find(q as char)
                        .map_or(s.len(), |k| start + k);
                    i = (end + 1).min(s.len());
                    s[start..end].to_string()
                }
                _ => {
                    let start = j;
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    i = j;
                    s[start..j].to_string()
                }
            };
            attrs.push(Attribute {
                name,
                value: Some(value),
            });
        } else {
            attrs.push(Attribute { name, value: None });
        }
    }

    (attrs, self_closing)
}

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

const BLOCK_LEVEL_ELEMENTS: [&str; 43] = [
    "address", "article", "aside", "blockquote", "body", "br", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "head", "header", "hr", "html", "li", "link", "main", "meta", "nav", "ol", "p",
    "pre", "section", "summary", "table", "tbody", "td", "th", "tr", "ul",
];

/// Elements whose surrounding whitespace never renders.
pub fn is_block_level_element(name: &str) -> bool {
    BLOCK_LEVEL_ELEMENTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(name))
}

/// Applies `edit` to the first start tag in `html`.
///
/// `edit` returns whether it changed the tag; the input is returned untouched
/// when it did not, or when `html` contains no start tag.
pub fn rewrite_first_start_tag(html: &str, edit: impl FnOnce(&mut StartTag) -> bool) -> String {
    let mut offset = 0;
    for token in lex(html) {
        if token.kind == TokenKind::StartTag
            && let Some(mut tag) = StartTag::parse(token.text)
        {
            if !edit(&mut tag) {
                return html.to_string();
            }
            let mut out = String::with_capacity(html.len() + 32);
            out.push_str(&html[..offset]);
            out.push_str(&tag.to_string());
            out.push_str(&html[offset + token.text.len()..]);
            return out;
        }
        offset += token.text.len();
    }
    html.to_string()
}
