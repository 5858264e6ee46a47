//! Node trees for UI framework targets.
//!
//! Converts a markup fragment into a tree of [`Node`]s whose attribute naming
//! follows a target framework ([`NodeFlavor`]). Framework adapters turn these
//! trees into component invocations; this crate only builds them.
//!
//! Tree building is forgiving the way browsers are: unmatched end tags are
//! dropped and unclosed elements are closed at the end of the fragment.

use html_escape::decode_html_entities;

use crate::lexer::{TokenKind, lex, tag_name};
use crate::tag::StartTag;

/// Attribute naming convention of the node tree consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFlavor {
    /// JSX props: `className`, `htmlFor`, camelCase DOM properties, style object
    React,
    /// Template attributes kept as written
    Vue,
    /// Template attributes kept as written
    Svelte,
}

/// Attribute value on an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAttrValue {
    Text(String),
    /// Bare attribute such as `hidden`
    Flag,
    /// Style declarations as `(property, value)` pairs, React flavor only
    Style(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttr {
    pub name: String,
    pub value: NodeAttrValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element {
        tag: String,
        attrs: Vec<NodeAttr>,
        children: Vec<Node>,
    },
    Text(String),
    Comment(String),
}

impl Node {
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&NodeAttrValue> {
        match self {
            Node::Element { attrs, .. } => attrs.iter().find(|a| a.name == name).map(|a| &a.value),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Concatenated text content of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Comment(_) => String::new(),
            Node::Element { children, .. } => children.iter().map(Node::text_content).collect(),
        }
    }
}

struct Open {
    tag: String,
    attrs: Vec<NodeAttr>,
    children: Vec<Node>,
}

/// Parses a markup fragment into nodes.
pub fn parse_fragment(html: &str, flavor: NodeFlavor) -> Vec<Node> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Open> = Vec::new();

    fn push(stack: &mut [Open], root: &mut Vec<Node>, node: Node) {
        match stack.last_mut() {
            Some(open) => open.children.push(node),
            None => root.push(node),
        }
    }

    fn push_text(stack: &mut [Open], root: &mut Vec<Node>, text: &str) {
        let siblings = match stack.last_mut() {
            Some(open) => &mut open.children,
            None => root,
        };
        if let Some(Node::Text(prev)) = siblings.last_mut() {
            prev.push_str(text);
        } else {
            siblings.push(Node::Text(text.to_string()));
        }
    }

    for token in lex(html) {
        match token.kind {
            TokenKind::StartTag => {
                let Some(tag) = StartTag::parse(token.text) else {
                    push_text(&mut stack, &mut root, token.text);
                    continue;
                };
                let attrs = convert_attrs(&tag, flavor);
                if tag.self_closing || tag.is_void() {
                    push(
                        &mut stack,
                        &mut root,
                        Node::Element {
                            tag: tag.name,
                            attrs,
                            children: vec![],
                        },
                    );
                } else {
                    stack.push(Open {
                        tag: tag.name,
                        attrs,
                        children: vec![],
                    });
                }
            }
            TokenKind::EndTag => {
                let name = tag_name(token.text).to_ascii_lowercase();
                let Some(pos) = stack.iter().rposition(|o| o.tag == name) else {
                    continue;
                };
                while stack.len() > pos {
                    close_top(&mut stack, &mut root);
                }
            }
            TokenKind::Comment => {
                let body = token
                    .text
                    .trim_start_matches("<!--")
                    .trim_end_matches("-->");
                push(&mut stack, &mut root, Node::Comment(body.to_string()));
            }
            TokenKind::Declaration => {}
            TokenKind::Whitespace | TokenKind::Text | TokenKind::Lt => {
                push_text(&mut stack, &mut root, &decode_html_entities(token.text))
            }
            // Script and style bodies are not markup; entities stay literal.
            TokenKind::RawText => push_text(&mut stack, &mut root, token.text),
        }
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut root);
    }
    root
}

fn close_top(stack: &mut Vec<Open>, root: &mut Vec<Node>) {
    if let Some(open) = stack.pop() {
        let node = Node::Element {
            tag: open.tag,
            attrs: open.attrs,
            children: open.children,
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => root.push(node),
        }
    }
}

fn convert_attrs(tag: &StartTag, flavor: NodeFlavor) -> Vec<NodeAttr> {
    tag.attributes
        .iter()
        .map(|a| {
            let name = match flavor {
                NodeFlavor::React => react_prop_name(&a.name),
                NodeFlavor::Vue | NodeFlavor::Svelte => a.name.clone(),
            };
            let value = match (&a.value, flavor) {
                (None, _) => NodeAttrValue::Flag,
                (Some(v), NodeFlavor::React) if a.name.eq_ignore_ascii_case("style") => {
                    NodeAttrValue::Style(style::parse_style(&decode_html_entities(v)))
                }
                (Some(v), _) => NodeAttrValue::Text(decode_html_entities(v).into_owned()),
            };
            NodeAttr { name, value }
        })
        .collect()
}

const REACT_PROPS: [(&str, &str); 16] = [
    ("class", "className"),
    ("for", "htmlFor"),
    ("tabindex", "tabIndex"),
    ("readonly", "readOnly"),
    ("maxlength", "maxLength"),
    ("colspan", "colSpan"),
    ("rowspan", "rowSpan"),
    ("srcset", "srcSet"),
    ("crossorigin", "crossOrigin"),
    ("fetchpriority", "fetchPriority"),
    ("autoplay", "autoPlay"),
    ("playsinline", "playsInline"),
    ("allowfullscreen", "allowFullScreen"),
    ("frameborder", "frameBorder"),
    ("datetime", "dateTime"),
    ("contenteditable", "contentEditable"),
];

fn react_prop_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("data-") || lower.starts_with("aria-") {
        return lower;
    }
    REACT_PROPS
        .iter()
        .find(|(html, _)| *html == lower)
        .map_or(lower.clone(), |(_, prop)| prop.to_string())
}

/// Style attribute handling for the React flavor.
mod style {
    /// Splits `a-b: c; d: e` into camelCased `(aB, c)` pairs.
    /// Custom properties (`--x`) keep their name.
    pub fn parse_style(style: &str) -> Vec<(String, String)> {
        declarations(style)
            .into_iter()
            .filter_map(|decl| {
                let (prop, value) = decl.split_once(':')?;
                let prop = prop.trim();
                let value = value.trim();
                if prop.is_empty() || value.is_empty() {
                    return None;
                }
                Some((camel_case(prop), value.to_string()))
            })
            .collect()
    }

    /// Splits on `;` outside parentheses and quotes, so `url(data:...;...)`
    /// stays one declaration.
    fn declarations(style: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut depth = 0usize;
        let mut quote = None;
        let mut start = 0;
        for (i, c) in style.char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '(') => depth += 1,
                (None, ')') => depth = depth.saturating_sub(1),
                (None, ';') if depth == 0 => {
                    out.push(&style[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        out.push(&style[start..]);
        out
    }

    fn camel_case(prop: &str) -> String {
        if prop.starts_with("--") {
            return prop.to_string();
        }
        let mut out = String::with_capacity(prop.len());
        let mut upper = false;
        for c in prop.chars() {
            if c == '-' {
                upper = !out.is_empty();
            } else if upper {
                out.push(c.to_ascii_uppercase());
                upper = false;
            } else {
                out.push(c.to_ascii_lowercase());
            }
        }
        out
    }
}
