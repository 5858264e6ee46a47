//! Handlers for the core block set.
//!
//! Blocks that arrive with markup (rendered HTML or a non-empty template) are
//! passed through; the handlers below only synthesize markup from attributes
//! when there is none.

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{BlockHandler, HandlerContext, HandlerRegistry};
use crate::block::{AttrValue, Block};
use crate::error::HandlerError;

type Synthesize = fn(&Block, &HandlerContext<'_>) -> Result<String, HandlerError>;

/// Passes existing markup through, otherwise synthesizes it.
struct Core {
    synthesize: Synthesize,
}

impl BlockHandler for Core {
    fn render(&self, block: &Block, cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
        if cx.has_markup() {
            return Ok(cx.content.to_string());
        }
        (self.synthesize)(block, cx)
    }
}

pub(super) fn register_all(registry: &mut HandlerRegistry) {
    let table: [(&str, Synthesize); 17] = [
        ("core/paragraph", paragraph),
        ("core/heading", heading),
        ("core/image", image),
        ("core/list", list),
        ("core/list-item", list_item),
        ("core/quote", quote),
        ("core/code", code),
        ("core/preformatted", preformatted),
        ("core/html", html),
        ("core/separator", separator),
        ("core/spacer", spacer),
        ("core/button", button),
        ("core/buttons", container),
        ("core/group", group),
        ("core/columns", container),
        ("core/column", container),
        ("core/embed", embed),
    ];
    for (name, synthesize) in table {
        registry.register(name, Core { synthesize });
    }
}

/// Rich text attribute, already markup in the editor's serialization.
fn rich_text<'b>(block: &'b Block, name: &'static str) -> Result<&'b str, HandlerError> {
    Ok(block
        .str_attr(name)
        .map_err(HandlerError::invalid(name))?
        .unwrap_or(""))
}

fn required_str<'b>(block: &'b Block, name: &'static str) -> Result<&'b str, HandlerError> {
    match block.str_attr(name).map_err(HandlerError::invalid(name))? {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(HandlerError::MissingAttribute(name)),
    }
}

fn flag(block: &Block, name: &'static str) -> Result<bool, HandlerError> {
    block
        .attr(name)
        .map(AttrValue::as_bool)
        .transpose()
        .map(Option::unwrap_or_default)
        .map_err(HandlerError::invalid(name))
}

fn paragraph(block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    Ok(format!("<p>{}</p>", rich_text(block, "content")?))
}

fn heading(block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    let level = match block.attr("level") {
        Some(value) => value.as_u64().map_err(HandlerError::invalid("level"))?,
        None => 2,
    };
    if !(1..=6).contains(&level) {
        return Err(HandlerError::Failed(format!(
            "heading level {level} is outside 1-6"
        )));
    }
    Ok(format!(
        "<h{level}>{}</h{level}>",
        rich_text(block, "content")?
    ))
}

fn caption(block: &Block) -> Result<String, HandlerError> {
    let caption = rich_text(block, "caption")?;
    Ok(if caption.is_empty() {
        String::new()
    } else {
        format!("<figcaption>{caption}</figcaption>")
    })
}

fn image(block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    let url = required_str(block, "url")?;
    let alt = block
        .str_attr("alt")
        .map_err(HandlerError::invalid("alt"))?
        .unwrap_or("");
    let mut img = format!(
        "<img src=\"{}\" alt=\"{}\"",
        encode_double_quoted_attribute(url),
        encode_double_quoted_attribute(alt)
    );
    for dimension in ["width", "height"] {
        if let Some(value) = block.attr(dimension).and_then(AttrValue::class_key) {
            img.push_str(&format!(
                " {dimension}=\"{}\"",
                encode_double_quoted_attribute(&value)
            ));
        }
    }
    img.push('>');
    Ok(format!("<figure>{img}{}</figure>", caption(block)?))
}

fn list(block: &Block, cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    let tag = if flag(block, "ordered")? { "ol" } else { "ul" };
    let items = if cx.children.is_empty() {
        rich_text(block, "values")?.to_string()
    } else {
        cx.children_markup()
    };
    Ok(format!("<{tag}>{items}</{tag}>"))
}

fn list_item(block: &Block, cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    Ok(format!(
        "<li>{}{}</li>",
        rich_text(block, "content")?,
        cx.children_markup()
    ))
}

fn quote(block: &Block, cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    let mut body = cx.children_markup();
    if body.is_empty() {
        body = rich_text(block, "value")?.to_string();
    }
    let citation = rich_text(block, "citation")?;
    if !citation.is_empty() {
        body.push_str(&format!("<cite>{citation}</cite>"));
    }
    Ok(format!("<blockquote>{body}</blockquote>"))
}

fn code(block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    let source = rich_text(block, "content")?;
    Ok(format!("<pre><code>{}</code></pre>", encode_text(source)))
}

fn preformatted(block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    Ok(format!("<pre>{}</pre>", rich_text(block, "content")?))
}

fn html(block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    Ok(rich_text(block, "content")?.to_string())
}

fn separator(_block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    Ok("<hr>".to_string())
}

fn spacer(block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    let height = match block.attr("height") {
        None => "100px".to_string(),
        Some(value @ AttrValue::Number(_)) => {
            format!("{}px", value.class_key().unwrap_or_default())
        }
        Some(value) => value
            .as_str()
            .map_err(HandlerError::invalid("height"))?
            .to_string(),
    };
    Ok(format!(
        "<div style=\"height:{}\" aria-hidden=\"true\"></div>",
        encode_double_quoted_attribute(&height)
    ))
}

fn button(block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    let text = rich_text(block, "text")?;
    match block.str_attr("url").map_err(HandlerError::invalid("url"))? {
        Some(url) => Ok(format!(
            "<a href=\"{}\">{text}</a>",
            encode_double_quoted_attribute(url)
        )),
        None => Ok(format!("<button type=\"button\">{text}</button>")),
    }
}

fn container(_block: &Block, cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    Ok(format!("<div>{}</div>", cx.children_markup()))
}

const GROUP_TAGS: [&str; 8] = [
    "div", "section", "main", "article", "aside", "header", "footer", "nav",
];

fn group(block: &Block, cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    let tag = block
        .str_attr("tagName")
        .map_err(HandlerError::invalid("tagName"))?
        .unwrap_or("div");
    if !GROUP_TAGS.contains(&tag) {
        return Err(HandlerError::Failed(format!("unsupported group tag `{tag}`")));
    }
    Ok(format!("<{tag}>{}</{tag}>", cx.children_markup()))
}

fn embed(block: &Block, _cx: &HandlerContext<'_>) -> Result<String, HandlerError> {
    let url = required_str(block, "url")?;
    Ok(format!(
        "<figure><iframe src=\"{}\" allowfullscreen></iframe>{}</figure>",
        encode_double_quoted_attribute(url),
        caption(block)?
    ))
}
