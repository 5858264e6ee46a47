//! # Content Reconciliation
//!
//! Decides where a block's markup comes from and merges resolved classes into
//! it.
//!
//! | mode       | leaf with `renderedHtml` | container with `renderedHtml` | no `renderedHtml` |
//! |------------|--------------------------|-------------------------------|-------------------|
//! | `raw`      | template                 | template                      | template          |
//! | `rendered` | rendered                 | rendered                      | template          |
//! | `hybrid`   | rendered                 | template (rendered if the template is empty) | template |
//!
//! Containers rebuilt from their template still have their children
//! reconciled one by one, so class injection reaches nested blocks.

use blockweave_markup::rewrite_first_start_tag;
use serde::Serialize;

use crate::block::{Block, MalformedBlock};
use crate::options::ContentHandling;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    /// The block's `renderedHtml`, reused verbatim.
    Rendered,
    /// `innerContent` with converted children substituted.
    Template,
}

pub fn content_source(block: &Block, mode: ContentHandling) -> ContentSource {
    let Some(rendered) = block.rendered_html.as_deref() else {
        return ContentSource::Template;
    };
    match mode {
        ContentHandling::Raw => ContentSource::Template,
        ContentHandling::Rendered => ContentSource::Rendered,
        ContentHandling::Hybrid if block.is_leaf() => ContentSource::Rendered,
        ContentHandling::Hybrid => {
            let template_empty = block
                .inner_content
                .iter()
                .flatten()
                .all(|s| s.trim().is_empty());
            if template_empty && !rendered.trim().is_empty() {
                ContentSource::Rendered
            } else {
                ContentSource::Template
            }
        }
    }
}

/// One entry of a content template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePart<'a> {
    Literal(&'a str),
    /// Placeholder for the child at this index.
    Child(usize),
}

/// The template's parts in document order, numbering placeholders as they
/// are consumed.
pub fn template_parts(inner_content: &[Option<String>]) -> impl Iterator<Item = TemplatePart<'_>> {
    let mut next_child = 0;
    inner_content.iter().map(move |entry| match entry {
        Some(literal) => TemplatePart::Literal(literal),
        None => {
            next_child += 1;
            TemplatePart::Child(next_child - 1)
        }
    })
}

/// Substitutes converted children into the template's placeholders.
pub fn assemble(inner_content: &[Option<String>], children: &[String]) -> Result<String, MalformedBlock> {
    let placeholders = inner_content.iter().filter(|c| c.is_none()).count();
    if placeholders != children.len() {
        return Err(MalformedBlock::PlaceholderMismatch {
            placeholders,
            children: children.len(),
        });
    }
    let mut out = String::new();
    for part in template_parts(inner_content) {
        match part {
            TemplatePart::Literal(literal) => out.push_str(literal),
            TemplatePart::Child(i) => out.push_str(&children[i]),
        }
    }
    Ok(out)
}

/// Merges `classes` into the first opening tag of `html`. Existing classes
/// stay first; the markup is returned byte-identical when nothing is added.
pub fn inject_classes<S: AsRef<str>>(html: &str, classes: &[S]) -> String {
    if classes.is_empty() {
        return html.to_string();
    }
    rewrite_first_start_tag(html, |tag| tag.add_classes(classes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn leaf() -> Block {
        Block::new("core/paragraph")
            .with_inner("<p>template</p>")
            .with_rendered("<p>rendered</p>")
    }

    fn container() -> Block {
        Block::new("core/group")
            .with_inner("<div>")
            .with_child(leaf())
            .with_inner("</div>")
            .with_rendered("<div>all</div>")
    }

    #[rstest]
    #[case(ContentHandling::Raw, ContentSource::Template, ContentSource::Template)]
    #[case(ContentHandling::Rendered, ContentSource::Rendered, ContentSource::Rendered)]
    #[case(ContentHandling::Hybrid, ContentSource::Rendered, ContentSource::Template)]
    fn source_per_mode(
        #[case] mode: ContentHandling,
        #[case] for_leaf: ContentSource,
        #[case] for_container: ContentSource,
    ) {
        assert_eq!(content_source(&leaf(), mode), for_leaf);
        assert_eq!(content_source(&container(), mode), for_container);
    }

    #[test]
    fn missing_rendered_html_falls_back_to_template() {
        let block = Block::new("core/paragraph").with_inner("<p>x</p>");
        assert_eq!(
            content_source(&block, ContentHandling::Rendered),
            ContentSource::Template
        );
    }

    #[test]
    fn hybrid_container_with_empty_template_uses_rendered() {
        let mut block = container();
        block.inner_content = vec![None];
        assert_eq!(
            content_source(&block, ContentHandling::Hybrid),
            ContentSource::Rendered
        );
    }

    #[test]
    fn assemble_in_order() {
        let template = vec![
            Some("<div>".to_string()),
            None,
            Some("<hr>".to_string()),
            None,
            Some("</div>".to_string()),
        ];
        let children = vec!["A".to_string(), "B".to_string()];
        assert_eq!(assemble(&template, &children).unwrap(), "<div>A<hr>B</div>");
    }

    #[test]
    fn assemble_rejects_count_mismatch() {
        let template = vec![Some("<div>".to_string()), None, None];
        assert_eq!(
            assemble(&template, &["A".to_string()]),
            Err(MalformedBlock::PlaceholderMismatch {
                placeholders: 2,
                children: 1
            })
        );
    }

    #[test]
    fn inject_appends_missing_classes_only() {
        let html = "<p class='lead' id=x>Hi</p>";
        assert_eq!(
            inject_classes(html, &["lead", "text-center"]),
            "<p class=\"lead text-center\" id=\"x\">Hi</p>"
        );
    }

    #[test]
    fn inject_keeps_bytes_when_nothing_changes() {
        let html = "<p  class='lead'  data-x>Hi</p>";
        assert_eq!(inject_classes(html, &["lead"]), html);
        assert_eq!(inject_classes(html, &[] as &[&str]), html);
        assert_eq!(inject_classes("plain text", &["x"]), "plain text");
    }
}
