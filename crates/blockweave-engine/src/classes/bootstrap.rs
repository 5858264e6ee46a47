//! Built-in Bootstrap 5 class table.

use super::{ClassMap, ClassRule, STYLE_VARIANT_SLOT};

fn text_align(rule: ClassRule, attribute: &str) -> ClassRule {
    rule.on(attribute, "left", &["text-start"])
        .on(attribute, "center", &["text-center"])
        .on(attribute, "right", &["text-end"])
}

pub(super) fn class_map() -> ClassMap {
    let defaults = ClassRule::default()
        .on("align", "left", &["float-start", "me-3"])
        .on("align", "right", &["float-end", "ms-3"])
        .on("align", "center", &["mx-auto", "d-block"])
        .on("align", "wide", &["container"])
        .on("align", "full", &["container-fluid"])
        .on("fontSize", "small", &["small"])
        .on("fontSize", "large", &["fs-5"])
        .on("fontSize", "x-large", &["fs-4"]);
    let defaults = text_align(defaults, "textAlign");

    ClassMap::new()
        .with_defaults(defaults)
        .with_block(
            "core/paragraph",
            text_align(ClassRule::new(&["mb-3"]), "align"),
        )
        .with_block(
            "core/heading",
            text_align(ClassRule::new(&["mb-3"]), "align")
                .on("level", "1", &["display-5"])
                .on("level", "2", &["h2"])
                .on("level", "3", &["h3"])
                .on("level", "4", &["h4"])
                .on("level", "5", &["h5"])
                .on("level", "6", &["h6"]),
        )
        .with_block("core/image", ClassRule::new(&["figure"]))
        .with_block("core/list", ClassRule::new(&["mb-3"]))
        .with_block("core/quote", ClassRule::new(&["blockquote"]))
        .with_block("core/code", ClassRule::new(&["bg-light", "p-3", "rounded"]))
        .with_block("core/preformatted", ClassRule::new(&["bg-light", "p-3"]))
        .with_block("core/separator", ClassRule::new(&["my-4"]))
        .with_block(
            "core/button",
            ClassRule::new(&["btn"])
                .on(STYLE_VARIANT_SLOT, "fill", &["btn-primary"])
                .on(STYLE_VARIANT_SLOT, "outline", &["btn-outline-primary"]),
        )
        .with_block("core/buttons", ClassRule::new(&["d-flex", "flex-wrap", "gap-2"]))
        .with_block("core/group", ClassRule::new(&["my-4"]))
        .with_block("core/columns", ClassRule::new(&["row", "g-3"]))
        .with_block("core/column", ClassRule::new(&["col"]))
        .with_block(
            "core/gallery",
            ClassRule::new(&["row", "g-2"])
                .on("columns", "2", &["row-cols-2"])
                .on("columns", "3", &["row-cols-3"])
                .on("columns", "4", &["row-cols-4"]),
        )
        .with_block("core/table", ClassRule::new(&["table"]))
        .with_block("core/embed", ClassRule::new(&["ratio", "ratio-16x9"]))
}
