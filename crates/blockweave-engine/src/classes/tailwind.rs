//! Built-in Tailwind CSS class table.

use super::{ANY_VALUE, ClassMap, ClassRule, STYLE_VARIANT_SLOT};

const NO_CLASSES: [&str; 0] = [];

fn text_align(rule: ClassRule, attribute: &str) -> ClassRule {
    rule.on(attribute, "left", &["text-left"])
        .on(attribute, "center", &["text-center"])
        .on(attribute, "right", &["text-right"])
        .on(attribute, "justify", &["text-justify"])
}

pub(super) fn class_map() -> ClassMap {
    let defaults = ClassRule::default()
        .on("align", "left", &["float-left", "mr-4"])
        .on("align", "right", &["float-right", "ml-4"])
        .on("align", "center", &["mx-auto"])
        .on("align", "wide", &["max-w-screen-xl", "mx-auto"])
        .on("align", "full", &["w-full"])
        .on("fontSize", "small", &["text-sm"])
        .on("fontSize", "medium", &["text-base"])
        .on("fontSize", "large", &["text-lg"])
        .on("fontSize", "x-large", &["text-xl"])
        .on("textColor", ANY_VALUE, &["text-{value}"])
        .on("backgroundColor", ANY_VALUE, &["bg-{value}"]);
    let defaults = text_align(defaults, "textAlign");

    ClassMap::new()
        .with_defaults(defaults)
        .with_block(
            "core/paragraph",
            text_align(ClassRule::new(&["mb-4"]), "align").on(
                "dropCap",
                "true",
                &["first-letter:text-5xl", "first-letter:float-left"],
            ),
        )
        .with_block(
            "core/heading",
            text_align(ClassRule::new(&["font-bold"]), "align")
                .on("level", "1", &["text-4xl"])
                .on("level", "2", &["text-3xl"])
                .on("level", "3", &["text-2xl"])
                .on("level", "4", &["text-xl"])
                .on("level", "5", &["text-lg"])
                .on("level", "6", &["text-base"]),
        )
        .with_block("core/image", ClassRule::new(&["my-4"]))
        .with_block(
            "core/list",
            ClassRule::new(&["pl-6", "mb-4"])
                .on("ordered", "true", &["list-decimal"])
                .on("ordered", "false", &["list-disc"]),
        )
        .with_block("core/list-item", ClassRule::new(&["mb-1"]))
        .with_block(
            "core/quote",
            ClassRule::new(&["border-l-4", "border-gray-300", "pl-4", "italic"]),
        )
        .with_block(
            "core/code",
            ClassRule::new(&["font-mono", "bg-gray-100", "p-4", "rounded", "overflow-x-auto"]),
        )
        .with_block(
            "core/preformatted",
            ClassRule::new(&["font-mono", "whitespace-pre-wrap"]),
        )
        .with_block("core/separator", ClassRule::new(&["border-t", "my-8"]))
        .with_block("core/spacer", ClassRule::new(&NO_CLASSES))
        .with_block(
            "core/button",
            ClassRule::new(&["inline-block", "px-4", "py-2", "rounded"])
                .on(STYLE_VARIANT_SLOT, "fill", &["bg-blue-600", "text-white"])
                .on(STYLE_VARIANT_SLOT, "outline", &["border", "border-current"]),
        )
        .with_block(
            "core/buttons",
            ClassRule::new(&["flex", "flex-wrap", "gap-2"])
                .on("layout", "vertical", &["flex-col"]),
        )
        .with_block("core/group", ClassRule::new(&["my-6"]))
        .with_block(
            "core/columns",
            ClassRule::new(&["flex", "flex-col", "md:flex-row", "gap-4"]),
        )
        .with_block("core/column", ClassRule::new(&["flex-1"]))
        .with_block(
            "core/gallery",
            ClassRule::new(&["grid", "gap-4"])
                .on("columns", "2", &["grid-cols-2"])
                .on("columns", "3", &["grid-cols-3"])
                .on("columns", "4", &["grid-cols-4"]),
        )
        .with_block("core/table", ClassRule::new(&["table-auto", "w-full"]))
        .with_block("core/embed", ClassRule::new(&["my-4", "aspect-video"]))
        .with_block("core/cover", ClassRule::new(&["relative", "bg-cover", "bg-center"]))
}
