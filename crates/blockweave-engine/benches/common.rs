use blockweave_engine::Block;

// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_flat_document(size: usize) -> Vec<Block> {
    (0..size)
        .map(|i| match i % 4 {
            0 => Block::new("core/heading")
                .with_attr("level", 2.0)
                .with_inner(format!("<h2>Section {i}</h2>")),
            1 => Block::new("core/image")
                .with_attr("url", format!("https://cdn.example.com/{i}.png"))
                .with_inner(format!(
                    "<figure><img src=\"https://cdn.example.com/{i}.png\" alt=\"\"></figure>"
                )),
            _ => Block::new("core/paragraph")
                .with_attr("align", "center")
                .with_inner(format!(
                    "\n<p>Paragraph {i} with   some <strong>content</strong>.</p>\n"
                )),
        })
        .collect()
}

#[allow(dead_code)]
pub fn generate_nested_document(sections: usize, depth: usize) -> Vec<Block> {
    (0..sections).map(|s| nested_group(s, depth)).collect()
}

#[allow(dead_code)]
fn nested_group(section: usize, remaining_depth: usize) -> Block {
    let paragraph = Block::new("core/paragraph")
        .with_inner(format!("<p>Section {section}, depth {remaining_depth}</p>"));
    let mut group = Block::new("core/group")
        .with_inner("<div class=\"wp-block-group\">")
        .with_child(paragraph);
    if remaining_depth > 0 {
        group = group.with_child(nested_group(section, remaining_depth - 1));
    }
    group.with_inner("</div>")
}
