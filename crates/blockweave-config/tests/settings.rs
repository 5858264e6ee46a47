use blockweave_config::{ConfigError, Settings};
use blockweave_engine::{Block, CssFramework, OptimizationLevel, SsrOptions, convert};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const CONFIG: &str = r#"
css_framework = "custom"
class_maps = ["maps/*.toml"]

[ssr]
enabled = true
level = "minimal"

[streaming]
chunk_size = 8
"#;

fn write(dir: &TempDir, relative: &str, content: &str) {
    let path = dir.path().join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn settings_file_drives_conversion() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.toml", CONFIG);
    write(
        &dir,
        "maps/a.toml",
        "[blocks.\"core/paragraph\"]\nbase = [\"text-a\"]\n\n[blocks.\"core/paragraph\".attributes.align]\ncenter = [\"centered\"]\n",
    );
    write(
        &dir,
        "maps/b.toml",
        "[blocks.\"core/paragraph\"]\nbase = [\"text-b\"]\n",
    );

    let settings = Settings::load_from_path(dir.path().join("config.toml"))
        .unwrap()
        .unwrap();
    let options = settings.to_options().unwrap();
    assert_eq!(options.css_framework, CssFramework::Custom);
    assert_eq!(
        options.ssr_options,
        SsrOptions::Level(OptimizationLevel::Minimal)
    );
    assert_eq!(options.streaming.chunk_size, 8);

    let block = Block::new("core/paragraph")
        .with_attr("align", "center")
        .with_inner("<p>Hi</p>");
    let conversion = convert(&[block], options).unwrap();
    assert_eq!(
        conversion.markup(),
        Some("<p class=\"text-b centered\">Hi</p>")
    );
}

#[test]
fn custom_framework_without_maps_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.toml", "css_framework = \"custom\"\n");

    let settings = Settings::load_from_path(dir.path().join("config.toml"))
        .unwrap()
        .unwrap();
    let err = settings.to_options().unwrap_err();
    assert!(matches!(err, ConfigError::Options(_)));
    assert_eq!(
        err.to_string(),
        "the custom CSS framework requires a custom class map"
    );
}

#[test]
fn broken_class_map_names_the_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "config.toml", "class_maps = [\"bad.toml\"]\n");
    write(&dir, "bad.toml", "blocks = 3\n");

    let settings = Settings::load_from_path(dir.path().join("config.toml"))
        .unwrap()
        .unwrap();
    let err = settings.to_options().unwrap_err();
    assert!(matches!(err, ConfigError::ClassMapParseError { .. }));
    assert!(err.to_string().contains("bad.toml"));
}
