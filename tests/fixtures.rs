//! Data-driven checks over `tests/fixtures/*.svg`.
//!
//! Every fixture must load, render without error, and render identically
//! twice. When a sibling `.outline` file exists, the loaded tree must match
//! it line for line.

use datatest_stable::Utf8Path;
use svgscene::{Document, RecordingSurface, RenderOptions, SvgLoader};

/// Route library logs to the test output; `RUST_LOG=svgscene=trace` shows
/// every element the loader builds.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn render(doc: &Document) -> Result<String, String> {
    let mut surface = RecordingSurface::new();
    doc.render(&mut surface, &RenderOptions::default())
        .map_err(|e| e.to_string())?;
    Ok(format!("{:#?}", surface.commands()))
}

/// Format a colored inline diff using dissimilar
fn format_inline_diff(expected: &str, actual: &str) -> String {
    use dissimilar::Chunk;

    let mut output = String::new();
    output.push_str("Legend: [-expected-] [+actual+]\n\n");
    for chunk in dissimilar::diff(expected, actual) {
        match chunk {
            Chunk::Equal(s) => output.push_str(s),
            Chunk::Delete(s) => {
                output.push_str("\x1b[31m[-");
                output.push_str(s);
                output.push_str("-]\x1b[0m");
            }
            Chunk::Insert(s) => {
                output.push_str("\x1b[32m[+");
                output.push_str(s);
                output.push_str("+]\x1b[0m");
            }
        }
    }
    output
}

fn check_fixture(path: &Utf8Path) -> datatest_stable::Result<()> {
    init_tracing();
    let loader = SvgLoader::new();
    let doc = loader.try_load_path(path)?;

    let first = render(&doc).map_err(|e| format!("{path}: render failed: {e}"))?;
    let again = loader.try_load_path(path)?;
    let second = render(&again).map_err(|e| format!("{path}: render failed: {e}"))?;
    if first != second {
        return Err(format!(
            "{path}: rendering is not deterministic\n{}",
            format_inline_diff(&first, &second)
        )
        .into());
    }

    let outline_path = path.with_extension("outline");
    if outline_path.exists() {
        let expected = std::fs::read_to_string(&outline_path)?;
        let actual = doc.outline();
        if expected.trim_end() != actual.trim_end() {
            return Err(format!(
                "{path}: tree does not match {outline_path}\n{}",
                format_inline_diff(&expected, &actual)
            )
            .into());
        }
    }
    Ok(())
}

datatest_stable::harness! {
    { test = check_fixture, root = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures"), pattern = r"\.svg$" },
}
