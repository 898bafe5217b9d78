use std::fs;
use std::path::Path;

use indoc::indoc;
use verdure_pandoc::{CSS_MARKER, FallbackPolicy, ProcessOptions, Processor};

const PAGE_WITH_CODE: &str = indoc! {r#"
    <html>
    <head><title>doc</title></head>
    <body>
    <pre class="sourceCode python"><code>def hello():
        return 1</code></pre>
    </body>
    </html>
"#};

const PAGE_WITHOUT_CODE: &str = indoc! {r#"
    <html>
    <head><title>plain</title></head>
    <body><p>nothing to see</p></body>
    </html>
"#};

fn options(input: &Path, output: Option<&Path>) -> ProcessOptions {
    ProcessOptions {
        input_dir: input.to_path_buf(),
        output_dir: output.map(|p| p.to_path_buf()),
        policy: FallbackPolicy::TryEach,
        inject_css: true,
        verbose: false,
    }
}

#[test]
fn highlights_files_in_place() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("code.html"), PAGE_WITH_CODE).unwrap();
    fs::write(dir.path().join("plain.html"), PAGE_WITHOUT_CODE).unwrap();

    let stats = Processor::new(options(dir.path(), None)).process().unwrap();

    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.blocks_highlighted, 1);

    let rewritten = fs::read_to_string(dir.path().join("code.html")).unwrap();
    assert!(rewritten.contains("<span class=\"hl-"));
    assert!(rewritten.contains(CSS_MARKER));

    // The file with no code blocks is never rewritten
    let untouched = fs::read_to_string(dir.path().join("plain.html")).unwrap();
    assert_eq!(untouched, PAGE_WITHOUT_CODE);
}

#[test]
fn rerun_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("code.html"), PAGE_WITH_CODE).unwrap();

    Processor::new(options(dir.path(), None)).process().unwrap();
    let first_pass = fs::read_to_string(dir.path().join("code.html")).unwrap();

    let stats = Processor::new(options(dir.path(), None)).process().unwrap();
    let second_pass = fs::read_to_string(dir.path().join("code.html")).unwrap();

    assert_eq!(stats.files_already_highlighted, 1);
    assert_eq!(stats.blocks_highlighted, 0);
    assert_eq!(first_pass, second_pass);
}

#[test]
fn rerun_on_headless_fragment_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let page = "<pre class=\"sourceCode python\"><code>def f():\n    return 1</code></pre>";
    fs::write(dir.path().join("fragment.html"), page).unwrap();

    Processor::new(options(dir.path(), None)).process().unwrap();
    let first = fs::read_to_string(dir.path().join("fragment.html")).unwrap();
    assert!(first.contains("<span class=\"hl-"));
    // No <head> to carry the stylesheet marker
    assert!(!first.contains(CSS_MARKER));

    let stats = Processor::new(options(dir.path(), None)).process().unwrap();
    let second = fs::read_to_string(dir.path().join("fragment.html")).unwrap();

    assert_eq!(stats.blocks_highlighted, 0);
    assert_eq!(second, first);
}

#[test]
fn output_directory_leaves_input_untouched() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let out_dir = output.path().join("site");

    let nested = input.path().join("chapter");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("code.html"), PAGE_WITH_CODE).unwrap();

    let stats = Processor::new(options(input.path(), Some(&out_dir)))
        .process()
        .unwrap();

    assert_eq!(stats.blocks_highlighted, 1);

    let original = fs::read_to_string(nested.join("code.html")).unwrap();
    assert_eq!(original, PAGE_WITH_CODE);

    let copied = fs::read_to_string(out_dir.join("chapter/code.html")).unwrap();
    assert!(copied.contains("<span class=\"hl-"));
}

#[cfg(unix)]
#[test]
fn output_copy_preserves_symlinks() {
    use std::os::unix::fs::symlink;

    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let out_dir = output.path().join("site");

    fs::write(input.path().join("code.html"), PAGE_WITH_CODE).unwrap();
    fs::write(input.path().join("style.css"), "body {}").unwrap();
    symlink("style.css", input.path().join("alias.css")).unwrap();
    symlink("missing.css", input.path().join("dangling.css")).unwrap();

    let stats = Processor::new(options(input.path(), Some(&out_dir)))
        .process()
        .unwrap();
    assert_eq!(stats.blocks_highlighted, 1);

    let alias = fs::symlink_metadata(out_dir.join("alias.css")).unwrap();
    assert!(alias.file_type().is_symlink());
    assert_eq!(
        fs::read_to_string(out_dir.join("alias.css")).unwrap(),
        "body {}"
    );

    // A dangling link is recreated, not an error
    let dangling = fs::symlink_metadata(out_dir.join("dangling.css")).unwrap();
    assert!(dangling.file_type().is_symlink());
}

#[test]
fn unsupported_languages_are_collected() {
    let dir = tempfile::tempdir().unwrap();
    let page = r#"<html><head></head><body>
        <pre class="sourceCode klingon"><code>qapla'</code></pre>
        </body></html>"#;
    fs::write(dir.path().join("doc.html"), page).unwrap();

    let stats = Processor::new(options(dir.path(), None)).process().unwrap();

    assert_eq!(stats.blocks_highlighted, 0);
    assert_eq!(stats.blocks_skipped, 1);
    assert_eq!(stats.unsupported_languages, vec!["klingon".to_string()]);

    // Nothing was highlighted, so the file is not rewritten
    let content = fs::read_to_string(dir.path().join("doc.html")).unwrap();
    assert_eq!(content, page);
}
