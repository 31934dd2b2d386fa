use std::io::Write as _;

use super::*;

const SVG: &str = r#"<svg><text>Service on</text><text>SUNDAY_DATE</text><desc>SUNDAY_DATE</desc></svg>"#;

#[test]
fn replaces_every_occurrence() {
    let out = substitute(SVG, "SUNDAY_DATE", "7. January 2024");
    assert_eq!(out.matches("7. January 2024").count(), 2);
    assert!(!out.contains("SUNDAY_DATE"));
}

#[test]
fn missing_placeholder_borrows_input() {
    let out = substitute(SVG, "NOT_THERE", "x");
    assert!(matches!(out, Cow::Borrowed(_)));
    assert_eq!(out, SVG);
}

#[test]
fn empty_placeholder_matches_nothing() {
    assert_eq!(substitute("abc", "", "-"), "abc");
}

#[test]
fn no_pattern_semantics() {
    assert_eq!(substitute("a.*b a.*b", ".*", "$1"), "a$1b a$1b");
}

#[test]
fn substitution_is_idempotent_when_replacement_lacks_placeholder() {
    let once = substitute(SVG, "SUNDAY_DATE", "17. März 2024").into_owned();
    let twice = substitute(&once, "SUNDAY_DATE", "17. März 2024");
    assert_eq!(twice, once);
}

#[test]
fn document_counts_and_renders() {
    let doc = TemplateDocument::new(SVG, "SUNDAY_DATE");
    assert_eq!(doc.placeholder_count(), 2);
    assert!(doc.render_for("x").contains("<text>x</text>"));
    assert_eq!(doc.name(), None);
    doc.validate().unwrap();
}

#[test]
fn empty_document_fails_validation() {
    let err = TemplateDocument::new("  \n", "X").validate().unwrap_err();
    assert!(matches!(err, ThumbError::Validation(_)));
}

#[test]
fn load_reads_source_and_name() {
    let mut file = tempfile::Builder::new()
        .suffix(".svg")
        .tempfile()
        .unwrap();
    file.write_all(SVG.as_bytes()).unwrap();

    let doc = TemplateDocument::load(file.path(), "SUNDAY_DATE").unwrap();
    assert_eq!(doc.source(), SVG);
    assert_eq!(doc.placeholder(), "SUNDAY_DATE");
    assert!(doc.name().unwrap().ends_with(".svg"));
}

#[test]
fn load_missing_file_is_an_error_with_path() {
    let err = TemplateDocument::load(Path::new("/definitely/not/here.svg"), "X").unwrap_err();
    assert!(err.to_string().contains("here.svg"));
    match err {
        ThumbError::Io { source, .. } => assert_eq!(source.kind(), std::io::ErrorKind::NotFound),
        other => panic!("unexpected error: {other}"),
    }
}
