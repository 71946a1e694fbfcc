#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn numbers_fall_back_instead_of_nan() {
    assert_eq!(parse_number(Some(" 2.5 "), 1.0), 2.5);
    assert_eq!(parse_number(Some(""), 1.0), 1.0);
    assert_eq!(parse_number(Some("abc"), 1.0), 1.0);
    assert_eq!(parse_number(Some("NaN"), 1.0), 1.0);
    assert_eq!(parse_number(Some("inf"), 1.0), 1.0);
    assert_eq!(parse_number(None, 7.0), 7.0);
}

#[test]
fn counts_truncate_and_reject_negatives() {
    assert_eq!(parse_count(Some("5"), 1), 5);
    assert_eq!(parse_count(Some("5.9"), 1), 5);
    assert_eq!(parse_count(Some("-3"), 1), 1);
    assert_eq!(parse_count(Some("x"), 4), 4);
}

#[test]
fn memory_form_reads_back_writes() {
    let form = MemoryForm::new().with_text("a.b", "3").with_checked("on", true);
    assert_eq!(number(&form, "a.b", 0.0), 3.0);
    assert!(flag(&form, "on", false));
    assert!(!flag(&form, "missing", false));
    form.set_text("name", "   ");
    assert_eq!(text_or(&form, "name", "default"), "default");
}

#[test]
fn validation_error_names_field() {
    let err = ValidationError::new("eps_norm", "must be > 0");
    assert_eq!(err.to_string(), "eps_norm: must be > 0");
}
