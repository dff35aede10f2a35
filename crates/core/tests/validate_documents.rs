//! Validation of the fixture documents against `Hotels.xsd`.

use hotels_xml_core::validation::SUCCESS_SENTINEL;
use hotels_xml_core::{validate, DocumentSource, Severity};
use std::path::PathBuf;

fn fixture(name: &str) -> DocumentSource {
    DocumentSource::path(
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name),
    )
}

#[test]
fn valid_document_reports_sentinel() {
    let report = validate(&fixture("Hotels.xml"), &fixture("Hotels.xsd"));
    assert!(report.is_empty());
    assert_eq!(report.to_string(), SUCCESS_SENTINEL);
}

#[test]
fn error_document_reports_every_violation_in_order() {
    let report = validate(&fixture("HotelsErrors.xml"), &fixture("Hotels.xsd"));
    let expected = [
        "Error: The 'Rating' attribute is invalid - The value 'four' is invalid according to its datatype 'decimal'. (line 3, pos 4)",
        "Error: The element 'Hotel' has invalid child element 'Phone'. List of possible elements expected: 'Name'. (line 15, pos 6)",
        "Error: The required attribute 'NearestAirport' is missing. (line 27, pos 6)",
        "Error: The element 'Address' has incomplete content. List of possible elements expected: 'Zip'. (line 32, pos 7)",
        "Error: The element 'Hotel' has invalid child element 'Email'. (line 44, pos 6)",
    ];
    assert_eq!(report.to_string(), expected.join("\n"));
    assert!(report
        .diagnostics()
        .iter()
        .all(|d| d.severity == Severity::Error && d.position.is_some()));
    assert!(!report.is_valid());
}

#[test]
fn namespaced_collection_does_not_pass_as_valid() {
    let document = DocumentSource::text(
        r#"<x:Hotels xmlns:x="urn:other"><x:Hotel><x:Name>Inn</x:Name></x:Hotel></x:Hotels>"#,
    );
    let report = validate(&document, &fixture("Hotels.xsd"));
    assert!(!report.is_valid());
    assert_eq!(
        report.diagnostics()[0].to_string(),
        "Error: The 'urn:other:Hotels' element is not declared. (line 1, pos 2)"
    );
}

#[test]
fn unreachable_schema_is_a_single_fatal_line() {
    let report = validate(&fixture("Hotels.xml"), &fixture("Missing.xsd"));
    assert_eq!(report.diagnostics().len(), 1);
    let line = report.to_string();
    assert!(line.starts_with("FATAL: schema unloadable: cannot read "), "{line}");
    assert!(!line.contains('\n'));
    assert!(report.diagnostics()[0].position.is_none());
}

#[test]
fn document_fetched_as_bytes_validates_the_same() {
    let xml = std::fs::read(
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/Hotels.xml"),
    )
    .unwrap();
    let document = DocumentSource::bytes("https://example.test/Hotels.xml", xml);
    let report = validate(&document, &fixture("Hotels.xsd"));
    assert_eq!(report.to_string(), SUCCESS_SENTINEL);
}

#[test]
fn truncated_document_keeps_diagnostics_before_fatal() {
    let xml = r#"<Hotels><Hotel Rating="x"><Name>A</Name>"#;
    let report = validate(&DocumentSource::text(xml), &fixture("Hotels.xsd"));
    let lines: Vec<String> = report.diagnostics().iter().map(ToString::to_string).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Error: The 'Rating' attribute is invalid"));
    assert!(lines[1].starts_with("FATAL: malformed markup: "));
}
