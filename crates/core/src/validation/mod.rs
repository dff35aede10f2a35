mod position;
pub mod report;
pub mod schema;
mod stream;
pub mod types;

pub use report::{Diagnostic, Position, Severity, ValidationReport, SUCCESS_SENTINEL};
pub use schema::{SchemaDefinition, SchemaError};

use crate::source::{DocumentSource, SourceError};
use thiserror::Error;

/// Condition that stops a validation run before the end of the document.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("source unreadable: {0}")]
    Source(#[from] SourceError),
    #[error("schema unloadable: {0}")]
    Schema(#[from] SchemaError),
    #[error("malformed markup: {0}")]
    Markup(String),
}

/// Validates `document` against the schema at `schema`.
///
/// Never fails: schema violations become diagnostics, and anything that stops
/// the run early (unreadable source, unusable schema, broken markup) becomes a
/// single trailing FATAL diagnostic.
pub fn validate(document: &DocumentSource, schema: &DocumentSource) -> ValidationReport {
    let mut diagnostics = Vec::new();
    if let Err(fatal) = run(document, schema, &mut diagnostics) {
        tracing::warn!(document = %document.describe(), error = %fatal, "validation stopped early");
        diagnostics.push(Diagnostic::fatal(fatal.to_string()));
    }
    let report = ValidationReport::new(diagnostics);
    let digest = if tracing::enabled!(tracing::Level::INFO) {
        document.log_digest()
    } else {
        String::new()
    };
    tracing::info!(
        document = %document.describe(),
        sha256 = %digest,
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validation finished"
    );
    report
}

fn run(
    document: &DocumentSource,
    schema: &DocumentSource,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), FatalError> {
    let schema = SchemaDefinition::compile(schema)?;
    let input = document.open()?;
    stream::validate_stream(&schema, input, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_document_degrades_to_fatal_line() {
        let schema = DocumentSource::text(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element name="Hotels"/></xs:schema>"#,
        );
        let report = validate(&DocumentSource::path("/no/such/Hotels.xml"), &schema);
        assert_eq!(report.diagnostics().len(), 1);
        let line = report.to_string();
        assert!(line.starts_with("FATAL: source unreadable: cannot read /no/such/Hotels.xml"));
    }

    #[test]
    fn broken_schema_degrades_to_fatal_line() {
        let report = validate(
            &DocumentSource::text("<Hotels/>"),
            &DocumentSource::text("<xs:schema"),
        );
        assert!(report.is_fatal());
        assert!(report.to_string().starts_with("FATAL: schema unloadable: "));
    }

    #[test]
    fn untyped_root_accepts_anything() {
        let schema = DocumentSource::text(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element name="Hotels"/></xs:schema>"#,
        );
        let report = validate(&DocumentSource::text("<Hotels a='1'><x/>text</Hotels>"), &schema);
        assert_eq!(report.to_string(), SUCCESS_SENTINEL);
    }
}
