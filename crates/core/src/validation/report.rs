use serde::Serialize;
use std::fmt;

pub const SUCCESS_SENTINEL: &str = "No errors are found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        })
    }
}

/// 1-based line and column of a diagnostic in the document stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(flatten)]
    pub position: Option<Position>,
    /// Set on the single diagnostic that ended a run early.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            position,
            fatal: false,
        }
    }

    pub fn warning(message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            position,
            fatal: false,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            position: None,
            fatal: true,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fatal {
            return write!(f, "FATAL: {}", self.message);
        }
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(pos) = self.position {
            write!(f, " (line {}, pos {})", pos.line, pos.column)?;
        }
        Ok(())
    }
}

/// Outcome of one validation run, in the order the diagnostics were met.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// True when nothing of `Error` severity was reported.
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn is_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.fatal)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.diagnostics.is_empty() {
            return f.write_str(SUCCESS_SENTINEL);
        }
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_renders_sentinel() {
        let report = ValidationReport::default();
        assert_eq!(report.to_string(), "No errors are found");
        assert!(report.is_valid());
    }

    #[test]
    fn lines_are_prefixed_and_not_terminated() {
        let report = ValidationReport::new(vec![
            Diagnostic::error(
                "The required attribute 'NearestAirport' is missing.",
                Some(Position { line: 7, column: 8 }),
            ),
            Diagnostic::warning("Could not find schema information for the element 'X'.", None),
        ]);
        assert_eq!(
            report.to_string(),
            "Error: The required attribute 'NearestAirport' is missing. (line 7, pos 8)\n\
             Warning: Could not find schema information for the element 'X'."
        );
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn warnings_alone_keep_report_valid() {
        let report = ValidationReport::new(vec![Diagnostic::warning("w", None)]);
        assert!(report.is_valid());
        assert_eq!(report.to_string(), "Warning: w");
    }

    #[test]
    fn fatal_line_has_marker_and_no_position() {
        let report = ValidationReport::new(vec![Diagnostic::fatal("source unreadable: gone")]);
        assert_eq!(report.to_string(), "FATAL: source unreadable: gone");
        assert!(report.is_fatal());
        assert!(!report.is_valid());
    }

    #[test]
    fn serializes_position_inline() {
        let d = Diagnostic::error("m", Some(Position { line: 2, column: 3 }));
        assert_eq!(
            serde_json::to_string(&d).unwrap(),
            r#"{"severity":"Error","message":"m","line":2,"column":3}"#
        );
    }
}
