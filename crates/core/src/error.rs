use crate::source::SourceError;
use std::fmt;
use thiserror::Error;

/// Required child of a `<Hotel>` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Name,
    Phone,
    Address,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "Name",
            Self::Phone => "Phone",
            Self::Address => "Address",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    WrongRoot,
    MissingRequiredElement(RequiredField),
    IncompleteAddress,
}

/// A business rule of the hotel collection was broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct MalformedDataError {
    kind: MalformedKind,
    message: String,
}

impl MalformedDataError {
    pub fn new(kind: MalformedKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn wrong_root(found: &str) -> Self {
        Self::new(
            MalformedKind::WrongRoot,
            format!("Root element must be <Hotels>, found <{found}>."),
        )
    }

    pub fn missing(field: RequiredField) -> Self {
        let message = match field {
            RequiredField::Phone => "Hotel must contain at least one <Phone>.".to_string(),
            other => format!("Hotel missing <{other}>."),
        };
        Self::new(MalformedKind::MissingRequiredElement(field), message)
    }

    pub fn incomplete_address() -> Self {
        Self::new(
            MalformedKind::IncompleteAddress,
            "Address is missing a required field or NearestAirport attribute.",
        )
    }

    pub fn kind(&self) -> MalformedKind {
        self.kind
    }

    /// Prefixes the message with the 1-based position of the offending record.
    pub(crate) fn in_record(mut self, index: usize) -> Self {
        self.message = format!("Hotel #{index}: {}", self.message);
        self
    }
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("document is not well-formed: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error(transparent)]
    Malformed(#[from] MalformedDataError),
}

impl MappingError {
    /// The business-rule kind, if this failure is one.
    pub fn malformed_kind(&self) -> Option<MalformedKind> {
        match self {
            Self::Malformed(err) => Some(err.kind()),
            _ => None,
        }
    }
}
