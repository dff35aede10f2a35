//! Schema validation and JSON-ready projection of hotel collection documents.
//!
//! Two independent entry points share the [`DocumentSource`] abstraction:
//! [`validate`] streams a document against an XML Schema and reports every
//! violation, and [`to_object_graph`] loads a document, enforces the record
//! rules of the hotel collection and returns an ordered [`Value`] tree.

pub mod error;
pub mod graph;
pub mod models;
pub mod parsing;
pub mod source;
pub mod validation;

pub use error::{MalformedDataError, MalformedKind, MappingError, RequiredField};
pub use graph::{Object, Value};
pub use models::{AddressRecord, HotelRecord};
pub use parsing::{build_object_graph, parse_hotels, to_object_graph};
pub use source::{compute_sha256_hex, DocumentSource, SourceError};
pub use validation::{validate, Diagnostic, Severity, ValidationReport};
