use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::PathBuf;
use thiserror::Error;

/// Hex-encoded SHA-256 of an in-memory document.
pub fn compute_sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Where a document or schema comes from.
///
/// Retrieval (HTTP, object stores, ...) happens before a source is built; the
/// core only ever reads from memory or from the local filesystem.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// Markup already held as text.
    Text(String),
    /// Raw bytes, labelled with where they were obtained (usually a URL).
    Bytes { label: String, data: Vec<u8> },
    /// A file on disk, opened lazily on each read.
    Path(PathBuf),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{location} is not valid UTF-8")]
    Encoding { location: String },
}

impl DocumentSource {
    pub fn text(xml: impl Into<String>) -> Self {
        Self::Text(xml.into())
    }

    pub fn bytes(label: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Bytes {
            label: label.into(),
            data,
        }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Human-readable label used in logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(_) => "<inline document>".to_string(),
            Self::Bytes { label, .. } => label.clone(),
            Self::Path(path) => path.display().to_string(),
        }
    }

    /// Opens a buffered reader over the source. The reader is owned by the
    /// caller and released when dropped.
    pub fn open(&self) -> Result<Box<dyn BufRead + '_>, SourceError> {
        match self {
            Self::Text(text) => Ok(Box::new(Cursor::new(text.as_bytes()))),
            Self::Bytes { data, .. } => Ok(Box::new(Cursor::new(data.as_slice()))),
            Self::Path(path) => {
                let file = File::open(path).map_err(|source| self.io_error(source))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    pub fn read_to_string(&self) -> Result<String, SourceError> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Bytes { data, .. } => {
                String::from_utf8(data.clone()).map_err(|_| SourceError::Encoding {
                    location: self.describe(),
                })
            }
            Self::Path(_) => {
                let mut raw = Vec::new();
                self.open()?
                    .read_to_end(&mut raw)
                    .map_err(|source| self.io_error(source))?;
                String::from_utf8(raw).map_err(|_| SourceError::Encoding {
                    location: self.describe(),
                })
            }
        }
    }

    /// Hex-encoded SHA-256 of the source content, for correlating log lines.
    pub fn sha256_hex(&self) -> Result<String, SourceError> {
        let mut hasher = Sha256::new();
        let mut reader = self.open()?;
        loop {
            let chunk = reader.fill_buf().map_err(|source| self.io_error(source))?;
            if chunk.is_empty() {
                break;
            }
            hasher.update(chunk);
            let used = chunk.len();
            reader.consume(used);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Digest for the `sha256` field of log events; `-` when the source
    /// cannot be read.
    pub(crate) fn log_digest(&self) -> String {
        self.sha256_hex().unwrap_or_else(|_| "-".to_string())
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Io {
            location: self.describe(),
            source,
        }
    }
}

impl From<&str> for DocumentSource {
    fn from(xml: &str) -> Self {
        Self::Text(xml.to_string())
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn path_source_reads_file_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<Hotels/>").unwrap();
        let source = DocumentSource::path(file.path());
        assert_eq!(source.read_to_string().unwrap(), "<Hotels/>");
        assert_eq!(source.describe(), file.path().display().to_string());
    }

    #[test]
    fn missing_path_reports_location() {
        let source = DocumentSource::path("/definitely/not/here/Hotels.xml");
        let err = source.read_to_string().unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here/Hotels.xml"));
    }

    #[test]
    fn invalid_utf8_bytes_are_rejected() {
        let source = DocumentSource::bytes("https://example.test/h.xml", vec![0xff, 0xfe, 0x00]);
        let err = source.read_to_string().unwrap_err();
        assert!(matches!(err, SourceError::Encoding { .. }));
    }

    #[test]
    fn digest_matches_known_value() {
        let source = DocumentSource::text("abc");
        assert_eq!(
            source.sha256_hex().unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn log_digest_agrees_with_in_memory_digest() {
        let xml = "<Hotels/>";
        assert_eq!(
            DocumentSource::bytes("mem", xml.as_bytes().to_vec()).log_digest(),
            compute_sha256_hex(xml.as_bytes())
        );
        assert_eq!(DocumentSource::path("/no/such/Hotels.xml").log_digest(), "-");
    }
}
