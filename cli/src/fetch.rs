use anyhow::{Context, Result};
use hotels_xml_core::DocumentSource;
use std::time::Duration;

pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

/// Turns a path or URL into a document source. URLs are downloaded in full;
/// paths are left for the core to open.
pub async fn resolve(client: &reqwest::Client, reference: &str) -> Result<DocumentSource> {
    if !is_remote(reference) {
        return Ok(DocumentSource::path(reference));
    }
    let response = client
        .get(reference)
        .send()
        .await
        .with_context(|| format!("cannot fetch {reference}"))?
        .error_for_status()
        .with_context(|| format!("cannot fetch {reference}"))?;
    let body = response
        .bytes()
        .await
        .with_context(|| format!("cannot read body of {reference}"))?;
    tracing::debug!(url = %reference, bytes = body.len(), "fetched source");
    Ok(DocumentSource::bytes(reference, body.to_vec()))
}
