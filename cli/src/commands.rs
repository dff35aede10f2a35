use crate::fetch;
use anyhow::{Context, Result};
use config::AppConfig;
use hotels_xml_core::{to_object_graph, validate, Diagnostic, ValidationReport};

/// Validation never fails outright: a source that cannot be fetched is
/// reported the same way the core reports one it cannot read.
async fn validation_report(
    client: &reqwest::Client,
    document: &str,
    schema: &str,
) -> ValidationReport {
    let fetched = async {
        let document = fetch::resolve(client, document).await?;
        let schema = fetch::resolve(client, schema).await?;
        anyhow::Ok((document, schema))
    };
    match fetched.await {
        Ok((document, schema)) => validate(&document, &schema),
        Err(err) => {
            tracing::warn!(error = %err, "source fetch failed");
            ValidationReport::new(vec![Diagnostic::fatal(format!(
                "source unreadable: {err:#}"
            ))])
        }
    }
}

async fn render_json(client: &reqwest::Client, document: &str, compact: bool) -> Result<String> {
    let source = fetch::resolve(client, document).await?;
    let graph = to_object_graph(&source)?;
    let json = if compact {
        serde_json::to_string(&graph)?
    } else {
        serde_json::to_string_pretty(&graph)?
    };
    Ok(json)
}

pub async fn validate_document(
    client: &reqwest::Client,
    document: &str,
    schema: &str,
    json: bool,
) -> Result<bool> {
    let report = validation_report(client, document, schema).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(report.is_valid())
}

pub async fn convert_document(client: &reqwest::Client, document: &str, compact: bool) -> Result<()> {
    let json = render_json(client, document, compact).await?;
    println!("{json}");
    Ok(())
}

/// Runs the three steps in sequence: validate the good document, validate the
/// error document, convert the good document.
pub async fn check(client: &reqwest::Client, cfg: &AppConfig) -> Result<bool> {
    let sources = &cfg.sources;
    let mut ok = true;

    for document in [&sources.document, &sources.error_document] {
        println!("---- Validation: {document} ----");
        let report = validation_report(client, document, &sources.schema).await;
        println!("{report}");
        println!();
    }

    println!("---- Convert: {} ----", sources.document);
    match render_json(client, &sources.document, false).await {
        Ok(json) => println!("{json}"),
        Err(err) => {
            println!("error: {err:#}");
            ok = false;
        }
    }
    Ok(ok)
}

pub fn show_config() -> Result<()> {
    let cfg = config::load()?;
    println!("# {}", config::path()?.display());
    println!(
        "{}",
        serde_json::to_string_pretty(&cfg).context("Failed to render config")?
    );
    Ok(())
}

pub fn update_config(
    document: Option<String>,
    error_document: Option<String>,
    schema: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let mut cfg = config::load().unwrap_or_default();

    if let Some(document) = document {
        cfg.sources.document = document;
    }
    if let Some(error_document) = error_document {
        cfg.sources.error_document = error_document;
    }
    if let Some(schema) = schema {
        cfg.sources.schema = schema;
    }
    if let Some(timeout_secs) = timeout_secs {
        cfg.http.timeout_secs = timeout_secs;
    }

    config::store(&cfg)?;
    tracing::info!("Settings updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn missing_local_document_gives_fatal_report() {
        let client = fetch::http_client(1).unwrap();
        let report = validation_report(&client, "/no/such/Hotels.xml", "/no/such/Hotels.xsd").await;
        assert!(report.is_fatal());
        assert_eq!(report.diagnostics().len(), 1);
    }

    #[tokio::test]
    async fn render_json_reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<Hotels><Hotel><Name>Inn</Name><Phone>1</Phone><Address NearestAirport="PHX"><Number>1</Number><Street>S</Street><City>C</City><State>AZ</State><Zip>1</Zip></Address></Hotel></Hotels>"#
        )
        .unwrap();
        let client = fetch::http_client(1).unwrap();
        let json = render_json(&client, file.path().to_str().unwrap(), true)
            .await
            .unwrap();
        assert!(json.starts_with(r#"{"Hotels":{"Hotel":[{"Name":"Inn""#));
    }
}
