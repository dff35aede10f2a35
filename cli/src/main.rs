mod args;
mod commands;
mod fetch;

use args::{Cli, Command, ConfigAction};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let cfg = config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Using default settings");
        config::AppConfig::default()
    });
    let client = fetch::http_client(cfg.http.timeout_secs)?;

    match cli.command.unwrap_or(Command::Check {
        document: None,
        error_document: None,
        schema: None,
    }) {
        Command::Validate {
            document,
            schema,
            json,
        } => commands::validate_document(&client, &document, &schema, json).await,
        Command::Convert { document, compact } => {
            commands::convert_document(&client, &document, compact).await?;
            Ok(true)
        }
        Command::Check {
            document,
            error_document,
            schema,
        } => {
            let mut cfg = cfg;
            if let Some(document) = document {
                cfg.sources.document = document;
            }
            if let Some(error_document) = error_document {
                cfg.sources.error_document = error_document;
            }
            if let Some(schema) = schema {
                cfg.sources.schema = schema;
            }
            commands::check(&client, &cfg).await
        }
        Command::Config { action } => {
            match action {
                ConfigAction::Show => commands::show_config()?,
                ConfigAction::Set {
                    document,
                    error_document,
                    schema,
                    timeout_secs,
                } => commands::update_config(document, error_document, schema, timeout_secs)?,
            }
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
