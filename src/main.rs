use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ideas_gateway::app::into_http;
use ideas_gateway::models::{Config, GenerationRequest, ImageRequest};
use ideas_gateway::{Gateway, GatewayError};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ideas-gateway")]
#[command(about = "Generate project ideas or images through the upstream model API")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate ideas from a JSON request body read from FILE (or stdin).
    Ideas {
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Generate one image.
    Image {
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        size: Option<String>,
    },
}

fn read_body(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request from {}", path.display())),
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read request from stdin")?;
            Ok(body)
        }
    }
}

/// Parse a request body the way the HTTP handler does: blank means `{}`.
fn parse_request(body: &str) -> std::result::Result<GenerationRequest, GatewayError> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|_| GatewayError::invalid_request("Invalid JSON body."))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ideas_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let credential = config.api_key.clone().unwrap_or_default();
    let gateway = Gateway::from_config(&config);

    let outcome = match args.command {
        Command::Ideas { input } => {
            let body = read_body(input.as_deref())?;
            match parse_request(&body) {
                Ok(request) => gateway.generate(&request, &credential).await,
                Err(e) => Err(e),
            }
        }
        Command::Image { prompt, size } => {
            gateway
                .generate_image(&ImageRequest { prompt, size }, &credential)
                .await
        }
    };

    let (status, body) = into_http(&outcome);
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "status": status, "body": body }))?
    );

    if (200..300).contains(&status) {
        info!("Request completed with status {}", status);
        Ok(())
    } else {
        error!("Request failed with status {}", status);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_request, read_body};
    use ideas_gateway::models::Mode;
    use ideas_gateway::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_parse_request_valid() {
        let request = parse_request(r#"{"prompt":"campus app","mode":"free-text"}"#).unwrap();
        assert_eq!(request.prompt, "campus app");
        assert_eq!(request.mode, Mode::FreeText);
    }

    #[test]
    fn test_parse_request_blank_body_is_empty_request() {
        let request = parse_request("  ").unwrap();
        assert!(request.prompt.is_empty());
    }

    #[test]
    fn test_parse_request_invalid_json() {
        let err = parse_request("{prompt:").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.message(), "Invalid JSON body.");
    }

    #[test]
    fn test_read_body_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"prompt":"from file"}}"#).unwrap();

        let body = read_body(Some(file.path())).unwrap();
        assert_eq!(parse_request(&body).unwrap().prompt, "from file");
    }

    #[test]
    fn test_read_body_missing_file() {
        let err = read_body(Some(std::path::Path::new("/nonexistent/request.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/request.json"));
    }
}
