use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use http::Method;
use tracing::info;

use crate::config::RestConfig;
use crate::demo::{article_controller, ArticleStore};
use crate::format::FormatRegistry;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::server::{RestRequest, RestResponse, RestService};

/// Command-line interface for the dispatch layer
#[derive(Parser, Debug)]
#[command(name = "rest-dispatch")]
#[command(about = "Run requests through the REST dispatch layer", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch one request against the demo article controller
    Request {
        /// HTTP verb
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Path below the controller, e.g. `/5.json` or `/search/term`
        #[arg(short, long, default_value = "/")]
        path: String,

        /// `Name: value` header, may be repeated
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Raw request body
        #[arg(short = 'd', long)]
        body: Option<String>,

        /// YAML configuration file
        #[arg(short, long, env = "REST_CONFIG")]
        config: Option<PathBuf>,
    },
    /// List registered formats
    Formats,
}

/// Split a `Name: value` header argument.
///
/// # Errors
///
/// Fails when there is no `:` or the name is empty.
pub fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("header '{raw}' is not in 'Name: value' form"))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("header '{raw}' has an empty name");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RestConfig> {
    let config = match path {
        Some(path) => RestConfig::from_yaml_file(path)?,
        None => RestConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

fn write_response(out: &mut dyn Write, res: &RestResponse) -> anyhow::Result<()> {
    writeln!(
        out,
        "HTTP/1.1 {} {}",
        res.status.as_u16(),
        res.status.canonical_reason().unwrap_or("")
    )?;
    for (name, value) in &res.headers {
        writeln!(out, "{name}: {value}")?;
    }
    writeln!(out)?;
    match std::str::from_utf8(&res.body) {
        Ok(text) => writeln!(out, "{text}")?,
        Err(_) => {
            let hex: Vec<String> = res.body.iter().map(|b| format!("{b:02x}")).collect();
            writeln!(out, "<{} bytes binary> {}", res.body.len(), hex.join(" "))?;
        }
    }
    Ok(())
}

/// Run a parsed command, writing its report to `out`.
///
/// # Errors
///
/// Invalid arguments, unreadable configuration or write failures. Request
/// failures are printed as error responses rather than returned.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Request {
            method,
            path,
            headers,
            body,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;

            let mut req = RestRequest::from_path(method, path);
            for raw in headers {
                let (name, value) = parse_header(raw)?;
                req = req.with_header(&name, value);
            }
            if let Some(body) = body {
                req = req.with_body(body.as_bytes());
            }

            let store = Arc::new(ArticleStore::seeded());
            let service = RestService::new(article_controller(store), &config)?;
            info!(request_id = %req.request_id, path = %path, "Dispatching CLI request");
            write_response(out, &service.respond(&req))
        }
        Commands::Formats => {
            for format in FormatRegistry::with_defaults().iter() {
                writeln!(
                    out,
                    "{:<6} ext: {:<12} mime: {}",
                    format.id(),
                    format.extension_list().join(","),
                    format.mime_type_list().join(", ")
                )?;
            }
            Ok(())
        }
    }
}

/// Parse arguments, set up logging and run.
///
/// # Errors
///
/// See [`execute`].
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&LogConfig::from_env())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}
