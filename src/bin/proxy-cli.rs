use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use ssrf_proxy::config::{load_config, ProxyConfig};
use ssrf_proxy::guard::{AddressClassifier, ReservedRanges};
use ssrf_proxy::ProxyPipeline;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Operator CLI for the SSRF-safe proxy", long_about = None)]
struct Cli {
    /// Proxy base URL used by `fetch`.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Configuration file whose schemes and timeouts `check` applies.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, resolve and classify a target without fetching it
    Check { uri: String },
    /// Report whether an IP literal falls in reserved space
    Classify { ip: String },
    /// Fetch a target through a running proxy
    Fetch { uri: String },
    /// List the reserved address blocks
    Ranges,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    match cli.command {
        Commands::Check { uri } => {
            let pipeline = ProxyPipeline::from_config(&config)?;
            let verdict = match pipeline.guard().vet(&uri).await {
                Ok(vetted) => json!({
                    "uri": vetted.target().as_str(),
                    "host": vetted.target().hostname(),
                    "address": vetted.address().ip().to_string(),
                    "allowed": true,
                }),
                Err(e) => json!({
                    "uri": uri,
                    "allowed": false,
                    "stage": e.stage().as_str(),
                    "reason": e.to_string(),
                }),
            };
            print_json(&verdict)?;
        }
        Commands::Classify { ip } => {
            let classifier = AddressClassifier::new(Arc::new(ReservedRanges::standard()));
            let range = classifier.classify_literal(&ip);
            print_json(&json!({
                "ip": ip,
                "reserved": range.is_some(),
                "range": range,
            }))?;
        }
        Commands::Fetch { uri } => {
            let client = reqwest::Client::new();
            let res = client
                .get(format!("{}/", cli.url.trim_end_matches('/')))
                .query(&[("uri", uri.as_str())])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Ranges => {
            let ranges: Vec<Value> = ReservedRanges::standard()
                .iter()
                .map(|r| json!({ "cidr": r.net.to_string(), "label": r.label }))
                .collect();
            print_json(&Value::Array(ranges))?;
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    println!("Status: {}", status);
    for (name, value) in res.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();

    if !status.is_success() {
        let json: Value = res.json().await?;
        eprintln!("Error: {}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{}", res.text().await?);
    Ok(())
}
