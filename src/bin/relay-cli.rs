use clap::Parser;
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Send a request through a running http-relay", long_about = None)]
struct Cli {
    /// Relay endpoint.
    #[arg(short, long, default_value = "http://localhost:8080")]
    relay: String,

    /// Upstream method (get, post, delete, put, patch).
    method: String,

    /// Upstream URL.
    url: String,

    /// Header to pass upstream, as `name:value`. Repeatable.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// JSON object sent as the upstream body.
    #[arg(short, long, value_parser = parse_data)]
    data: Option<Map<String, Value>>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected name:value, got '{}'", raw))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn parse_data(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("data must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

fn relay_body(cli: &Cli) -> Value {
    let mut body = Map::new();
    body.insert("method".into(), Value::String(cli.method.to_lowercase()));
    body.insert("url".into(), Value::String(cli.url.clone()));
    if !cli.headers.is_empty() {
        let headers = cli
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        body.insert("headers".into(), Value::Object(headers));
    }
    if let Some(data) = &cli.data {
        body.insert("data".into(), Value::Object(data.clone()));
    }
    Value::Object(body)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = client.post(&cli.relay).json(&relay_body(&cli)).send().await?;
    let success = res.status().is_success();
    print_response(res).await?;

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
