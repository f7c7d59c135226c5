use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Command-line client for the inference bridge", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "BRIDGE_ACCESS_TOKEN", default_value = "")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask now and stream the answer
    Ask { prompt: String },
    /// Stage a prompt for the next queue run
    Queue { prompt: String },
    /// Process every staged prompt, one at a time
    RunQueue,
    /// Liveness check
    Ping,
    /// Show bridge status and pending task count
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
    );

    match cli.command {
        Commands::Ask { prompt } => {
            let res = client
                .post(format!("{}/ask", cli.url))
                .headers(headers)
                .json(&json!({ "prompt": prompt }))
                .send()
                .await?;
            print_events(res).await?;
        }
        Commands::Queue { prompt } => {
            let res = client
                .post(format!("{}/queue", cli.url))
                .headers(headers)
                .json(&json!({ "prompt": prompt }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::RunQueue => {
            let res = client
                .post(format!("{}/runqueue", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_events(res).await?;
        }
        Commands::Ping => {
            let res = client.get(format!("{}/ping", cli.url)).send().await?;
            println!("{}", res.text().await?);
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn report_failure(status: reqwest::StatusCode) -> bool {
    if status.is_success() {
        return false;
    }
    eprintln!("Error: bridge returned status {}", status);
    true
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    if report_failure(res.status()) {
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Print each server-sent event as `[event] data` while the stream is open.
async fn print_events(mut res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    if report_failure(res.status()) {
        return Ok(());
    }

    let mut buffer: Vec<u8> = Vec::new();
    while let Some(chunk) = res.chunk().await? {
        buffer.extend_from_slice(&chunk);
        while let Some(end) = buffer.windows(2).position(|w| w == b"\n\n") {
            let frame: Vec<u8> = buffer.drain(..end + 2).collect();
            print_frame(&String::from_utf8_lossy(&frame));
        }
    }
    Ok(())
}

fn print_frame(frame: &str) {
    let mut event = "message";
    let mut data = Vec::new();
    for line in frame.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if !data.is_empty() {
        println!("[{}] {}", event, data.join("\n"));
    }
}
