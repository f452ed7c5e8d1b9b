use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

use gatehouse::config::loader::{parse_duration, ENV_JWT_EXPIRES_IN, ENV_JWT_SECRET, ENV_JWT_SECRET_LEGACY};
use gatehouse::config::AuthConfig;
use gatehouse::security::TokenIssuer;

#[derive(Parser)]
#[command(name = "gatehouse-cli")]
#[command(about = "Development CLI for the gatehouse gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a signed credential
    IssueToken {
        /// Signing secret; falls back to JWT_SECRET
        #[arg(long)]
        secret: Option<String>,
        #[arg(long)]
        uid: String,
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "exec")]
        role: String,
        /// Lifetime such as `90s`, `15m` or `1.5h`; falls back to
        /// JWT_EXPIRES_IN, then the configured default
        #[arg(long)]
        lifetime: Option<String>,
    },
    /// Invoke an operation, e.g. `/main.ExecsService/WhoAmI`
    Call {
        method: String,
        #[arg(short, long, default_value = "http://localhost:50051")]
        url: String,
        #[arg(short, long)]
        token: Option<String>,
        /// JSON request body
        #[arg(short, long, default_value = "{}")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::IssueToken {
            secret,
            uid,
            username,
            role,
            lifetime,
        } => {
            let secret = secret
                .or_else(|| std::env::var(ENV_JWT_SECRET).ok())
                .or_else(|| std::env::var(ENV_JWT_SECRET_LEGACY).ok());
            let secret = match secret {
                Some(secret) => secret,
                None => return Err(format!("--secret or {} is required", ENV_JWT_SECRET).into()),
            };
            let lifetime: Duration = match lifetime.or_else(|| std::env::var(ENV_JWT_EXPIRES_IN).ok()) {
                Some(raw) => parse_duration(&raw).ok_or_else(|| format!("invalid lifetime {:?}", raw))?,
                None => AuthConfig::default().token_lifetime(),
            };

            let issued = TokenIssuer::new(&secret, lifetime)?.issue(&uid, &username, &role)?;
            println!("{}", issued.token);
            eprintln!("expires at {}", issued.expires_at.to_rfc3339());
        }
        Commands::Call {
            method,
            url,
            token,
            body,
        } => {
            let body: Value = serde_json::from_str(&body)?;

            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            if let Some(token) = token {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token))?,
                );
            }

            let path = method.trim_start_matches('/');
            let res = reqwest::Client::new()
                .post(format!("{}/{}", url.trim_end_matches('/'), path))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(elapsed) = res.headers().get("x-response-time") {
        eprintln!("x-response-time: {}", elapsed.to_str().unwrap_or("?"));
    }
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
