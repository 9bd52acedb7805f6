use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use serde_json::Value;

use climate_gate::config::{load_config, AuthConfig, GateConfig};
use climate_gate::gate::{RouteClassifier, TokenSigner};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Operator CLI for the climate dashboard gate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a session token for local testing
    Mint {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        username: Option<String>,
        /// Defaults to `auth.session_ttl_days` from the config
        #[arg(long)]
        ttl_days: Option<i64>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,
    },
    /// Verify a token and print its claims
    Verify {
        token: String,
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,
    },
    /// Print the route category of a path
    Classify {
        path: String,
        /// Read gate prefixes from this config instead of the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check a running gateway
    Status {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Mint {
            user_id,
            email,
            username,
            ttl_days,
            config,
            secret,
        } => {
            let mut auth = match config {
                Some(file) => load_config(&file)?.auth,
                None => AuthConfig::default(),
            };
            if let Some(days) = ttl_days {
                auth.session_ttl_days = days;
            }
            let ttl = auth.session_ttl().ok_or("--ttl-days is out of range")?;

            let signer = TokenSigner::new(&SecretString::from(secret));
            let token = signer.issue_session(
                &user_id,
                email.as_deref(),
                username.as_deref(),
                ttl,
            )?;
            println!("{}", token);
        }
        Commands::Verify { token, secret } => {
            let signer = TokenSigner::new(&SecretString::from(secret));
            match signer.verify(&token) {
                Ok(claims) => println!("{}", serde_json::to_string_pretty(&claims)?),
                Err(e) => {
                    eprintln!("Invalid token: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Classify { path, config } => {
            let gate = match config {
                Some(file) => load_config(&file)?.gate,
                None => GateConfig::default(),
            };
            println!("{}", RouteClassifier::from_config(&gate).classify(&path));
        }
        Commands::Status { url } => {
            let res = reqwest::get(format!("{}/healthz", url.trim_end_matches('/'))).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
