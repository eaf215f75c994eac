//! tokenctl entry point
//!
//! Issues and checks tokens with the keys configured in the environment.

mod args;

use std::process::ExitCode;

use error::{AppError, ErrorResponse};
use token_auth::{TokenConfig, TokenService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::Command;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tokenctl=info,token_auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            let response = ErrorResponse::from(e);
            match serde_json::to_string(&response) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}: {}", response.code, response.message),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> error::Result<ExitCode> {
    match Command::parse(args)? {
        Command::Help => {
            print_help();
        }
        Command::Issue { kind, hours, claims } => {
            let service = load_service()?;
            let token = match hours {
                Some(hours) => service.issue(&claims, hours, kind)?,
                None => service.issue_with_default_expiry(&claims, kind)?,
            };
            println!("{}", token);
        }
        Command::Claims { kind, token } => {
            let claims = load_service()?.extract_all_claims(&token, kind)?;
            let json = serde_json::to_string_pretty(&claims)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            println!("{}", json);
        }
        Command::Validate { kind, token } => {
            let status = load_service()?.validate_token(&token, kind)?;
            println!("{}", status);
            if !status.is_ok() {
                return Ok(ExitCode::from(2));
            }
        }
        Command::Microservice { token } => {
            let allowed = load_service()?.is_microservice(Some(token.as_str()))?;
            println!("{}", allowed);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_service() -> error::Result<TokenService> {
    let config = TokenConfig::from_env()?;
    tracing::debug!("Loaded configuration: {:?}", config);
    Ok(TokenService::new(config)?)
}

fn print_help() {
    println!("tokenctl - issue and check dual-key HS256 tokens");
    println!();
    println!("Usage:");
    println!("  tokenctl issue [--key access|global] [--hours N] [name=value ...]");
    println!("  tokenctl claims [--key access|global] <token>");
    println!("  tokenctl validate [--key access|global] <token>");
    println!("  tokenctl microservice <token>");
    println!();
    println!("Tokens may carry a leading 'Bearer ' prefix. Claim values are read");
    println!("as JSON when they parse, otherwise as strings.");
    println!();
    println!("Exit status:");
    println!("  0  success (validate: 200)");
    println!("  1  error");
    println!("  2  validate returned 401 or 423");
    println!();
    println!("Environment Variables:");
    println!("  TOKEN_GLOBAL_KEY                 Secret shared between services (>= 32 bytes)");
    println!("  TOKEN_ACCESS_KEY                 Secret for this service (>= 32 bytes)");
    println!("  TOKEN_DEFAULT_EXPIRATION_HOURS   Lifetime used when --hours is omitted (default: 24)");
    println!("  TOKEN_LEEWAY_SECS                Tolerated clock skew (default: 0)");
    println!("  RUST_LOG                         Log filter (default: tokenctl=info,token_auth=info)");
}
