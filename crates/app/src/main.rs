//! Authgate - Main Entry Point
//!
//! Command-line front end that loads settings, wires the configured
//! providers and token store into an [`AuthService`], and runs one
//! auth operation.

use std::path::PathBuf;
use std::process::ExitCode;

use authgate_application::AuthService;
use authgate_domain::{AuthOutcome, AuthPayload};
use authgate_infrastructure::{AuthSettings, build_registry, build_token_store};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value, json};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "authgate", version, about = "Authenticate against configured providers")]
struct Cli {
    /// Settings file (TOML, JSON or YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the received token
    Login {
        provider: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and store the received token
    Register {
        provider: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign out and clear the stored token
    Logout { provider: String },
    /// Ask for password reset instructions
    RequestPassword {
        provider: String,
        #[arg(long)]
        email: String,
    },
    /// Set a new password
    ResetPassword {
        provider: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        reset_token: Option<String>,
    },
    /// Show the stored token
    Status,
    /// List configured providers
    Providers,
}

fn payload(fields: &[(&str, Option<&str>)]) -> AuthPayload {
    let map: Map<String, Value> = fields
        .iter()
        .filter_map(|(key, value)| value.map(|v| ((*key).to_string(), json!(v))))
        .collect();
    AuthPayload::new(Value::Object(map))
}

fn print_outcome(outcome: &AuthOutcome) {
    println!("success: {}", outcome.is_success());
    for message in outcome.messages() {
        println!("message: {message}");
    }
    for error in outcome.errors() {
        println!("error: {error}");
    }
    if let Some(redirect) = outcome.redirect() {
        println!("redirect: {redirect}");
    }
    println!("token: {}", if outcome.has_token() { "stored" } else { "none" });
}

async fn print_status(service: &AuthService) -> Result<(), Box<dyn std::error::Error>> {
    match service.token().await? {
        Some(token) if token.is_present() => {
            println!("authenticated: true");
            println!("kind: {:?}", token.kind);
            println!("created_at: {}", token.created_at.to_rfc3339());
            if let Some(expires_at) = token.expires_at {
                println!("expires_at: {}", expires_at.to_rfc3339());
            }
        }
        _ => println!("authenticated: false"),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let settings = AuthSettings::load(cli.config.as_deref())?;
    let registry = build_registry(&settings)?;
    let store = build_token_store(&settings.store).await?;
    let service = AuthService::new(registry, store);

    let outcome = match cli.command {
        Command::Login {
            provider,
            email,
            password,
        } => {
            let payload = payload(&[
                ("email", Some(email.as_str())),
                ("password", Some(password.as_str())),
            ]);
            service.authenticate(&provider, &payload).await?
        }
        Command::Register {
            provider,
            email,
            password,
            name,
        } => {
            let payload = payload(&[
                ("email", Some(email.as_str())),
                ("password", Some(password.as_str())),
                ("name", name.as_deref()),
            ]);
            service.register(&provider, &payload).await?
        }
        Command::Logout { provider } => service.logout(&provider).await?,
        Command::RequestPassword { provider, email } => {
            let payload = payload(&[("email", Some(email.as_str()))]);
            service.request_password(&provider, &payload).await?
        }
        Command::ResetPassword {
            provider,
            password,
            reset_token,
        } => {
            let payload = payload(&[
                ("password", Some(password.as_str())),
                ("reset_password_token", reset_token.as_deref()),
            ]);
            service.reset_password(&provider, &payload).await?
        }
        Command::Status => {
            print_status(&service).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Providers => {
            for name in service.registry().names() {
                println!("{name}");
            }
            return Ok(ExitCode::SUCCESS);
        }
    };

    print_outcome(&outcome);
    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
