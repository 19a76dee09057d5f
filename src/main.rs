use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use hub_shell::config::{ClientConfig, ConfigError};
use hub_shell::net::{ApiRequest, Gateway, RequestError, api};
use hub_shell::router::{NavigationError, Navigator, Outcome, RouteTable, Router, Target};
use hub_shell::state::session::SessionStore;
use hub_shell::state::storage::FileStorage;
use tracing_subscriber::EnvFilter;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "hub-shell", about = "bench-hub console session shell")]
struct Cli {
    /// API base URL. Falls back to the dev proxy target when empty.
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in milliseconds. Must be positive.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// File the credential is persisted in.
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Page the console is on when the command runs.
    #[arg(long, default_value = "/")]
    location: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the credential.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "HUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the credential.
    Logout,
    /// Show whether a credential is held.
    Status,
    /// List the route table.
    Routes,
    /// Run a guarded navigation and print where it lands.
    Navigate { path: String },
    /// GET against the API, with the credential when one is held.
    Get { path: String },
    /// Public reachability check.
    Ping,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match &e {
            CliError::Request(req) => eprintln!("error [{}]: {e}", req.error_code()),
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(&cli)?;
    tracing::debug!(base_url = %config.api_base_url, timeout = ?config.timeout, "config loaded");

    let session = SessionStore::load(Arc::new(FileStorage::new(&config.session_file)));
    let router = Arc::new(Router::new(RouteTable::console(), session.clone()));
    router.navigate(&cli.location)?;
    let gateway = Gateway::new(&config, session.clone(), router.clone())?;

    match cli.command {
        Command::Login { username, password } => {
            router.navigate("/login")?;
            let user = api::login(&gateway, &username, &password).await?;
            router.navigate("/login")?;
            match user {
                Some(user) => println!("signed in as {}", user.username),
                None => println!("signed in"),
            }
            println!("location: {}", router.current_path());
        }
        Command::Logout => {
            api::logout(&gateway).await;
            router.navigate(&router.current_path())?;
            println!("signed out");
            println!("location: {}", router.current_path());
        }
        Command::Status => {
            if session.is_authenticated() {
                println!("authenticated");
            } else {
                println!("anonymous");
            }
        }
        Command::Routes => print_routes(router.routes()),
        Command::Navigate { path } => print_outcome(&path, &router.navigate(&path)?),
        Command::Get { path } => {
            let result = gateway.send(ApiRequest::get(path.as_str())).await;
            if let Err(e) = &result {
                if e.is_unauthorized() {
                    eprintln!("credential rejected; location: {}", router.current_path());
                }
            }
            print_body(&result?.body)?;
        }
        Command::Ping => {
            let data = api::ping(&gateway).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }
    Ok(())
}

/// Environment first, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.api_base_url = base_url.trim_end_matches('/').to_owned();
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout = Duration::from_millis(ms);
    }
    if let Some(path) = &cli.session_file {
        config.session_file.clone_from(path);
    }
    // A terminal has no page origin to resolve relative URLs against; talk to
    // the backend the dev proxy would have forwarded to.
    if config.api_base_url.is_empty() {
        config.api_base_url = config.proxy_target.trim_end_matches('/').to_owned();
    }
    Ok(config)
}

fn print_routes(routes: &RouteTable) {
    for route in routes.iter() {
        let target = match route.target {
            Target::View(view) => view.name().to_owned(),
            Target::Redirect(to) => format!("-> {to}"),
        };
        let access = match route.requires_auth {
            Some(false) => "public",
            _ => "auth",
        };
        println!("{:<12} {:<14} {access}", route.path, target);
    }
}

fn print_outcome(requested: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Arrived { path, view, redirected } => {
            let view = view.map_or("not found", |v| v.name());
            if *redirected {
                println!("{requested} redirected to {path} ({view})");
            } else {
                println!("{path} ({view})");
            }
        }
        Outcome::Superseded => println!("{requested} superseded"),
    }
}

fn print_body(body: &str) -> Result<(), CliError> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
