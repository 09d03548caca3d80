//! `tavolo`: command-line front end over the tavolo session core.
//!
//! SYSTEM CONTEXT
//! ==============
//! The CLI keeps its bearer token in a file instead of `localStorage`, but
//! otherwise runs the exact session machinery the browser does: silent
//! resolution on start, the login flow, and the admin route guard.

mod http;

#[cfg(test)]
mod test_stub;


use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tavolo::config::{API_BASE_URL_ENV, ApiConfig};
use tavolo::context::SessionContext;
use tavolo::error::AuthError;
use tavolo::guard::{GuardDecision, RouteGuard};
use tavolo::login_flow::{self, LoginFlow};
use tavolo::session::SessionState;
use tavolo::store::FileStore;

use crate::http::HttpAuthApi;

type CliSession = SessionContext<FileStore, HttpAuthApi>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    LoginFailed(String),
    #[error("login required")]
    LoginRequired,
}

#[derive(Parser, Debug)]
#[command(name = "tavolo", about = "Tavolo admin session CLI")]
struct Cli {
    #[arg(long, env = API_BASE_URL_ENV)]
    api_url: Option<String>,

    #[arg(long, env = "TAVOLO_TOKEN_FILE", default_value = ".tavolo/token")]
    token_file: PathBuf,

    /// Log debug events to stderr.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange email and password for a token and store it.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TAVOLO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the identity behind the stored token.
    Whoami,
    /// Forget the stored token.
    Logout,
    /// GET an API path, with the bearer token attached when stored.
    Get { path: String },
    /// GET an admin-only API path; refuses locally unless the stored
    /// session belongs to an admin.
    Admin { path: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn api_config(api_url: Option<&str>) -> ApiConfig {
    api_url.map_or_else(ApiConfig::from_env, ApiConfig::new)
}

async fn run(cli: Cli) -> Result<String, CliError> {
    let api = HttpAuthApi::new(api_config(cli.api_url.as_deref()))?;
    let session = CliSession::new(FileStore::new(cli.token_file), api);
    tracing::debug!(
        api = session.api().config().base_url(),
        token_file = %session.store().path().display(),
        "session configured"
    );
    execute(&session, cli.command).await
}

async fn execute(session: &CliSession, command: Command) -> Result<String, CliError> {
    match command {
        Command::Login { email, password } => {
            let mut flow = LoginFlow::new();
            match login_flow::submit(&mut flow, session, &email, &password).await {
                Some(_) => Ok(describe(&session.state())),
                None => Err(CliError::LoginFailed(
                    flow.message().unwrap_or(tavolo::error::LOGIN_FAILED_FALLBACK).to_owned(),
                )),
            }
        }
        Command::Whoami => match session.start().await {
            state @ SessionState::Authenticated(_) => Ok(describe(&state)),
            SessionState::Anonymous | SessionState::Resolving => Err(CliError::LoginRequired),
        },
        Command::Logout => {
            session.logout();
            Ok("logged out".to_owned())
        }
        Command::Get { path } => Ok(session.fetch(&path).await?),
        Command::Admin { path } => {
            let state = session.start().await;
            let guard = RouteGuard::admin();
            tracing::debug!(required = ?guard.required(), session = state.tag(), "checking admin guard");
            match guard.evaluate(&state) {
                GuardDecision::Admit => Ok(session.fetch(&path).await?),
                GuardDecision::Pending | GuardDecision::Redirect { .. } => Err(CliError::LoginRequired),
            }
        }
    }
}

fn describe(state: &SessionState) -> String {
    match state.identity() {
        Some(identity) if identity.is_admin => format!("{} (admin)", identity.email),
        Some(identity) => identity.email.clone(),
        None => "not logged in".to_owned(),
    }
}
