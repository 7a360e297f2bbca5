use clap::{Args, Parser, Subcommand};
use critzone::config::{API_KEY_ENV, API_URL_ENV, DEFAULT_API_URL};
use critzone::error::ConfigError;
use critzone::validate::{LoginForm, SignupForm};
use critzone::{ApiConfig, ApiError, Auth, AuthError, InitOutcome, LogoutOutcome, SessionStore};
use tracing_subscriber::EnvFilter;

mod cookies;
mod http;

use cookies::CookieJar;
use http::HttpAuthApi;

pub const SESSION_COOKIE_ENV: &str = "CRITZONE_SESSION_COOKIE";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not logged in; pass --session-cookie or set CRITZONE_SESSION_COOKIE")]
    NotLoggedIn,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("{}", .0.user_message())]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "critzone", about = "Critzone auth API CLI")]
struct Cli {
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    base_url: String,

    #[arg(long, env = API_KEY_ENV, default_value = "", hide_env_values = true)]
    api_key: String,

    /// `Cookie` header value printed by a previous `login`.
    #[arg(long, env = SESSION_COOKIE_ENV, hide_env_values = true)]
    session_cookie: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the API health endpoint.
    Ping,
    Login(LoginArgs),
    HostLogin(LoginArgs),
    Signup(SignupArgs),
    HostSignup(SignupArgs),
    /// Show the identity behind the current session cookie.
    Me,
    Logout,
    /// Email a new one-time verification code.
    ResendOtp,
    VerifyOtp {
        code: String,
    },
    /// Mint a new access cookie from the refresh cookie.
    Refresh,
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "CRITZONE_PASSWORD", hide_env_values = true)]
    password: String,
}

impl From<LoginArgs> for LoginForm {
    fn from(args: LoginArgs) -> Self {
        Self { email: args.email, password: args.password }
    }
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    phone: String,

    #[arg(long, env = "CRITZONE_PASSWORD", hide_env_values = true)]
    password: String,

    /// Defaults to `--password`.
    #[arg(long)]
    confirm_password: Option<String>,
}

impl From<SignupArgs> for SignupForm {
    fn from(args: SignupArgs) -> Self {
        let confirm_password = args.confirm_password.unwrap_or_else(|| args.password.clone());
        Self {
            username: args.username,
            email: args.email,
            phone: args.phone,
            password: args.password,
            confirm_password,
        }
    }
}

type CliAuth = Auth<HttpAuthApi>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ApiConfig::new(&cli.base_url, &cli.api_key)?;
    let jar = cli.session_cookie.as_deref().map(CookieJar::parse).unwrap_or_default();
    let auth = Auth::new(HttpAuthApi::new(config, jar)?, SessionStore::new());

    match cli.command {
        Command::Ping => run_ping(&auth).await,
        Command::Login(args) => run_login(&auth, args.into(), false).await,
        Command::HostLogin(args) => run_login(&auth, args.into(), true).await,
        Command::Signup(args) => run_signup(&auth, args.into(), false).await,
        Command::HostSignup(args) => run_signup(&auth, args.into(), true).await,
        Command::Me => run_me(&auth).await,
        Command::Logout => run_logout(&auth).await,
        Command::ResendOtp => run_resend(&auth).await,
        Command::VerifyOtp { code } => run_verify(&auth, &code).await,
        Command::Refresh => run_refresh(&auth).await,
    }
}

async fn run_ping(auth: &CliAuth) -> Result<(), CliError> {
    let response = auth.api().health().await?;
    println!("{}", or_default(&response.message, "ok"));
    Ok(())
}

async fn run_login(auth: &CliAuth, form: LoginForm, host: bool) -> Result<(), CliError> {
    let success = if host { auth.host_login(&form).await? } else { auth.login(&form).await? };
    println!("{} (role: {})", success.message, success.role.as_str());
    print_session_cookie(auth);
    Ok(())
}

async fn run_signup(auth: &CliAuth, form: SignupForm, host: bool) -> Result<(), CliError> {
    let message = if host { auth.host_signup(&form).await? } else { auth.signup(&form).await? };
    println!("{message}");
    Ok(())
}

async fn run_me(auth: &CliAuth) -> Result<(), CliError> {
    require_session(auth).await?;
    if let Some(user) = auth.session().user {
        print_json(&serde_json::to_value(user)?)?;
    }
    Ok(())
}

async fn run_logout(auth: &CliAuth) -> Result<(), CliError> {
    match auth.logout().await {
        LogoutOutcome::Confirmed(message) => {
            println!("{message}");
            print_session_cookie(auth);
            Ok(())
        }
        LogoutOutcome::LocalOnly(err) => Err(err.into()),
    }
}

async fn run_resend(auth: &CliAuth) -> Result<(), CliError> {
    require_session(auth).await?;
    let message = auth.resend_verification().await?;
    println!("{message}");
    Ok(())
}

async fn run_verify(auth: &CliAuth, code: &str) -> Result<(), CliError> {
    require_session(auth).await?;
    let outcome = auth.verify_otp(code).await?;
    println!("{}", outcome.message());
    Ok(())
}

async fn run_refresh(auth: &CliAuth) -> Result<(), CliError> {
    let response = auth.api().refresh().await?;
    println!("{}", or_default(&response.message, "refreshed"));
    print_session_cookie(auth);
    Ok(())
}

/// Run the one-time session check and fail unless it finds a user.
async fn require_session(auth: &CliAuth) -> Result<(), CliError> {
    match auth.initialize().await {
        InitOutcome::Authenticated => Ok(()),
        InitOutcome::Unreachable(err) => Err(err.into()),
        InitOutcome::Anonymous | InitOutcome::AlreadyStarted => Err(CliError::NotLoggedIn),
    }
}

fn print_session_cookie(auth: &CliAuth) {
    match auth.api().cookie_header() {
        Some(header) => println!("{}", export_line(&header)),
        None => println!("unset {SESSION_COOKIE_ENV}"),
    }
}

/// Shell line that carries the session into the next invocation.
fn export_line(cookie_header: &str) -> String {
    let quoted = cookie_header.replace('\'', "'\\''");
    format!("export {SESSION_COOKIE_ENV}='{quoted}'")
}

fn or_default<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() { fallback } else { message }
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;
