use crate::server;
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use leadflow::auth::{sign_session, Role};
use leadflow::config::AppConfig;
use leadflow::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Lead Pipeline Service",
    about = "Run the lead lifecycle and notification pipeline from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Issue a signed operator session token
    MintSession(MintSessionArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct MintSessionArgs {
    /// Operator display name embedded in the token
    #[arg(long)]
    name: String,
    /// Role tier: admin, manager, or agent
    #[arg(long, default_value = "agent")]
    role: String,
    /// Fixed assignee scope for non-management roles
    #[arg(long)]
    assignee: Option<String>,
    /// Override the configured token lifetime, in minutes
    #[arg(long)]
    ttl_minutes: Option<i64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::MintSession(args) => mint_session(args),
    }
}

fn mint_session(args: MintSessionArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let role = Role::parse(&args.role).ok_or_else(|| {
        AppError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("unknown role '{}'", args.role),
        ))
    })?;

    let ttl = args.ttl_minutes.unwrap_or(config.session.ttl_minutes);
    let expires_at = Utc::now() + Duration::minutes(ttl);
    let token = sign_session(
        &config.session.secret,
        &args.name,
        role,
        args.assignee.as_deref(),
        expires_at,
    )?;

    println!("{token}");
    Ok(())
}
