//! Provisioning tool for the token authority
//!
//! Reads the same `AUTH_*` environment (and `.env`) as the services, so a
//! token issued here verifies wherever that configuration is deployed.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jwt_security::{
    generate_secret, validate_secret_strength, AuthConfig, AuthError, SecretStrength,
    TokenAuthority, UserIdentity, UserRole,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Generate signing secrets, issue tokens and inspect them.
#[derive(Parser, Debug)]
#[command(name = "authctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a new random signing secret, hex encoded
    GenSecret {
        /// Number of random bytes (the output has twice as many characters)
        #[arg(long, default_value_t = 64)]
        length: usize,
    },

    /// Grade the configured AUTH_SECRET_KEY
    CheckSecret,

    /// Issue a token signed with the configured secret
    Issue(IssueArgs),

    /// Verify a token and print its claims as JSON
    Verify {
        token: String,

        /// Fail unless the token carries one of these roles (repeatable)
        #[arg(long = "role", value_name = "ROLE")]
        roles: Vec<UserRole>,
    },
}

#[derive(Args, Debug)]
struct IssueArgs {
    #[arg(long)]
    user_id: u32,

    #[arg(long, default_value = "")]
    username: String,

    #[arg(long, default_value = "")]
    email: String,

    #[arg(long, default_value = "")]
    first_name: String,

    #[arg(long, default_value = "")]
    last_name: String,

    /// admin, operator, viewer or unspecified
    #[arg(long, default_value_t = UserRole::Viewer)]
    role: UserRole,

    #[arg(long)]
    user_agent: Option<String>,

    #[arg(long)]
    ip: Option<String>,
}

impl From<IssueArgs> for UserIdentity {
    fn from(args: IssueArgs) -> Self {
        UserIdentity {
            user_id: args.user_id,
            first_name: args.first_name,
            last_name: args.last_name,
            username: args.username,
            email: args.email,
            role: args.role,
            user_agent: args.user_agent,
            ip: args.ip,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let output = run(cli.command)?;
    println!("{output}");
    Ok(())
}

fn run(command: Command) -> Result<String> {
    match command {
        Command::GenSecret { length } => gen_secret(length),
        Command::CheckSecret => Ok(check_secret(&load_config()?)),
        Command::Issue(args) => issue(&load_config()?, args.into()),
        Command::Verify { token, roles } => verify(&load_config()?, &token, &roles),
    }
}

fn load_config() -> Result<AuthConfig> {
    AuthConfig::from_env().context("failed to load AUTH_* configuration")
}

fn gen_secret(length: usize) -> Result<String> {
    let secret = generate_secret(length).context("failed to generate secret")?;

    if validate_secret_strength(secret.as_bytes()) == SecretStrength::Weak {
        warn!(length, "Generated secret is weak, use a larger --length");
    }
    info!(length, "Generated secret");
    Ok(secret)
}

fn check_secret(config: &AuthConfig) -> String {
    let strength = validate_secret_strength(config.secret_key.as_bytes());
    format!("{:?} ({} bytes)", strength, config.secret_key.len())
}

fn issue(config: &AuthConfig, identity: UserIdentity) -> Result<String> {
    let authority = TokenAuthority::from_config(config)?;
    let token = authority.issue(&identity)?;
    info!(
        user_id = identity.user_id,
        role = %identity.role,
        valid_secs = config.token_valid_secs,
        "Issued token"
    );
    Ok(token)
}

fn verify(config: &AuthConfig, token: &str, roles: &[UserRole]) -> Result<String> {
    let authority = TokenAuthority::from_config(config)?;
    let claims = authority.verify(token)?;

    if !roles.is_empty() && !claims.has_any_role(roles) {
        return Err(AuthError::RoleMismatch.into());
    }

    serde_json::to_string_pretty(&claims).context("failed to render claims")
}
