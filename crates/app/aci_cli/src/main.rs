// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::io::BufRead;

use aci_api::config::ApiConfig;
use aci_core::auth::password::{hash_password, verify_password};
use aci_core::settings::AuthConfig;
use clap::Parser;
use cli::{Cli, Commands};

mod cli;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;
    dotenvy::dotenv().ok();

    let args = Cli::parse();

    match &args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::HashPassword { cost, skip_policy } => {
            let password = read_password()?;
            let settings = password_settings()?;
            if !skip_policy {
                settings.password_policy.check(&password)?;
            }
            let cost = cost.unwrap_or(settings.bcrypt_cost);
            println!("{}", hash_password(&password, cost)?);
        }
        Commands::VerifyPassword { hash } => {
            let password = read_password()?;
            if !verify_password(&password, hash)? {
                return Err(Error::Custom("password does not match".into()));
            }
            println!("ok");
        }
        Commands::GeneratePassword { length } => {
            println!("{}", password_settings()?.password_policy.generate(*length));
        }
        Commands::CheckConfig => {
            let auth = AuthConfig::from_env()?;
            let api = ApiConfig::from_env();
            log::info!("bind address:        {}", api.bind_addr);
            log::info!("access token ttl:    {} min", auth.access_ttl_minutes);
            log::info!("refresh token ttl:   {} days", auth.refresh_ttl_days);
            log::info!("bcrypt cost:         {}", auth.bcrypt_cost);
            log::info!(
                "login rate limit:    {} per {}s",
                api.login_attempts_per_window,
                api.login_window_secs
            );
            println!("configuration ok");
        }
    }

    Ok(())
}

/// First line of stdin, without the trailing newline.
fn read_password() -> Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(Error::Custom("no password on stdin".into()));
    }
    Ok(password)
}

// Only the password settings matter here, so the JWT secrets are stubbed
// and these commands work on a machine without them.
fn password_settings() -> Result<AuthConfig> {
    let lookup = |key: &str| match key {
        "JWT_SECRET_KEY" => Some("unused-access".to_string()),
        "JWT_REFRESH_SECRET_KEY" => Some("unused-refresh".to_string()),
        _ => std::env::var(key).ok(),
    };
    Ok(AuthConfig::from_lookup(lookup)?)
}
