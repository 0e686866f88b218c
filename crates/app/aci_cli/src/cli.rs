use clap::{Parser, Subcommand};

use aci_api::services::admin::GENERATED_PASSWORD_LENGTH;

#[derive(Parser, Debug)]
#[command(name = "aci_cli", version, about = "ACI Dashboard operator tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the CLI version.
    Version,

    /// Read a password from stdin and print its bcrypt hash.
    HashPassword {
        /// bcrypt cost; defaults to BCRYPT_ROUNDS or 12.
        #[arg(long, value_parser = clap::value_parser!(u32).range(4..=31))]
        cost: Option<u32>,

        /// Hash even if the password breaks the password policy.
        #[arg(long, default_value_t = false)]
        skip_policy: bool,
    },

    /// Read a password from stdin and check it against a bcrypt hash.
    VerifyPassword {
        /// Stored bcrypt hash.
        #[arg(long)]
        hash: String,
    },

    /// Print a random password that satisfies the password policy.
    GeneratePassword {
        #[arg(long, default_value_t = GENERATED_PASSWORD_LENGTH)]
        length: usize,
    },

    /// Load server configuration from the environment and report problems.
    CheckConfig,
}
