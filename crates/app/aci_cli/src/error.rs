use aci_core::auth::{PasswordError, PolicyViolation};
use aci_core::settings::ConfigError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("Configuration: {}", .0)]
    Config(#[from] ConfigError),

    #[error("Password: {}", .0)]
    Password(#[from] PasswordError),

    #[error("Password policy: {}", .0)]
    Policy(#[from] PolicyViolation),
}
