#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use thiserror::Error;

/// Error code constants for type-safe error handling
pub mod code {
    pub const CLI_ERROR: &str = "CLI_ERROR";
    pub const NOTFOUND: &str = "NOTFOUND";
    pub const INVALID: &str = "INVALID";
    pub const DEPENDENCY: &str = "DEPENDENCY";
    pub const REJECTED: &str = "REJECTED";
    pub const INTERNAL: &str = "INTERNAL";
}

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Invalid usage: {0}")]
    CliError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cell error: {0}")]
    CellError(String),

    #[error("BoC error: {0}")]
    BocError(String),

    #[error("Address error: {0}")]
    AddressError(String),

    #[error("Amount error: {0}")]
    AmountError(String),

    #[error("Initializer error: {0}")]
    InitError(String),

    #[error("Deploy failed: {0}")]
    DeployFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Link error: {0}")]
    LinkError(#[from] url::ParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeployError {
    /// Returns the protocol error code for this error
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CliError(_) => code::CLI_ERROR,
            Self::ConfigError(_)
            | Self::AmountError(_)
            | Self::AddressError(_)
            | Self::SerializationError(_)
            | Self::BocError(_)
            | Self::CellError(_) => code::INVALID,
            Self::InitError(_) => code::NOTFOUND,
            Self::IoError(_) => code::DEPENDENCY,
            Self::DeployFailed(_) => code::REJECTED,
            Self::LinkError(_) | Self::Internal(_) => code::INTERNAL,
        }
    }

    /// Returns the exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::CliError(_) => 1,
            Self::ConfigError(_) => 2,
            Self::CellError(_) | Self::BocError(_) => 3,
            Self::AddressError(_) => 4,
            Self::AmountError(_) => 5,
            Self::InitError(_) => 6,
            Self::DeployFailed(_) => 7,
            Self::IoError(_) => 8,
            Self::SerializationError(_) => 9,
            Self::LinkError(_) | Self::Internal(_) => 10,
        }
    }
}

/// Protocol error codes as documented in the CLI
pub const ERROR_CODES: &[(&str, &str, &str)] = &[
    (
        code::CLI_ERROR,
        "Invalid CLI usage",
        "Run 'deploy --help' for valid options",
    ),
    (
        code::NOTFOUND,
        "Contract artifacts were not found",
        "Run the Tact build so that build/ contains the compiled package",
    ),
    (
        code::INVALID,
        "Invalid input or malformed artifact",
        "Check the configuration values and rebuild the contract",
    ),
    (
        code::DEPENDENCY,
        "Filesystem or system dependency failure",
        "Check file permissions and paths, then retry",
    ),
    (
        code::REJECTED,
        "Deployment was rejected",
        "Inspect the deploy helper output and retry",
    ),
    (
        code::INTERNAL,
        "Unexpected internal failure",
        "Inspect logs with RUST_LOG=debug and retry",
    ),
];

/// Get error code details (description and fix) for a given error code
#[must_use]
pub fn get_error_info(error_code: &str) -> Option<(&'static str, &'static str)> {
    ERROR_CODES
        .iter()
        .find(|(code, _, _)| *code == error_code)
        .map(|(_, desc, fix)| (*desc, *fix))
}

pub type Result<T> = std::result::Result<T, DeployError>;
