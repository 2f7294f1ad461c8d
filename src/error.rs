use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount for {address}: {value}")]
    InvalidAmount { address: String, value: String },

    #[error("Duplicate whitelist entry for address {0}")]
    DuplicateAddress(String),

    #[error("Invalid vesting config for {address}: {reason}")]
    InvalidVestingConfig { address: String, reason: String },

    #[error("Whitelist is empty")]
    EmptyWhitelist,

    #[error("Unsupported whitelist format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type AllocationResult<T> = Result<T, AllocationError>;
