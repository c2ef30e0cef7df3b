#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error("Ledger file is corrupt: {0}")]
    CorruptLedger(#[from] serde_json::Error),

    #[error("Invalid ledger entry: {0}")]
    InvalidLedger(String),

    #[error("Persisting the ledger failed with: {0}")]
    Persistence(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Insufficient funds for account {0}")]
    InsufficientFunds(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
