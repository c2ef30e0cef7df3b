pub mod audit;
pub mod client;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod domain;
pub mod ledger;
pub mod server;
pub mod storage;

pub use audit::FileAuditLog;
pub use client::BankClient;
pub use config::{ClientConfig, ServerConfig};
pub use dispatcher::Dispatcher;
pub use domain::Error;
pub use ledger::Ledger;
pub use server::Server;
pub use storage::JsonFileStorage;
