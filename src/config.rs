use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::Error;

pub const DEFAULT_PORT: u16 = 2540;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub ledger_path: PathBuf,
    pub audit_log_path: PathBuf,
    /// Idle limit per read; `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            ledger_path: PathBuf::from("accounts.json"),
            audit_log_path: PathBuf::from("server.log"),
            read_timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();

        let read_timeout = match parse_var::<u64>(&lookup, "BANK_READ_TIMEOUT_SECS")? {
            None | Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            host: lookup("BANK_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "BANK_PORT")?.unwrap_or(defaults.port),
            ledger_path: lookup("BANK_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ledger_path),
            audit_log_path: lookup("BANK_AUDIT_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.audit_log_path),
            read_timeout,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ClientConfig {
    /// Same keys as the server: `BANK_HOST`, `BANK_PORT`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("BANK_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "BANK_PORT")?.unwrap_or(defaults.port),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, Error> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{}={:?} is not valid", key, raw))),
    }
}
