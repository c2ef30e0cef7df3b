use std::ffi::OsString;
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::domain::{Accounts, Error, LedgerStorage};

/// Ledger snapshot kept as a JSON object keyed by account id.
///
/// Saves go to a sibling `.tmp` file that is renamed over the ledger, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("ledger"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStorage for JsonFileStorage {
    fn load(&self) -> Result<Accounts, Error> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "ledger file not found, starting empty");
                Ok(Accounts::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, accounts: &Accounts) -> impl Future<Output = Result<(), Error>> + Send {
        let encoded = serde_json::to_vec_pretty(accounts);
        let path = self.path.clone();
        let staging = self.staging_path();

        async move {
            let encoded = encoded.map_err(|e| Error::Persistence(e.to_string()))?;
            let persist = async {
                let mut file = tokio::fs::File::create(&staging).await?;
                file.write_all(&encoded).await?;
                file.sync_all().await?;
                tokio::fs::rename(&staging, &path).await
            };
            persist
                .await
                .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e)))?;

            debug!(path = %path.display(), bytes = encoded.len(), "ledger persisted");
            Ok(())
        }
    }
}

/// Keeps the "persisted" snapshot in memory. Saves can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    initial: Accounts,
    saved: Mutex<Option<Accounts>>,
    fail_saves: AtomicBool,
}

impl MemoryStorage {
    pub fn new(initial: Accounts) -> Self {
        Self {
            initial,
            ..Self::default()
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Last successfully saved snapshot, if any.
    pub fn saved(&self) -> Option<Accounts> {
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LedgerStorage for MemoryStorage {
    fn load(&self) -> Result<Accounts, Error> {
        Ok(self.saved().unwrap_or_else(|| self.initial.clone()))
    }

    fn save(&self, accounts: &Accounts) -> impl Future<Output = Result<(), Error>> + Send {
        let result = if self.fail_saves.load(Ordering::SeqCst) {
            Err(Error::Persistence("storage unavailable".to_string()))
        } else {
            *self
                .saved
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(accounts.clone());
            Ok(())
        };
        std::future::ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, Money};
    use rust_decimal_macros::dec;

    fn accounts() -> Accounts {
        let mut accounts = Accounts::new();
        accounts.insert(
            "alice".to_string(),
            Account::new("secret", Money::new(dec!(100))),
        );
        accounts.insert("bob".to_string(), Account::new("hunter2", Money::new(dec!(0.25))));
        accounts
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("accounts.json"));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "{\"alice\": {\"password\": ").unwrap();

        let storage = JsonFileStorage::new(&path);
        assert!(matches!(storage.load(), Err(Error::CorruptLedger(_))));
    }

    #[test]
    fn reads_the_reference_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(
            &path,
            r#"{"alice": {"password": "secret", "balance": 100.0}, "bob": {"password": "x", "balance": 7}}"#,
        )
        .unwrap();

        let loaded = JsonFileStorage::new(&path).load().unwrap();
        assert_eq!(loaded["alice"].balance, Money::new(dec!(100)));
        assert_eq!(loaded["bob"].balance, Money::new(dec!(7)));
        assert!(loaded["alice"].password_matches("secret"));
    }

    #[tokio::test]
    async fn save_then_load_round_trips_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let storage = JsonFileStorage::new(&path);

        storage.save(&accounts()).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        let reloaded = storage.load().unwrap();
        assert_eq!(reloaded, accounts());

        storage.save(&reloaded).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), first);
        assert!(!storage.staging_path().exists());
    }

    #[tokio::test]
    async fn wide_balances_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let storage = JsonFileStorage::new(&path);

        let mut wide = Accounts::new();
        wide.insert(
            "alice".to_string(),
            Account::new("secret", Money::new(dec!(12345678901234567.8901))),
        );
        wide.insert(
            "bob".to_string(),
            Account::new("hunter2", Money::new(dec!(9999999999999.9999))),
        );

        storage.save(&wide).await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("12345678901234567.8901"), "{contents}");
        assert!(contents.contains("9999999999999.9999"), "{contents}");
        assert_eq!(storage.load().unwrap(), wide);
    }

    #[tokio::test]
    async fn save_into_missing_directory_reports_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("missing").join("accounts.json"));

        let err = storage.save(&accounts()).await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }
}
