use std::collections::BTreeMap;
use std::future::Future;

use crate::domain::{Account, AuditEvent, Error};

pub type Accounts = BTreeMap<String, Account>;

/// Durable backing for the ledger. `save` replaces the whole snapshot.
pub trait LedgerStorage {
    fn load(&self) -> Result<Accounts, Error>;

    fn save(&self, accounts: &Accounts) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Write-only sink for protocol events.
pub trait AuditLog {
    fn record(&self, event: &AuditEvent);
}
