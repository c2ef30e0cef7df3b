use tokio::sync::RwLock;
use tracing::{error, info};

use crate::domain::{Accounts, Error, LedgerStorage, Money};

/// The only owner of account balances.
///
/// Mutations hold the write lock across check, debit and persist, so concurrent
/// withdrawals serialize and readers only ever see committed snapshots.
#[derive(Debug)]
pub struct Ledger<S: LedgerStorage> {
    accounts: RwLock<Accounts>,
    storage: S,
}

impl<S: LedgerStorage> Ledger<S> {
    pub fn load(storage: S) -> Result<Self, Error> {
        let accounts = storage.load()?;

        if let Some((account_id, _)) = accounts.iter().find(|(_, a)| a.balance.is_negative()) {
            return Err(Error::InvalidLedger(format!(
                "account {} has a negative balance",
                account_id
            )));
        }

        info!(accounts = accounts.len(), "ledger loaded");

        Ok(Self {
            accounts: RwLock::new(accounts),
            storage,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn contains(&self, account_id: &str) -> bool {
        self.accounts.read().await.contains_key(account_id)
    }

    /// Exact password match. Unknown accounts never authenticate.
    pub async fn authenticate(&self, account_id: &str, password: &str) -> bool {
        self.accounts
            .read()
            .await
            .get(account_id)
            .is_some_and(|account| account.password_matches(password))
    }

    pub async fn get_balance(&self, account_id: &str) -> Result<Money, Error> {
        self.accounts
            .read()
            .await
            .get(account_id)
            .map(|account| account.balance)
            .ok_or_else(|| Error::UnknownAccount(account_id.to_string()))
    }

    /// Debits `amount` and persists the ledger before returning the new balance.
    ///
    /// A failed save restores the previous balance, so memory never runs ahead of disk.
    pub async fn withdraw(&self, account_id: &str, amount: Money) -> Result<Money, Error> {
        if !amount.is_positive() {
            return Err(Error::InvalidAmount(amount.to_string()));
        }

        let mut accounts = self.accounts.write().await;

        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| Error::UnknownAccount(account_id.to_string()))?;

        if account.balance < amount {
            return Err(Error::InsufficientFunds(account_id.to_string()));
        }

        let previous = account.balance;
        let remaining = previous
            .checked_sub(amount)
            .ok_or_else(|| Error::InvalidAmount(amount.to_string()))?;
        account.balance = remaining;

        let saved = self.storage.save(&accounts).await;
        if let Err(e) = saved {
            if let Some(account) = accounts.get_mut(account_id) {
                account.balance = previous;
            }
            error!(account = account_id, error = %e, "withdrawal rolled back");
            return Err(e);
        }

        Ok(remaining)
    }

    /// Copy of the committed accounts.
    pub async fn snapshot(&self) -> Accounts {
        self.accounts.read().await.clone()
    }
}
