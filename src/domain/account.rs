use serde::{Deserialize, Serialize};

use crate::domain::Money;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub password: String, // compared by exact match
    pub balance: Money,   // never negative
}

impl Account {
    pub fn new(password: impl Into<String>, balance: Money) -> Self {
        Self {
            password: password.into(),
            balance,
        }
    }

    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

impl core::fmt::Debug for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Account")
            .field("password", &"<redacted>")
            .field("balance", &self.balance)
            .finish()
    }
}
