use std::net::SocketAddr;

use crate::domain::Session;

/// One audit record, minus the timestamp the sink adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub peer: SocketAddr,
    pub account_id: Option<String>,
    pub description: String,
}

impl AuditEvent {
    pub fn new(session: &Session, description: impl Into<String>) -> Self {
        Self {
            peer: session.peer(),
            account_id: session.account_id().map(str::to_owned),
            description: description.into(),
        }
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

impl core::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} - {}: {}",
            self.peer,
            self.account_id.as_deref().unwrap_or("-"),
            self.description
        )
    }
}
