use std::sync::Arc;

use tracing::debug;

use crate::domain::{AuditEvent, AuditLog, Command, Error, LedgerStorage, Money, Reply, Session};
use crate::ledger::Ledger;

/// Turns protocol lines into session transitions and ledger calls.
///
/// Stateless apart from the shared ledger; each connection brings its own [`Session`].
#[derive(Debug)]
pub struct Dispatcher<S, A>
where
    S: LedgerStorage,
    A: AuditLog,
{
    ledger: Arc<Ledger<S>>,
    audit: A,
}

impl<S, A> Dispatcher<S, A>
where
    S: LedgerStorage,
    A: AuditLog,
{
    pub fn new(ledger: Arc<Ledger<S>>, audit: A) -> Self {
        Self { ledger, audit }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Handles one inbound line. Always produces exactly one reply.
    pub async fn dispatch(&self, session: &mut Session, line: &str) -> Reply {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => return self.reject(session, &e),
        };

        if !session.phase().accepts(&command) {
            self.record(AuditEvent::new(
                session,
                format!(
                    "{} rejected while {}",
                    command.keyword(),
                    session.phase().name()
                ),
            ));
            return Reply::Error;
        }

        match command {
            Command::Identify { account_id } => self.identify(session, account_id).await,
            Command::Authenticate { password } => self.authenticate(session, &password).await,
            Command::Balance => self.balance(session).await,
            Command::Withdraw { amount } => self.withdraw(session, amount).await,
            Command::Logout => self.logout(session),
        }
    }

    /// Records a connection-level event that is not tied to a command.
    pub fn note(&self, session: &Session, description: &str) {
        self.record(AuditEvent::new(session, description));
    }

    fn reject(&self, session: &Session, error: &Error) -> Reply {
        self.record(AuditEvent::new(session, error.to_string()));
        match error {
            Error::InvalidAmount(_) => Reply::Error,
            _ => Reply::BadCommand,
        }
    }

    async fn identify(&self, session: &mut Session, account_id: String) -> Reply {
        if !self.ledger.contains(&account_id).await {
            self.record(AuditEvent::new(session, "Unknown account").with_account(account_id));
            return Reply::Error;
        }

        if !session.identify(account_id) {
            return Reply::Error;
        }
        self.record(AuditEvent::new(session, "Authentication required"));
        Reply::AuthRequired
    }

    async fn authenticate(&self, session: &mut Session, password: &str) -> Reply {
        let verified = match session.account_id() {
            Some(account_id) => self.ledger.authenticate(account_id, password).await,
            None => false,
        };

        if verified && session.confirm_password() {
            self.record(AuditEvent::new(session, "Login success"));
            Reply::Ok
        } else {
            self.record(AuditEvent::new(session, "Login failed"));
            Reply::Error
        }
    }

    async fn balance(&self, session: &Session) -> Reply {
        let Some(account_id) = session.authenticated_account() else {
            return Reply::Error;
        };

        match self.ledger.get_balance(account_id).await {
            Ok(balance) => {
                self.record(AuditEvent::new(session, "Balance checked"));
                Reply::Amount(balance)
            }
            Err(e) => {
                self.record(AuditEvent::new(session, format!("Balance failed: {}", e)));
                Reply::Error
            }
        }
    }

    async fn withdraw(&self, session: &Session, amount: Money) -> Reply {
        let Some(account_id) = session.authenticated_account() else {
            return Reply::Error;
        };

        match self.ledger.withdraw(account_id, amount).await {
            Ok(_) => {
                self.record(AuditEvent::new(session, format!("Withdraw {} OK", amount)));
                Reply::Ok
            }
            Err(e) => {
                self.record(AuditEvent::new(
                    session,
                    format!("Withdraw {} rejected: {}", amount, e),
                ));
                Reply::Error
            }
        }
    }

    fn logout(&self, session: &mut Session) -> Reply {
        self.record(AuditEvent::new(session, "Session ended"));
        session.close();
        Reply::Bye
    }

    fn record(&self, event: AuditEvent) {
        debug!(%event, "protocol event");
        self.audit.record(&event);
    }
}
