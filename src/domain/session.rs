use std::net::SocketAddr;

use crate::domain::Command;

/// Authentication progress of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Unauthenticated,
    PasswordPending { account_id: String },
    Authenticated { account_id: String },
    Closed,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Unauthenticated => "unauthenticated",
            Phase::PasswordPending { .. } => "password pending",
            Phase::Authenticated { .. } => "authenticated",
            Phase::Closed => "closed",
        }
    }

    /// Transition table: which commands may run in this phase.
    pub fn accepts(&self, command: &Command) -> bool {
        match (self, command) {
            (Phase::Closed, _) => false,
            (_, Command::Logout) => true,
            (Phase::Unauthenticated, Command::Identify { .. }) => true,
            (Phase::PasswordPending { .. }, Command::Authenticate { .. }) => true,
            (Phase::Authenticated { .. }, Command::Balance | Command::Withdraw { .. }) => true,
            _ => false,
        }
    }
}

/// Per-connection state. Owned by the connection's task and never shared.
#[derive(Debug)]
pub struct Session {
    peer: SocketAddr,
    phase: Phase,
}

impl Session {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            phase: Phase::Unauthenticated,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Account the session is bound to, whether or not the password was verified yet.
    pub fn account_id(&self) -> Option<&str> {
        match &self.phase {
            Phase::PasswordPending { account_id } | Phase::Authenticated { account_id } => {
                Some(account_id)
            }
            Phase::Unauthenticated | Phase::Closed => None,
        }
    }

    pub fn authenticated_account(&self) -> Option<&str> {
        match &self.phase {
            Phase::Authenticated { account_id } => Some(account_id),
            _ => None,
        }
    }

    /// `Unauthenticated` -> `PasswordPending`. Returns false in any other phase.
    pub fn identify(&mut self, account_id: impl Into<String>) -> bool {
        if self.phase != Phase::Unauthenticated {
            return false;
        }
        self.phase = Phase::PasswordPending {
            account_id: account_id.into(),
        };
        true
    }

    /// `PasswordPending` -> `Authenticated` for the account presented with `HELO`.
    pub fn confirm_password(&mut self) -> bool {
        match std::mem::take(&mut self.phase) {
            Phase::PasswordPending { account_id } => {
                self.phase = Phase::Authenticated { account_id };
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.phase = Phase::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;

    fn session() -> Session {
        Session::new("127.0.0.1:4000".parse().unwrap())
    }

    #[test]
    fn authenticated_only_through_password_pending() {
        let mut s = session();
        assert!(!s.confirm_password());
        assert_eq!(s.phase(), &Phase::Unauthenticated);

        assert!(s.identify("alice"));
        assert_eq!(s.account_id(), Some("alice"));
        assert_eq!(s.authenticated_account(), None);

        assert!(s.confirm_password());
        assert_eq!(s.authenticated_account(), Some("alice"));
    }

    #[test]
    fn identify_is_rejected_once_bound() {
        let mut s = session();
        assert!(s.identify("alice"));
        assert!(!s.identify("bob"));
        assert_eq!(s.account_id(), Some("alice"));

        s.confirm_password();
        assert!(!s.identify("bob"));
        assert_eq!(s.authenticated_account(), Some("alice"));
    }

    #[test]
    fn transition_table() {
        let identify = Command::Identify {
            account_id: "alice".into(),
        };
        let pass = Command::Authenticate {
            password: "secret".into(),
        };
        let withdraw = Command::Withdraw { amount: Money::ZERO };
        let pending = Phase::PasswordPending {
            account_id: "alice".into(),
        };
        let authenticated = Phase::Authenticated {
            account_id: "alice".into(),
        };

        assert!(Phase::Unauthenticated.accepts(&identify));
        assert!(!Phase::Unauthenticated.accepts(&pass));
        assert!(!Phase::Unauthenticated.accepts(&Command::Balance));
        assert!(pending.accepts(&pass));
        assert!(!pending.accepts(&identify));
        assert!(!pending.accepts(&withdraw));
        assert!(authenticated.accepts(&Command::Balance));
        assert!(authenticated.accepts(&withdraw));
        assert!(!authenticated.accepts(&pass));

        for phase in [Phase::Unauthenticated, pending, authenticated] {
            assert!(phase.accepts(&Command::Logout));
        }
        assert!(!Phase::Closed.accepts(&Command::Logout));
    }

    #[test]
    fn close_unbinds_the_account() {
        let mut s = session();
        s.identify("alice");
        s.confirm_password();
        s.close();
        assert!(s.is_closed());
        assert_eq!(s.account_id(), None);
    }
}
