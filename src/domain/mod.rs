pub mod account;
pub mod command;
pub mod error;
pub mod event;
pub mod money;
pub mod session;
pub mod traits;

pub use account::Account;
pub use command::{Command, Reply};
pub use error::Error;
pub use event::AuditEvent;
pub use money::Money;
pub use session::{Phase, Session};
pub use traits::{Accounts, AuditLog, LedgerStorage};
