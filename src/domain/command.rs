use std::str::FromStr;

use crate::domain::{Error, Money};

/// A single inbound protocol line, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Identify { account_id: String },
    Authenticate { password: String },
    Balance,
    Withdraw { amount: Money },
    Logout,
}

impl Command {
    pub const IDENTIFY: &'static str = "HELO";
    pub const AUTHENTICATE: &'static str = "PASS";
    pub const BALANCE: &'static str = "BALA";
    pub const WITHDRAW: &'static str = "WDRA";
    pub const LOGOUT: &'static str = "BYE";

    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Identify { .. } => Self::IDENTIFY,
            Command::Authenticate { .. } => Self::AUTHENTICATE,
            Command::Balance => Self::BALANCE,
            Command::Withdraw { .. } => Self::WITHDRAW,
            Command::Logout => Self::LOGOUT,
        }
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let keyword = parts
            .next()
            .ok_or_else(|| Error::Protocol("empty command".to_string()))?;
        let args: Vec<&str> = parts.collect();

        match (keyword, args.as_slice()) {
            (Self::IDENTIFY, [account_id]) => Ok(Command::Identify {
                account_id: account_id.to_string(),
            }),
            (Self::AUTHENTICATE, [password]) => Ok(Command::Authenticate {
                password: password.to_string(),
            }),
            (Self::BALANCE, []) => Ok(Command::Balance),
            (Self::WITHDRAW, [amount]) => Ok(Command::Withdraw {
                amount: amount.parse()?,
            }),
            (Self::LOGOUT, []) => Ok(Command::Logout),
            (
                Self::IDENTIFY | Self::AUTHENTICATE | Self::BALANCE | Self::WITHDRAW | Self::LOGOUT,
                _,
            ) => Err(Error::Protocol(format!(
                "{} called with {} argument(s)",
                keyword,
                args.len()
            ))),
            (other, _) => Err(Error::Protocol(format!("unrecognized command {}", other))),
        }
    }
}

/// Every command yields exactly one of these on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    AuthRequired,
    Ok,
    Error,
    Amount(Money),
    Bye,
    BadCommand,
}

impl Reply {
    const AUTH_REQUIRED: &'static str = "500 AUTH REQUIRE";
    const OK: &'static str = "525 OK!";
    const ERROR: &'static str = "401 ERROR!";
    const AMOUNT_PREFIX: &'static str = "AMNT:";
    const BYE: &'static str = "BYE";
    const BAD_COMMAND: &'static str = "400 BAD COMMAND";
}

impl core::fmt::Display for Reply {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Reply::AuthRequired => f.write_str(Self::AUTH_REQUIRED),
            Reply::Ok => f.write_str(Self::OK),
            Reply::Error => f.write_str(Self::ERROR),
            Reply::Amount(amount) => write!(f, "{}{}", Self::AMOUNT_PREFIX, amount),
            Reply::Bye => f.write_str(Self::BYE),
            Reply::BadCommand => f.write_str(Self::BAD_COMMAND),
        }
    }
}

impl FromStr for Reply {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        match line {
            Self::AUTH_REQUIRED => Ok(Reply::AuthRequired),
            Self::OK => Ok(Reply::Ok),
            Self::ERROR => Ok(Reply::Error),
            Self::BYE => Ok(Reply::Bye),
            Self::BAD_COMMAND => Ok(Reply::BadCommand),
            other => match other.strip_prefix(Self::AMOUNT_PREFIX) {
                Some(amount) => Money::from_decimal_str(amount)
                    .map(Reply::Amount)
                    .ok_or_else(|| Error::Protocol(format!("malformed balance reply {}", other))),
                None => Err(Error::Protocol(format!("unrecognized reply {}", other))),
            },
        }
    }
}
