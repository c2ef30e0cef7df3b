use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::config::ClientConfig;
use crate::domain::{Command, Error, Money, Reply};

/// Line client for the session protocol. One request, one reply.
#[derive(Debug)]
pub struct BankClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl BankClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    pub async fn connect_with(config: &ClientConfig) -> Result<Self, Error> {
        Self::connect(config.server_addr()).await
    }

    /// Sends a raw line and returns the reply line without its terminator.
    pub async fn send_line(&mut self, line: &str) -> Result<String, Error> {
        self.writer.write_all(format!("{}\n", line).as_bytes()).await?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply).await? == 0 {
            return Err(Error::IO(std::io::ErrorKind::UnexpectedEof.into()));
        }
        Ok(reply.trim_end_matches(['\r', '\n']).to_string())
    }

    pub async fn send(&mut self, line: &str) -> Result<Reply, Error> {
        self.send_line(line).await?.parse()
    }

    pub async fn identify(&mut self, account_id: &str) -> Result<Reply, Error> {
        self.send(&format!("{} {}", Command::IDENTIFY, account_id))
            .await
    }

    pub async fn authenticate(&mut self, password: &str) -> Result<Reply, Error> {
        self.send(&format!("{} {}", Command::AUTHENTICATE, password))
            .await
    }

    /// `HELO` then `PASS`; true once the server has accepted both.
    pub async fn login(&mut self, account_id: &str, password: &str) -> Result<bool, Error> {
        if self.identify(account_id).await? != Reply::AuthRequired {
            return Ok(false);
        }
        Ok(self.authenticate(password).await? == Reply::Ok)
    }

    pub async fn balance(&mut self) -> Result<Money, Error> {
        match self.send(Command::BALANCE).await? {
            Reply::Amount(balance) => Ok(balance),
            other => Err(Error::Protocol(format!("balance refused with {}", other))),
        }
    }

    /// True when the server confirmed the debit.
    pub async fn withdraw(&mut self, amount: Money) -> Result<bool, Error> {
        Ok(self
            .send(&format!("{} {}", Command::WITHDRAW, amount))
            .await?
            == Reply::Ok)
    }

    pub async fn logout(mut self) -> Result<(), Error> {
        match self.send(Command::LOGOUT).await? {
            Reply::Bye => Ok(()),
            other => Err(Error::Protocol(format!("logout answered with {}", other))),
        }
    }
}
