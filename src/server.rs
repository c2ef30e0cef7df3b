use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{info, warn};

use crate::connection;
use crate::dispatcher::Dispatcher;
use crate::domain::{AuditLog, Error, LedgerStorage};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept loop. Holds no session or ledger state of its own.
#[derive(Debug)]
pub struct Server<S, A>
where
    S: LedgerStorage,
    A: AuditLog,
{
    listener: TcpListener,
    dispatcher: Arc<Dispatcher<S, A>>,
    read_timeout: Option<Duration>,
}

impl<S, A> Server<S, A>
where
    S: LedgerStorage + Send + Sync + 'static,
    A: AuditLog + Send + Sync + 'static,
{
    pub async fn bind(
        addr: impl ToSocketAddrs,
        dispatcher: Arc<Dispatcher<S, A>>,
    ) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            dispatcher,
            read_timeout: None,
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<(), Error> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts until `shutdown` resolves. Open connections keep running to completion.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), Error> {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("listener shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let dispatcher = Arc::clone(&self.dispatcher);
                        tokio::spawn(connection::handle(stream, peer, dispatcher, self.read_timeout));
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }
    }
}
