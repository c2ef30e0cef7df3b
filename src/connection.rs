use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::domain::{AuditLog, Error, LedgerStorage, Session};

/// Longest accepted command line, `\n` or `\r\n` excluded.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Inbound command lines, without their terminators.
///
/// Ends at EOF. Yields an error on timeout, oversize lines or invalid UTF-8.
pub fn lines<R>(
    reader: R,
    read_timeout: Option<Duration>,
) -> impl Stream<Item = Result<String, Error>> + Send
where
    R: AsyncBufRead + Unpin + Send,
{
    stream::unfold(Some(reader), move |reader| async move {
        let mut reader = reader?;
        match read_line(&mut reader, read_timeout).await {
            Ok(Some(line)) => Some((Ok(line), Some(reader))),
            Ok(None) => None,
            // Nothing sensible can follow a broken line.
            Err(e) => Some((Err(e), None)),
        }
    })
}

async fn read_line<R>(reader: &mut R, read_timeout: Option<Duration>) -> Result<Option<String>, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    // Room for the longest line plus its `\r\n`.
    let mut limited = reader.take(MAX_LINE_LENGTH as u64 + 2);
    let read = limited.read_until(b'\n', &mut buf);

    let n = match read_timeout {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| Error::Protocol(format!("no command within {:?}", limit)))??,
        None => read.await?,
    };

    if n == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    if buf.len() > MAX_LINE_LENGTH {
        return Err(Error::Protocol(format!(
            "line exceeds {} bytes",
            MAX_LINE_LENGTH
        )));
    }

    let line = String::from_utf8(buf)
        .map_err(|_| Error::Protocol("line is not valid UTF-8".to_string()))?;
    Ok(Some(line))
}

/// Runs one client's session to completion. Never touches other connections.
pub async fn handle<S, A>(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher<S, A>>,
    read_timeout: Option<Duration>,
) where
    S: LedgerStorage,
    A: AuditLog,
{
    let mut session = Session::new(peer);
    info!(%peer, "connection opened");
    dispatcher.note(&session, "Connection opened");

    let (reader, mut writer) = stream.into_split();
    let lines = lines(BufReader::new(reader), read_timeout);
    tokio::pin!(lines);

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(%peer, error = %e, "dropping connection");
                dispatcher.note(&session, &format!("Connection dropped: {}", e));
                break;
            }
        };

        let reply = dispatcher.dispatch(&mut session, &line).await;
        debug!(%peer, %reply, "reply");

        if let Err(e) = writer.write_all(format!("{}\n", reply).as_bytes()).await {
            warn!(%peer, error = %e, "write failed");
            dispatcher.note(&session, &format!("Connection dropped: {}", e));
            break;
        }
        if session.is_closed() {
            break;
        }
    }

    if !session.is_closed() {
        dispatcher.note(&session, "Connection closed");
    }
    if let Err(e) = writer.shutdown().await {
        debug!(%peer, error = %e, "shutdown after close");
    }
    info!(%peer, "connection closed");
}
