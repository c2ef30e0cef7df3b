use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::domain::{AuditEvent, AuditLog, Error};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
enum AuditMessage {
    Line(String),
    Flush(oneshot::Sender<()>),
}

/// Appends `[timestamp] peer - account: event` lines to a file.
///
/// `record` only timestamps and queues the line; a dedicated task owns the file, so a
/// slow disk never blocks connection tasks. Write failures are logged and swallowed;
/// auditing never changes a reply.
#[derive(Debug)]
pub struct FileAuditLog {
    sender: mpsc::UnboundedSender<AuditMessage>,
}

impl FileAuditLog {
    /// Opens (or creates) the log and starts its writer task. Needs a tokio runtime.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;

        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(write_lines(tokio::fs::File::from_std(file), receiver));

        Ok(Self { sender })
    }

    /// Resolves once every line recorded before the call is on disk.
    pub async fn flush(&self) {
        let (done, written) = oneshot::channel();
        if self.sender.send(AuditMessage::Flush(done)).is_ok() {
            let _ = written.await;
        }
    }
}

impl AuditLog for FileAuditLog {
    fn record(&self, event: &AuditEvent) {
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        let line = format!("[{}] {}\n", timestamp, event);

        if self.sender.send(AuditMessage::Line(line)).is_err() {
            warn!(%event, "audit writer has stopped");
        }
    }
}

async fn write_lines(mut file: tokio::fs::File, mut receiver: mpsc::UnboundedReceiver<AuditMessage>) {
    while let Some(message) = receiver.recv().await {
        match message {
            AuditMessage::Line(line) => {
                let written = async {
                    file.write_all(line.as_bytes()).await?;
                    file.flush().await
                };
                if let Err(e) = written.await {
                    warn!(error = %e, line = line.trim_end(), "audit write failed");
                }
            }
            AuditMessage::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditLog {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, event: &AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Session;

    #[tokio::test]
    async fn appends_formatted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.log");
        std::fs::write(&path, "existing\n").unwrap();

        let mut session = Session::new("10.0.0.7:51000".parse().unwrap());
        let log = FileAuditLog::open(&path).unwrap();
        log.record(&AuditEvent::new(&session, "Connection opened"));
        session.identify("alice");
        log.record(&AuditEvent::new(&session, "Authentication required"));
        log.flush().await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "existing");
        assert!(lines[1].starts_with('['));
        assert!(lines[1].ends_with("] 10.0.0.7:51000 - -: Connection opened"));
        assert!(lines[2].ends_with("] 10.0.0.7:51000 - alice: Authentication required"));

        // "[YYYY-mm-dd HH:MM:SS]"
        let stamp = &lines[1][1..20];
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn lines_keep_their_recording_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.log");
        let session = Session::new("10.0.0.7:51000".parse().unwrap());

        let log = FileAuditLog::open(&path).unwrap();
        for n in 0..200 {
            log.record(&AuditEvent::new(&session, format!("event {}", n)));
        }
        log.flush().await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let numbers: Vec<usize> = contents
            .lines()
            .map(|line| line.rsplit(' ').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(numbers, (0..200).collect::<Vec<_>>());
    }
}
