use std::{env, sync::Arc};

use bank_server::{Dispatcher, FileAuditLog, JsonFileStorage, Ledger, Server, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main] // multi-threaded: one task per connection
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = ServerConfig::from_env()?;
    // Optional positional argument overrides the ledger path.
    if let Some(path) = env::args().nth(1) {
        config.ledger_path = path.into();
    }

    let ledger = match Ledger::load(JsonFileStorage::new(&config.ledger_path)) {
        Ok(ledger) => ledger,
        Err(e) => {
            error!(path = %config.ledger_path.display(), error = %e, "refusing to start");
            return Err(e.into());
        }
    };
    let audit = FileAuditLog::open(&config.audit_log_path)?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(ledger), audit));

    let server = Server::bind(config.bind_addr(), Arc::clone(&dispatcher))
        .await?
        .with_read_timeout(config.read_timeout);
    info!(
        addr = %server.local_addr()?,
        ledger = %config.ledger_path.display(),
        audit_log = %config.audit_log_path.display(),
        "server listening"
    );

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    dispatcher.audit().flush().await;
    Ok(())
}
