use std::future::Future;

use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::cmd::Command;
use crate::connection::Connection;
use crate::db::Catalog;

#[derive(Debug)]
struct Listener {
    listener: TcpListener,
    catalog: Catalog,
}

#[derive(Debug)]
struct Handler {
    connection: Connection,
    catalog: Catalog,
}

/// Runs the accept loop until `shutdown` completes.
pub async fn run(listener: TcpListener, catalog: Catalog, shutdown: impl Future) {
    let mut server = Listener { listener, catalog };

    tokio::select! {
        _ = server.run() => {}
        _ = shutdown => {
            info!("shutting down");
        }
    }
}

impl Listener {
    /// Accepts connections forever. Each accepted socket gets its own
    /// handler task with a cloned catalog handle; the loop immediately goes
    /// back to accepting, with no bound on how many handlers run at once.
    async fn run(&mut self) {
        info!("accepting connections");

        loop {
            // One failed accept must not take the listener down.
            let socket = match self.listener.accept().await {
                Ok((socket, addr)) => {
                    debug!("client connected from {}", addr);
                    socket
                }
                Err(err) => {
                    error!("failed to accept connection: {}", err);
                    continue;
                }
            };

            let mut handler = Handler {
                connection: Connection::new(socket),
                catalog: self.catalog.clone(),
            };

            tokio::spawn(async move {
                if let Err(err) = handler.run().await {
                    error!("connection error: {}", err);
                }
            });
        }
    }
}

impl Handler {
    /// Per-connection request loop. Request fields are read outside the
    /// catalog lock; only the store call inside `apply` takes it. An error
    /// here ends this connection only.
    async fn run(&mut self) -> Result<(), crate::Error> {
        loop {
            let command = match Command::read_from(&mut self.connection).await? {
                Some(command) => command,
                None => {
                    debug!("client disconnected");
                    return Ok(());
                }
            };

            command.apply(&mut self.connection, &self.catalog).await?;
        }
    }
}
