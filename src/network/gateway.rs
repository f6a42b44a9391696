//! Gateway - TCP listener that accepts incoming connections.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, instrument};

use crate::network::{ConnId, Connection, Event};

/// Accepts incoming TCP connections and spawns their framing tasks.
pub struct Gateway {
    listener: TcpListener,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "gateway listening");
        Ok(Self { listener })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, handing each one to the server loop via
    /// `events`.
    #[instrument(skip_all, name = "gateway")]
    pub async fn run(self, events: mpsc::Sender<Event>) {
        let mut next_id = 0u64;
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let conn = ConnId::new(next_id);
                    next_id += 1;
                    info!(%conn, %addr, "connection accepted");
                    Connection::spawn(conn, stream, addr, events.clone());
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                }
            }
        }
    }
}
