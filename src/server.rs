//! The server: gateway plus the single state-owning event loop.

use std::net::{Ipv4Addr, SocketAddr};

use skiff_proto::Message;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::handlers::{greeting, Context, HandlerError, Registry};
use crate::network::{Event, Gateway};
use crate::state::Hub;

/// Capacity of the event channel between connection tasks and the loop.
const EVENT_QUEUE: usize = 256;

/// The IRC server.
///
/// All protocol state lives in the [`Hub`], owned by `run`'s event loop.
/// Connection tasks feed the loop through one mpsc channel, so handlers
/// execute strictly one at a time and messages from a single connection are
/// processed in arrival order.
pub struct Server {
    gateway: Gateway,
    hub: Hub,
    registry: Registry,
}

impl Server {
    /// Bind the listening socket.
    pub async fn bind(config: &Config) -> std::io::Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.listen_port()));
        let gateway = Gateway::bind(addr).await?;
        Ok(Self {
            gateway,
            hub: Hub::new(config.password.clone()),
            registry: Registry::new(),
        })
    }

    /// The bound address (useful when binding port 0 in tests).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.gateway.local_addr()
    }

    /// Accept connections and drive the protocol state machine forever.
    #[instrument(skip_all, name = "server")]
    pub async fn run(self) {
        let Server {
            gateway,
            mut hub,
            registry,
        } = self;

        let (events_tx, mut events_rx) = mpsc::channel::<Event>(EVENT_QUEUE);
        tokio::spawn(gateway.run(events_tx));

        while let Some(event) = events_rx.recv().await {
            match event {
                Event::Connected { conn, addr, sender } => {
                    hub.clients.add(conn, sender);
                    hub.send_to(conn, greeting());
                    info!(%conn, %addr, "client connected");
                }
                Event::Line { conn, line } => {
                    let Some(msg) = Message::parse(&line) else {
                        continue;
                    };
                    debug!(%conn, %msg, "dispatch");

                    let mut ctx = Context {
                        conn,
                        hub: &mut hub,
                    };
                    match registry.dispatch(&mut ctx, &msg) {
                        Ok(()) => {}
                        Err(HandlerError::AccessDenied) => {
                            hub.teardown(conn);
                            info!(%conn, "client disconnected: access denied");
                        }
                        Err(HandlerError::Quit(reason)) => {
                            hub.teardown(conn);
                            info!(%conn, ?reason, "client disconnected: quit");
                        }
                    }
                }
                Event::Closed { conn } => {
                    if hub.clients.get(conn).is_some() {
                        hub.teardown(conn);
                        info!(%conn, "client disconnected: connection closed");
                    }
                }
            }
        }
    }
}
