//! Per-connection reader and writer tasks.
//!
//! A connection is split into two tasks. The reader frames inbound bytes
//! into lines and forwards them to the server loop; it is the sole producer
//! of this connection's events, so `Connected`, every `Line`, and the final
//! `Closed` arrive in order. The writer drains an unbounded queue of
//! outbound messages into the socket and shuts the write half down when the
//! queue closes.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use skiff_proto::{LineCodec, Message};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;

use crate::network::{ConnId, Event};

pub struct Connection;

impl Connection {
    /// Spawn the reader and writer tasks for a freshly accepted socket.
    pub fn spawn(conn: ConnId, stream: TcpStream, addr: SocketAddr, events: mpsc::Sender<Event>) {
        let (read_half, write_half) = stream.into_split();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(write_loop(conn, write_half, outgoing_rx));
        tokio::spawn(read_loop(conn, addr, read_half, outgoing_tx, events));
    }
}

async fn read_loop(
    conn: ConnId,
    addr: SocketAddr,
    read_half: OwnedReadHalf,
    sender: mpsc::UnboundedSender<Message>,
    events: mpsc::Sender<Event>,
) {
    // Registering through the same channel as the lines keeps event order.
    if events
        .send(Event::Connected { conn, addr, sender })
        .await
        .is_err()
    {
        return;
    }

    let mut lines = FramedRead::new(read_half, LineCodec::new());
    while let Some(result) = lines.next().await {
        match result {
            Ok(line) => {
                if events.send(Event::Line { conn, line }).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!(%conn, error = %e, "read error");
                break;
            }
        }
    }

    let _ = events.send(Event::Closed { conn }).await;
}

async fn write_loop(
    conn: ConnId,
    write_half: OwnedWriteHalf,
    mut outgoing: mpsc::UnboundedReceiver<Message>,
) {
    let mut writer = FramedWrite::new(write_half, LineCodec::new());

    while let Some(msg) = outgoing.recv().await {
        if let Err(e) = writer.send(msg).await {
            debug!(%conn, error = %e, "write error");
            break;
        }
    }

    let _ = writer.into_inner().shutdown().await;
}
