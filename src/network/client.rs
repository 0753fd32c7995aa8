//! WebSocket client pump for the town socket.
//!
//! Owns the connection on a background tokio task: outbound messages drain
//! from a bounded channel onto the socket as JSON text frames, inbound
//! text frames parse into [`ServerMessage`]s pushed onto a shared queue
//! the frame loop drains at the top of each frame. The simulation never
//! blocks on the network.

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{error, info, warn};

use super::protocol::{ClientMessage, ServerMessage};

/// Queue of inbound messages drained by the frame loop.
pub type InboundQueue = Arc<Mutex<Vec<ServerMessage>>>;

/// Outbound channel capacity. Movement emits are already de-duplicated,
/// so a small buffer suffices.
const OUTBOUND_CAPACITY: usize = 100;

/// Handle to a running socket pump.
pub struct SocketPump {
    outbound: mpsc::Sender<ClientMessage>,
    inbound: InboundQueue,
    task: tokio::task::JoinHandle<()>,
}

impl SocketPump {
    /// Connect to the town socket and spawn the pump.
    ///
    /// Must run inside a tokio runtime.
    pub fn connect(url: impl Into<String>) -> Self {
        let url = url.into();
        let (outbound_tx, outbound_rx) = mpsc::channel::<ClientMessage>(OUTBOUND_CAPACITY);
        let inbound: InboundQueue = Arc::new(Mutex::new(Vec::new()));
        let queue = inbound.clone();

        let task = tokio::spawn(run_pump(url, outbound_rx, queue));

        Self {
            outbound: outbound_tx,
            inbound,
            task,
        }
    }

    /// Queue a message for the socket writer.
    ///
    /// Returns false when the pump has stopped or the buffer is full.
    pub fn send(&self, message: ClientMessage) -> bool {
        match self.outbound.try_send(message) {
            Ok(()) => true,
            Err(err) => {
                error!("failed to queue outbound message: {err}");
                false
            }
        }
    }

    /// Drain every inbound message received since the last drain.
    pub fn drain_inbound(&self) -> Vec<ServerMessage> {
        match self.inbound.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Stop the pump.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

async fn run_pump(
    url: String,
    mut outbound_rx: mpsc::Receiver<ClientMessage>,
    inbound: InboundQueue,
) {
    info!("connecting to {url}...");
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(err) => {
            error!("failed to connect to {url}: {err}");
            return;
        }
    };
    info!("socket connected");

    let (mut write, mut read) = ws_stream.split();

    // Reader task: parse inbound text frames onto the shared queue.
    let reader = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => match ServerMessage::from_json(&text) {
                    Ok(message) => {
                        if let Ok(mut queue) = inbound.lock() {
                            queue.push(message);
                        }
                    }
                    Err(err) => {
                        warn!("unparseable server message: {err} - {text}");
                    }
                },
                Ok(Message::Close(_)) => {
                    info!("server closed connection");
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    error!("socket read error: {err}");
                    break;
                }
            }
        }
    });

    // Writer loop: serialize and send queued messages.
    while let Some(message) = outbound_rx.recv().await {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(err) => {
                error!("failed to encode outbound message: {err}");
                continue;
            }
        };
        if let Err(err) = write.send(Message::Text(json)).await {
            error!("socket write error: {err}");
            break;
        }
    }

    reader.abort();
}
