// WebSocket relay between draft viewers and the app loop.
//
// Inbound text frames from every viewer are funneled into one mpsc channel,
// tagged with the viewer's address. Each viewer's writer task merges two
// sources: draft events broadcast to everyone, and replies addressed to that
// viewer alone.

use futures_util::sink::{Sink, SinkExt};
use futures_util::stream::Stream;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Replies queued for one viewer before further replies are dropped.
pub const REPLY_CAPACITY: usize = 32;

/// Sending half of one viewer's private reply queue.
#[derive(Debug, Clone)]
pub struct ReplyTx(pub mpsc::Sender<String>);

impl PartialEq for ReplyTx {
    fn eq(&self, other: &Self) -> bool {
        self.0.same_channel(&other.0)
    }
}

/// Events emitted by the WebSocket server to the application layer.
#[derive(Debug, PartialEq)]
pub enum WsEvent {
    /// A viewer completed the handshake; `reply` reaches only that viewer.
    Connected { addr: String, reply: ReplyTx },
    /// A viewer's connection ended.
    Disconnected { addr: String },
    /// Raw JSON text received from the viewer at `addr`.
    Message { addr: String, text: String },
}

/// Run the WebSocket server on the given port.
///
/// Binds `127.0.0.1:{port}` and accepts any number of viewers. Each viewer
/// gets its own task: text frames are forwarded through `tx`, and both the
/// messages published on `outbound` and the replies sent to its
/// [`ReplyTx`] are written back to it. Runs until the task is cancelled or
/// the app loop drops its receiver.
pub async fn run(
    port: u16,
    tx: mpsc::Sender<WsEvent>,
    outbound: broadcast::Sender<String>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let addr = addr.to_string();
        info!("Accepted TCP connection from {addr}");

        if tx.is_closed() {
            break;
        }

        let tx = tx.clone();
        let updates = outbound.subscribe();
        tokio::spawn(async move {
            let ws_stream = match tokio_tungstenite::accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("WebSocket handshake failed for {addr}: {e}");
                    return;
                }
            };

            let (reply_tx, replies) = mpsc::channel(REPLY_CAPACITY);
            let connected = WsEvent::Connected {
                addr: addr.clone(),
                reply: ReplyTx(reply_tx),
            };
            if tx.send(connected).await.is_err() {
                return;
            }

            let (write, read) = ws_stream.split();
            let writer = tokio::spawn(forward_outbound(updates, replies, write, addr.clone()));

            let _ = process_message_stream(read, &tx, &addr).await;

            writer.abort();
            let _ = tx.send(WsEvent::Disconnected { addr }).await;
        });
    }

    Ok(())
}

/// Forward text frames from one viewer's [`Stream`] through `tx`, tagged
/// with `addr`. Stops at a close frame or a read error. Returns `Err(())`
/// when the app loop has dropped its receiver.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<WsEvent>,
    addr: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let event = WsEvent::Message {
                    addr: addr.to_string(),
                    text: text.to_string(),
                };
                if tx.send(event).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("Viewer {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            // Viewers only speak JSON text.
            _ => {}
        }
    }
    Ok(())
}

/// Write draft events from `updates` and this viewer's `replies` to `sink`
/// as text frames. Ends when the broadcast channel closes or the sink fails.
/// A viewer that falls behind on broadcasts skips the events it missed.
pub async fn forward_outbound<Si>(
    mut updates: broadcast::Receiver<String>,
    mut replies: mpsc::Receiver<String>,
    mut sink: Si,
    addr: String,
) where
    Si: Sink<Message> + Unpin,
    Si::Error: std::fmt::Display,
{
    let mut replies_open = true;
    loop {
        // Replies first, so a requester sees its answer before later events.
        let json = tokio::select! {
            biased;
            reply = replies.recv(), if replies_open => match reply {
                Some(json) => json,
                None => {
                    replies_open = false;
                    continue;
                }
            },
            update = updates.recv() => match update {
                Ok(json) => json,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Viewer {addr} lagged; dropped {skipped} draft events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        if let Err(e) = sink.send(Message::Text(json.into())).await {
            debug!("Stopped writing to {addr}: {e}");
            break;
        }
    }
}
