//! Reconnecting WebSocket link to the agent gateway.
//!
//! One persistent connection, reconnected on a fixed 5-second cadence for
//! as long as the client lives. Outbound sends are rejected while the
//! link is not connected; nothing is queued or replayed.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use girder_wire::{ClientCommand, ServerEvent};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const OUTBOUND_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// What the link reports to its consumer, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkNotice {
    Connected,
    Disconnected,
    Event(ServerEvent),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("gateway connection is not ready")]
    NotConnected,
    #[error("gateway link has shut down")]
    Closed,
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound half of the gateway connection, seam for the controller so
/// tests can substitute a recording sink.
pub trait CommandSink {
    fn send(&self, command: &ClientCommand) -> Result<(), LinkError>;
    fn connected(&self) -> bool;
}

pub struct TransportLink {
    status: Arc<Mutex<LinkStatus>>,
    outbound: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl TransportLink {
    /// Spawn the connection task. Notices (including every parsed inbound
    /// event) arrive on `notices` until the link is shut down or the
    /// receiver is dropped.
    pub fn connect(url: impl Into<String>, notices: mpsc::Sender<LinkNotice>) -> Self {
        let url = url.into();
        let status = Arc::new(Mutex::new(LinkStatus::Connecting));
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let cancel = CancellationToken::new();
        tokio::spawn(run_link(
            url,
            Arc::clone(&status),
            outbound_rx,
            notices,
            cancel.clone(),
        ));
        Self {
            status,
            outbound: outbound_tx,
            cancel,
        }
    }

    pub fn status(&self) -> LinkStatus {
        *self.status.lock()
    }

    /// Stop reconnecting and close the current connection, if any.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl CommandSink for TransportLink {
    fn send(&self, command: &ClientCommand) -> Result<(), LinkError> {
        if self.status() != LinkStatus::Connected {
            return Err(LinkError::NotConnected);
        }
        let text = serde_json::to_string(command)?;
        self.outbound
            .try_send(text)
            .map_err(|_| LinkError::Closed)
    }

    fn connected(&self) -> bool {
        self.status() == LinkStatus::Connected
    }
}

impl Drop for TransportLink {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_link(
    url: String,
    status: Arc<Mutex<LinkStatus>>,
    mut outbound: mpsc::Receiver<String>,
    notices: mpsc::Sender<LinkNotice>,
    cancel: CancellationToken,
) {
    loop {
        *status.lock() = LinkStatus::Connecting;
        let connected = tokio::select! {
            _ = cancel.cancelled() => return,
            result = tokio_tungstenite::connect_async(&url) => result,
        };

        match connected {
            Ok((stream, _)) => {
                info!(url, "gateway connected");
                // No replay: anything queued while we were down is stale.
                while outbound.try_recv().is_ok() {}
                *status.lock() = LinkStatus::Connected;
                if notices.send(LinkNotice::Connected).await.is_err() {
                    return;
                }

                let (mut write, mut read) = stream.split();
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            let _ = write.send(Message::Close(None)).await;
                            return;
                        }
                        command = outbound.recv() => match command {
                            Some(text) => {
                                debug!(%text, "gateway send");
                                if write.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            None => return,
                        },
                        frame = read.next() => match frame {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<ServerEvent>(&text) {
                                    Ok(event) => {
                                        if notices.send(LinkNotice::Event(event)).await.is_err() {
                                            return;
                                        }
                                    }
                                    Err(err) => {
                                        warn!(%err, "dropping malformed gateway event");
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                warn!(%err, "gateway read failed");
                                break;
                            }
                        },
                    }
                }
            }
            Err(err) => {
                warn!(url, %err, "gateway connect failed");
            }
        }

        *status.lock() = LinkStatus::Disconnected;
        if notices.send(LinkNotice::Disconnected).await.is_err() {
            return;
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            () = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use girder_wire::ClientCommand;

    async fn local_gateway(
        frames: Vec<String>,
    ) -> (String, tokio::task::JoinHandle<Option<String>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.ok()?;
            let mut ws = tokio_tungstenite::accept_async(socket).await.ok()?;
            for frame in frames {
                ws.send(Message::Text(frame)).await.ok()?;
            }
            // Read at most one client frame, then close.
            let received = match ws.next().await {
                Some(Ok(Message::Text(text))) => Some(text),
                _ => None,
            };
            let _ = ws.close(None).await;
            received
        });
        (format!("ws://{addr}"), handle)
    }

    #[tokio::test]
    async fn send_is_rejected_until_connected() {
        let (tx, _rx) = mpsc::channel(8);
        // Nothing listens on this port.
        let link = TransportLink::connect("ws://127.0.0.1:9", tx);
        let result = link.send(&ClientCommand::StopAgent {
            task_id: "t-1".into(),
        });
        assert!(matches!(result, Err(LinkError::NotConnected)));
        link.shutdown();
    }

    #[tokio::test]
    async fn delivers_events_and_reports_disconnect() {
        let event = r#"{"type":"agent_started","task_id":"t-1"}"#.to_string();
        let junk = "not json".to_string();
        let (url, server) = local_gateway(vec![event, junk]).await;

        let (tx, mut rx) = mpsc::channel(8);
        let link = TransportLink::connect(url, tx);

        assert_eq!(rx.recv().await, Some(LinkNotice::Connected));
        assert_eq!(
            rx.recv().await,
            Some(LinkNotice::Event(ServerEvent::AgentStarted {
                task_id: "t-1".into()
            }))
        );

        // Connected now: an outbound command reaches the gateway.
        link.send(&ClientCommand::StopAgent {
            task_id: "t-1".into(),
        })
        .unwrap();
        let received = server.await.unwrap().unwrap();
        assert!(received.contains("\"stop_agent\""));

        // The malformed frame was dropped, so the next notice is the close.
        assert_eq!(rx.recv().await, Some(LinkNotice::Disconnected));
        link.shutdown();
    }

    #[tokio::test]
    async fn shutdown_stops_the_reconnect_loop() {
        let (url, _server) = local_gateway(Vec::new()).await;
        let (tx, mut rx) = mpsc::channel(8);
        let link = TransportLink::connect(url, tx);
        assert_eq!(rx.recv().await, Some(LinkNotice::Connected));
        link.shutdown();
        // The channel closes instead of emitting another Connected.
        loop {
            match rx.recv().await {
                Some(LinkNotice::Connected) => panic!("link reconnected after shutdown"),
                Some(_) => continue,
                None => break,
            }
        }
    }
}
