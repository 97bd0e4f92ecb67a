//! WebSocket bridge between `/ws/live_data` and the live-data hub.
//!
//! Each socket subscribes to exactly one topic (the `topic` query
//! parameter). Outgoing frames go through a bounded channel drained by a
//! writer task, so the hub never touches the socket directly. Incoming frames
//! are ignored apart from close.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use at_04_live_data::{LiveDataHub, LiveError, LiveEvent, LiveSubscriber, SubscriberId};
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::middleware::GatewayMetrics;

/// Frames buffered per socket before `send` waits.
pub const OUTBOUND_BUFFER: usize = 64;

/// Close code for a topic the hub cannot serve (policy violation).
const CLOSE_UNKNOWN_TOPIC: u16 = 1008;

/// Hub subscriber writing to one socket.
pub struct WsSubscriber {
    id: SubscriberId,
    outbound: mpsc::Sender<Message>,
    metrics: Arc<GatewayMetrics>,
}

impl WsSubscriber {
    pub fn new(outbound: mpsc::Sender<Message>, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            id: SubscriberId::new(),
            outbound,
            metrics,
        }
    }
}

#[async_trait]
impl LiveSubscriber for WsSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    async fn send(&self, event: &LiveEvent) -> Result<(), LiveError> {
        self.outbound
            .send(Message::Text(event.to_message()))
            .await
            .map_err(|_| LiveError::Closed)?;
        self.metrics.value_pushed();
        Ok(())
    }

    async fn close(&self) {
        // the writer may already be gone
        let _ = self.outbound.send(Message::Close(None)).await;
    }
}

/// Serve one upgraded socket until either side closes it.
pub async fn serve_socket(
    socket: WebSocket,
    topic: String,
    hub: Arc<LiveDataHub>,
    metrics: Arc<GatewayMetrics>,
) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    let subscriber = Arc::new(WsSubscriber::new(tx.clone(), Arc::clone(&metrics)));
    let id = subscriber.id();

    if let Err(e) = hub.subscribe(&topic, subscriber) {
        warn!(topic = %topic, error = %e, "Live subscription rejected");
        metrics.topic_rejected();
        let frame = CloseFrame {
            code: CLOSE_UNKNOWN_TOPIC,
            reason: Cow::Owned(e.to_string()),
        };
        let _ = tx.send(Message::Close(Some(frame))).await;
        drop(tx);
        let _ = writer.await;
        return;
    }

    metrics.socket_opened();
    info!(topic = %topic, subscriber = %id, "Live socket connected");

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(other) => debug!(topic = %topic, frame = ?other, "Ignoring client frame"),
        }
    }

    hub.unsubscribe(&topic, id);
    metrics.socket_closed();
    writer.abort();
    info!(topic = %topic, subscriber = %id, "Live socket disconnected");
}
