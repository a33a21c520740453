use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::SinkExt;
use futures::StreamExt;
use serde::Serialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::notify::OrderSubscription;
use crate::state::AppState;

/// Firehose of every committed order change, for dispatcher dashboards.
pub async fn events_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_events(socket, state))
}

/// Snapshots of a single order, starting with the current one.
pub async fn order_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = state.orders.subscribe(id)?;
    Ok(ws.on_upgrade(move |socket| stream_order(socket, id, subscription)))
}

async fn send_json<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    value: &T,
) -> Result<(), ()> {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "failed to serialize order for ws");
            return Ok(());
        }
    };

    sender.send(Message::Text(json)).await.map_err(|_| ())
}

async fn stream_events(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.orders.events());

    info!("websocket event client connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(result) = events.next().await {
            match result {
                Ok(event) => {
                    if send_json(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket event client lagging; skipped events");
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("websocket event client disconnected");
}

async fn stream_order(socket: WebSocket, order_id: Uuid, mut subscription: OrderSubscription) {
    let (mut sender, mut receiver) = socket.split();

    info!(order_id = %order_id, "order watcher connected");

    let mut send_task = tokio::spawn(async move {
        let current = subscription.current();
        if send_json(&mut sender, &current).await.is_err() {
            return;
        }
        while let Some(order) = subscription.changed().await {
            if send_json(&mut sender, &order).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!(order_id = %order_id, "order watcher disconnected");
}
