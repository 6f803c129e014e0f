//! Persistent prediction channel over WebSocket
//!
//! Every frame is a JSON text message `{"event": <name>, "data": <payload>}`.
//! Clients send `prediction_request` events and receive either a
//! `prediction_response` or a `prediction_error` for each one. Requests on a
//! connection run concurrently, up to `max_concurrent_requests` at a time,
//! so replies may arrive out of order; each reply carries the model name it
//! belongs to. No failure closes the connection.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::handlers::AppState;
use crate::dispatch::{
    classify, DispatchFailure, Dispatcher, Outcome, PREDICTION_ERROR, PREDICTION_REQUEST,
};

/// One frame on the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ChannelEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

impl From<Outcome> for ChannelEvent {
    fn from(outcome: Outcome) -> Self {
        Self::new(outcome.event_name(), outcome.payload())
    }
}

/// What to do with one inbound frame
#[derive(Debug)]
pub enum Inbound {
    /// A prediction request to dispatch
    Predict(Value),
    /// A reply that needs no dispatch
    Reply(ChannelEvent),
    /// Nothing to send back
    Ignore,
}

/// Decode one inbound text frame
pub fn decode_frame(text: &str) -> Inbound {
    match serde_json::from_str::<ChannelEvent>(text) {
        Ok(frame) if frame.event == PREDICTION_REQUEST => Inbound::Predict(frame.data),
        Ok(frame) => {
            debug!(event = %frame.event, "Ignoring unhandled channel event");
            Inbound::Ignore
        }
        Err(e) => malformed(e.to_string()),
    }
}

/// Decode one inbound binary frame; it must hold UTF-8 JSON
pub fn decode_binary_frame(bytes: Vec<u8>) -> Inbound {
    match String::from_utf8(bytes) {
        Ok(text) => decode_frame(&text),
        Err(e) => malformed(e.to_string()),
    }
}

fn malformed(detail: String) -> Inbound {
    let error = classify(&DispatchFailure::EnvelopeInvalid { detail });
    match serde_json::to_value(error) {
        Ok(payload) => Inbound::Reply(ChannelEvent::new(PREDICTION_ERROR, payload)),
        Err(_) => Inbound::Ignore,
    }
}

/// Upgrade an HTTP request to a prediction channel
pub async fn channel(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection = Uuid::new_v4();
    info!(connection = %connection, "Connected");

    let limit = state.max_concurrent_requests;
    let in_flight = Arc::new(Semaphore::new(limit));
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ChannelEvent>(limit);

    // Single writer; request tasks hand their replies over `tx`.
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!(connection = %connection, error = %e, "Failed to encode channel event");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        let inbound = match message {
            Ok(Message::Text(text)) => decode_frame(&text),
            Ok(Message::Binary(bytes)) => decode_binary_frame(bytes),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(connection = %connection, error = %e, "Channel read failed");
                break;
            }
        };

        match inbound {
            Inbound::Predict(payload) => {
                // Stop reading once `limit` predictions are in flight; the
                // permit is released when the reply has been queued.
                let permit = match Arc::clone(&in_flight).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                spawn_prediction(state.dispatcher.clone(), payload, tx.clone(), permit);
            }
            Inbound::Reply(event) => {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Inbound::Ignore => {}
        }
    }

    // The writer drains replies still in flight, then stops once every
    // request task has dropped its sender.
    drop(tx);
    if let Err(e) = writer.await {
        warn!(connection = %connection, error = %e, "Channel writer stopped abnormally");
    }
    info!(connection = %connection, "Disconnect");
}

fn spawn_prediction(
    dispatcher: Dispatcher,
    payload: Value,
    tx: mpsc::Sender<ChannelEvent>,
    permit: OwnedSemaphorePermit,
) {
    tokio::spawn(async move {
        let outcome = dispatcher.dispatch(payload).await;
        // The client may already be gone.
        let _ = tx.send(ChannelEvent::from(outcome)).await;
        drop(permit);
    });
}
