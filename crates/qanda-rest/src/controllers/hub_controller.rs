//! `/questionshub` push endpoint.
//!
//! JSON text frames in both directions. Clients send
//! `{"method":"SubscribeQuestion","questionId":5}` or
//! `{"method":"UnsubscribeQuestion","questionId":5}`; the server answers with
//! `{"event":"Message","payload":"..."}` and pushes
//! `{"event":"ReceiveQuestion","payload":{...}}` when a followed question changes.

use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use qanda_config::RealtimeConfig;
use qanda_core::{ConnectionId, QuestionId};
use qanda_service::{ConnectionHub, PushMessage};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, Instrument};

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "method")]
pub enum ClientMessage {
    SubscribeQuestion {
        #[serde(rename = "questionId")]
        question_id: QuestionId,
    },
    UnsubscribeQuestion {
        #[serde(rename = "questionId")]
        question_id: QuestionId,
    },
}

/// Creates the hub router mounted at `path`.
pub fn router(path: &str) -> Router<AppState> {
    Router::new().route(path, get(hub_handler))
}

async fn hub_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let (sender, receiver) = socket.split();
    serve_connection(state.hub, state.realtime, sender, receiver).await;
}

/// Runs one push session over any message sink and stream.
///
/// The connection is registered with the hub for the session's lifetime and
/// removed from every group however the session ends.
pub async fn serve_connection<S, R>(hub: Arc<ConnectionHub>, realtime: Arc<RealtimeConfig>, sender: S, receiver: R)
where
    S: Sink<Message, Error = axum::Error> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let (id, outbound) = hub.connect();
    let span = tracing::info_span!("push_connection", connection_id = %id);

    async {
        if let Err(e) = run_session(&hub, &realtime, id, sender, receiver, outbound).await {
            debug!(error = %e, "Push connection ended with error");
        }
        hub.disconnect(id);
    }
    .instrument(span)
    .await;
}

async fn run_session<S, R>(
    hub: &ConnectionHub,
    realtime: &RealtimeConfig,
    id: ConnectionId,
    mut sender: S,
    mut receiver: R,
    mut outbound: mpsc::Receiver<PushMessage>,
) -> Result<(), axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    send(&mut sender, &PushMessage::message("Successfully connected")).await?;

    let client_timeout = realtime.client_timeout();
    let mut keep_alive = interval(realtime.keep_alive_interval());
    keep_alive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    keep_alive.tick().await;
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            _ = keep_alive.tick() => {
                if last_seen.elapsed() > client_timeout {
                    info!(timeout_secs = client_timeout.as_secs(), "Push connection timed out");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
                sender.send(Message::Ping(Vec::new())).await?;
            }
            incoming = receiver.next() => {
                let Some(incoming) = incoming else { break };
                last_seen = Instant::now();
                match incoming? {
                    Message::Text(text) => {
                        let reply = handle_client_message(hub, id, &text);
                        send(&mut sender, &reply).await?;
                    }
                    Message::Binary(_) => {
                        send(&mut sender, &PushMessage::error("Binary messages are not supported")).await?;
                    }
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
            push = outbound.recv() => {
                // The hub dropped this connection's queue.
                let Some(push) = push else { break };
                send(&mut sender, &push).await?;
            }
        }
    }

    Ok(())
}

/// Applies one client control message and returns the reply for the caller.
pub fn handle_client_message(hub: &ConnectionHub, id: ConnectionId, text: &str) -> PushMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::SubscribeQuestion { question_id }) => {
            if hub.subscribe(id, question_id) {
                PushMessage::message("Successfully subscribed")
            } else {
                PushMessage::error("Connection is closed")
            }
        }
        Ok(ClientMessage::UnsubscribeQuestion { question_id }) => {
            hub.unsubscribe(id, question_id);
            PushMessage::message("Successfully unsubscribed")
        }
        Err(e) => {
            debug!(error = %e, "Unrecognised client message");
            PushMessage::error(format!("Unrecognised message: {e}"))
        }
    }
}

async fn send<S>(sender: &mut S, message: &PushMessage) -> Result<(), axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let text = serde_json::to_string(message).map_err(axum::Error::new)?;
    sender.send(Message::Text(text)).await
}
