//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! One connection mounts one conversation view and forwards its events.

use crate::{
    accounts::AccountService,
    web::{
        protocol::{ClientMessage, ServerMessage},
        state::{AppState, ConversationDeps},
        view::{ConversationView, SubmitRejected},
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");
    let (mut sender, mut receiver) = socket.split();

    // --- 1. Initialization Phase ---
    let (device_id, flow) = match receiver.next().await {
        Some(Ok(Message::Text(init_json))) => {
            match serde_json::from_str::<ClientMessage>(&init_json) {
                Ok(ClientMessage::Init { device_id, flow }) => (device_id, flow),
                _ => {
                    error!("First message was not a valid Init message.");
                    send_json(
                        &mut sender,
                        &ServerMessage::Error {
                            message: "The first message must be `init`.".to_string(),
                        },
                    )
                    .await;
                    return;
                }
            }
        }
        _ => {
            error!("Client disconnected before sending Init message.");
            return;
        }
    };

    info!("Mounting {:?} conversation for device {}", flow, device_id);
    let accounts = Arc::new(
        AccountService::load(
            app_state.sessions.clone(),
            &device_id,
            app_state.config.timings.login_latency,
        )
        .await,
    );
    let started = ServerMessage::ConversationStarted {
        flow,
        authenticated: accounts.is_authenticated().await,
    };
    if !send_json(&mut sender, &started).await {
        return;
    }

    let deps = ConversationDeps {
        accounts,
        chat: app_state.chat_adapter.clone(),
        timings: app_state.config.timings,
        max_input_chars: app_state.config.chat_max_input_chars,
    };
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let view = ConversationView::mount(flow, deps, events_tx);

    // The writer task owns the socket's sending half from here on.
    let closing = CancellationToken::new();
    let writer = tokio::spawn(forward_events(events_rx, sender, closing.clone()));

    // --- 2. Main Message Loop ---
    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                if !handle_text_message(&text, &view).await {
                    break;
                }
            }
            Some(Ok(Message::Close(_))) => {
                info!("Client sent close message.");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
            None => {
                info!("Client disconnected.");
                break;
            }
        }
    }

    // --- 3. Cleanup ---
    // Once unmounted the view emits nothing new; the writer flushes what is queued.
    view.unmount().await;
    closing.cancel();
    if let Err(e) = writer.await {
        error!("Event writer task failed: {:?}", e);
    }
    info!("WebSocket connection closed for device {}.", device_id);
}

/// Dispatches one client message. Returns `false` when the connection should end.
async fn handle_text_message(text: &str, view: &ConversationView) -> bool {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Submit { text }) => {
            match view.submit(&text).await {
                Ok(()) => {}
                Err(SubmitRejected::Unmounted) => return false,
                Err(rejected) => warn!("Submission refused: {}", rejected),
            }
            true
        }
        Ok(ClientMessage::InputChanged { text }) => {
            view.input_changed(&text).await;
            true
        }
        Ok(ClientMessage::Back) => {
            info!("Back pressed, leaving the conversation.");
            view.back().await;
            false
        }
        Ok(ClientMessage::Init { .. }) => {
            warn!("Received subsequent Init message, which is ignored.");
            true
        }
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            true
        }
    }
}

/// Forwards view events to the socket until the connection closes.
async fn forward_events(
    mut events: UnboundedReceiver<ServerMessage>,
    mut sender: SplitSink<WebSocket, Message>,
    closing: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(event) => {
                    if !send_json(&mut sender, &event).await {
                        return;
                    }
                }
                None => break,
            },
            _ = closing.cancelled() => {
                while let Ok(event) = events.try_recv() {
                    if !send_json(&mut sender, &event).await {
                        return;
                    }
                }
                break;
            }
        }
    }
    let _ = sender.close().await;
}

async fn send_json(sender: &mut SplitSink<WebSocket, Message>, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return true;
        }
    };
    if sender.send(Message::Text(json.into())).await.is_err() {
        warn!("Failed to send message to client. Client may have disconnected.");
        return false;
    }
    true
}
