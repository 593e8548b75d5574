//! services/api/src/web/view.rs
//!
//! A mounted conversation screen. The view owns the conversation state, the
//! reveal tasks of its messages, the in-flight turn and the exit timer; all of
//! them hang off one `CancellationToken`, so unmounting stops everything.

use crate::web::{
    auth_task::{evaluate_auth_turn, WELCOME_MESSAGE},
    chat_task::{cap_input, chat_reply},
    protocol::{FlowKind, ServerMessage},
    reveal_task::Animators,
    state::{AuthProgress, ConversationDeps, ConversationSnapshot, ConversationState},
};
use neiji_core::{
    domain::{AuthStep, ChatTurn, NavAction},
    validation::password_strength,
};
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Why a submission was not accepted. Nothing is queued in either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("nothing to send")]
    Empty,
    #[error("a turn is already in flight")]
    Busy,
    #[error("the conversation is no longer mounted")]
    Unmounted,
}

/// The input of one turn, captured when the user submits.
enum TurnRequest {
    Auth { progress: AuthProgress, input: String },
    Chat { history: Vec<ChatTurn> },
}

/// Everything a spawned turn needs; cheap to clone.
#[derive(Clone)]
struct ViewHandle {
    state: Arc<Mutex<ConversationState>>,
    animators: Arc<Mutex<Animators>>,
    events: UnboundedSender<ServerMessage>,
    token: CancellationToken,
    deps: ConversationDeps,
}

impl ViewHandle {
    fn emit(&self, message: ServerMessage) {
        let _ = self.events.send(message);
    }
}

pub struct ConversationView {
    handle: ViewHandle,
}

impl ConversationView {
    /// Mounts a conversation. The sign-in flow opens with an animated greeting.
    pub fn mount(
        kind: FlowKind,
        deps: ConversationDeps,
        events: UnboundedSender<ServerMessage>,
    ) -> Self {
        let token = CancellationToken::new();
        let mut state = ConversationState::new(kind);
        let mut animators = Animators::new(token.clone(), deps.timings, events.clone());

        if kind == FlowKind::Auth {
            let (welcome, _) = state.push_assistant(WELCOME_MESSAGE);
            let _ = events.send(ServerMessage::appended(&welcome));
            animators.start(&welcome);
        }
        info!("Mounted {:?} conversation", kind);

        Self {
            handle: ViewHandle {
                state: Arc::new(Mutex::new(state)),
                animators: Arc::new(Mutex::new(animators)),
                events,
                token,
                deps,
            },
        }
    }

    /// Starts a turn: the user's message is appended now, the reply arrives
    /// after the simulated latency from a background task.
    pub async fn submit(&self, text: &str) -> Result<(), SubmitRejected> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SubmitRejected::Empty);
        }

        let h = &self.handle;
        let mut state = h.state.lock().await;
        if h.token.is_cancelled() {
            return Err(SubmitRejected::Unmounted);
        }
        if state.busy {
            return Err(SubmitRejected::Busy);
        }

        let (input, is_password) = match state.kind {
            FlowKind::Auth => (trimmed.to_string(), state.auth.password_field),
            FlowKind::Chatbot => (cap_input(trimmed, h.deps.max_input_chars), false),
        };
        let (message, settled) = state.push_user(input.clone(), is_password);
        state.busy = true;
        h.animators.lock().await.settle(&settled);
        h.emit(ServerMessage::appended(&message));
        h.emit(ServerMessage::Busy { busy: true });

        let request = match state.kind {
            FlowKind::Auth => TurnRequest::Auth {
                progress: state.auth.clone(),
                input,
            },
            FlowKind::Chatbot => TurnRequest::Chat {
                history: state.timeline.to_chat_history(),
            },
        };
        drop(state);

        tokio::spawn(run_turn(h.clone(), request));
        Ok(())
    }

    /// Refreshes the strength meter for what is currently typed.
    pub async fn input_changed(&self, text: &str) {
        let h = &self.handle;
        let state = h.state.lock().await;
        if h.token.is_cancelled() || state.kind != FlowKind::Auth {
            return;
        }
        if state.auth.password_field && !text.is_empty() {
            h.emit(ServerMessage::PasswordStrength {
                strength: password_strength(text),
            });
        } else {
            h.emit(ServerMessage::StrengthCleared);
        }
    }

    /// The user left the screen with the back button.
    pub async fn back(&self) {
        self.close(true).await;
    }

    /// Tears the view down. After this returns the conversation never changes
    /// again and no further event is emitted. Calling it twice is harmless.
    pub async fn unmount(&self) {
        self.close(false).await;
    }

    async fn close(&self, navigate_back: bool) {
        let h = &self.handle;
        let mut reveals = {
            let _state = h.state.lock().await;
            if h.token.is_cancelled() {
                return;
            }
            if navigate_back {
                h.emit(ServerMessage::Navigate {
                    action: NavAction::GoBack,
                });
            }
            h.token.cancel();
            let mut animators = h.animators.lock().await;
            animators.cancel_all()
        };
        // Turns and the exit timer re-check the token under the state lock;
        // reveal workers do not, so they are joined before returning.
        while reveals.join_next().await.is_some() {}
        info!("Conversation unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        !self.handle.token.is_cancelled()
    }

    pub async fn snapshot(&self) -> ConversationSnapshot {
        let state = self.handle.state.lock().await;
        ConversationSnapshot {
            messages: state.timeline.to_vec(),
            step: state.auth.step,
            busy: state.busy,
            password_field: state.auth.password_field,
        }
    }

    /// Number of reveal animations still running.
    pub async fn active_reveals(&self) -> usize {
        self.handle.animators.lock().await.active()
    }
}

/// Waits the reply latency, evaluates the turn once, then applies it atomically
/// unless the view was unmounted in the meantime.
async fn run_turn(h: ViewHandle, request: TurnRequest) {
    tokio::select! {
        _ = h.token.cancelled() => {
            debug!("Turn dropped: view unmounted while waiting");
            return;
        }
        _ = tokio::time::sleep(h.deps.timings.reply_latency) => {}
    }

    let (reply, progress) = match request {
        TurnRequest::Auth { progress, input } => {
            let turn = evaluate_auth_turn(&progress, &input, &h.deps.accounts).await;
            (turn.reply, Some(turn.progress))
        }
        TurnRequest::Chat { history } => (chat_reply(h.deps.chat.as_ref(), &history).await, None),
    };

    let mut state = h.state.lock().await;
    if h.token.is_cancelled() {
        debug!("Turn dropped: view unmounted while evaluating");
        return;
    }

    let mut exit_now = false;
    if let Some(next) = progress {
        if next.step != state.auth.step {
            info!("Auth step {:?} -> {:?}", state.auth.step, next.step);
            h.emit(ServerMessage::StepChanged { step: next.step });
        }
        if next.password_field != state.auth.password_field {
            h.emit(ServerMessage::InputMode {
                password: next.password_field,
            });
        }
        h.emit(ServerMessage::StrengthCleared);
        exit_now = next.step == AuthStep::Success && !state.exit_scheduled;
        state.exit_scheduled |= exit_now;
        state.auth = next;
    }

    let (message, settled) = state.push_assistant(reply);
    state.busy = false;
    {
        let mut animators = h.animators.lock().await;
        animators.settle(&settled);
        h.emit(ServerMessage::appended(&message));
        h.emit(ServerMessage::Busy { busy: false });
        animators.start(&message);
    }
    drop(state);

    if exit_now {
        tokio::spawn(exit_after_delay(h));
    }
}

/// Leaves the screen once the success message had time to be read.
async fn exit_after_delay(h: ViewHandle) {
    tokio::select! {
        _ = h.token.cancelled() => return,
        _ = tokio::time::sleep(h.deps.timings.exit_delay) => {}
    }
    let _state = h.state.lock().await;
    if h.token.is_cancelled() {
        return;
    }
    info!("Sign-in complete, returning to the previous screen");
    h.emit(ServerMessage::Navigate {
        action: NavAction::GoBack,
    });
}
