//! services/api/src/web/reveal_task.rs
//!
//! This module contains the asynchronous "worker" responsible for the typewriter
//! reveal of one assistant message, and the registry a view uses to own them.

use crate::{config::FlowTimings, web::protocol::ServerMessage};
use neiji_core::{
    domain::{Message, MessageId},
    reveal::RevealState,
};
use std::collections::HashMap;
use tokio::{sync::mpsc::UnboundedSender, task::JoinSet, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Streams the reveal frames of `message` until it completes or `token` is cancelled.
///
/// Two independent timers drive it: one character per `reveal_tick` and a cursor
/// toggle per `cursor_blink`. Nothing is emitted once the token is cancelled.
pub async fn reveal_process(
    message: Message,
    timings: FlowTimings,
    events: UnboundedSender<ServerMessage>,
    token: CancellationToken,
) {
    let id = message.id();
    let mut state = RevealState::for_message(&message);

    if state.is_complete() {
        if !token.is_cancelled() {
            let _ = events.send(ServerMessage::reveal(id, state.frame()));
        }
        return;
    }

    let mut chars = tokio::time::interval(timings.reveal_tick);
    chars.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cursor = tokio::time::interval_at(
        tokio::time::Instant::now() + timings.cursor_blink,
        timings.cursor_blink,
    );
    cursor.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let frame = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Reveal of message {} cancelled", id);
                return;
            }
            _ = chars.tick() => match state.tick() {
                Some(frame) => frame,
                None => break,
            },
            _ = cursor.tick() => match state.blink() {
                Some(frame) => frame,
                None => break,
            },
        };
        if events.send(ServerMessage::reveal(id, frame)).is_err() {
            return;
        }
    }

    if !token.is_cancelled() {
        let _ = events.send(ServerMessage::reveal(id, state.frame()));
        // Marks the reveal as finished for the owning registry.
        token.cancel();
    }
}

/// The reveal tasks owned by one view, at most one per message.
pub struct Animators {
    parent: CancellationToken,
    timings: FlowTimings,
    events: UnboundedSender<ServerMessage>,
    running: HashMap<MessageId, (CancellationToken, String)>,
    tasks: JoinSet<()>,
}

impl Animators {
    pub fn new(
        parent: CancellationToken,
        timings: FlowTimings,
        events: UnboundedSender<ServerMessage>,
    ) -> Self {
        Self {
            parent,
            timings,
            events,
            running: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Starts the reveal of `message`, restarting from the first character if one
    /// was already running for the same id.
    pub fn start(&mut self, message: &Message) {
        if self.parent.is_cancelled() {
            return;
        }
        if let Some((previous, _)) = self.running.remove(&message.id()) {
            previous.cancel();
        }
        self.running.retain(|_, (token, _)| !token.is_cancelled());
        while self.tasks.try_join_next().is_some() {}

        let token = self.parent.child_token();
        if message.is_animating() {
            self.running.insert(
                message.id(),
                (token.clone(), message.display_text().to_string()),
            );
        }
        self.tasks.spawn(reveal_process(
            message.clone(),
            self.timings,
            self.events.clone(),
            token,
        ));
    }

    /// Stops the given reveals and shows their full text at once.
    pub fn settle(&mut self, ids: &[MessageId]) {
        for id in ids {
            if let Some((token, text)) = self.running.remove(id) {
                let was_running = !token.is_cancelled();
                token.cancel();
                if was_running && !self.parent.is_cancelled() {
                    let frame = RevealState::settled(&text).frame();
                    let _ = self.events.send(ServerMessage::reveal(*id, frame));
                }
            }
        }
    }

    /// Stops every reveal without emitting anything and hands back their tasks.
    ///
    /// A worker may be past its cancellation check when this runs; once the
    /// returned set is joined, none of them can emit again.
    pub fn cancel_all(&mut self) -> JoinSet<()> {
        for (_, (token, _)) in self.running.drain() {
            token.cancel();
        }
        std::mem::take(&mut self.tasks)
    }

    pub fn active(&self) -> usize {
        self.running
            .values()
            .filter(|(token, _)| !token.is_cancelled())
            .count()
    }
}
