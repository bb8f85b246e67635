//! Same-origin broadcast bus.
//!
//! # Responsibilities
//! - Carry [`ChannelMessage`]s between the window and worker contexts of
//!   one origin
//! - Auto-answer `PING` with `PONG`, echoing data and correlation id
//! - Pair requests with responses by `(source, correlation id)`
//!
//! # Design Decisions
//! - The bus is an explicit handle constructed once per execution
//!   environment and passed to every component; there is no module-level
//!   registry of open channels
//! - Delivery order equals post order for a single sender; concurrent
//!   senders are not ordered relative to each other

use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::sync::message::{Action, ChannelMessage, Participant};

const BUS_CAPACITY: usize = 64;

/// Errors from bus and bridge operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Subscribing from an emitter-only handle is a programming error.
    #[error("EMITTER_ONLY channels cannot listen")]
    EmitterOnly,

    /// The bus was closed while a receive was pending.
    #[error("channel closed")]
    Closed,

    /// This listener fell behind and missed messages.
    #[error("listener lagged behind by {0} messages")]
    Lagged(u64),

    /// Bridge message rejected (wrong source tag or origin).
    #[error("cross-origin message rejected: {0}")]
    Rejected(String),

    /// A wildcard target origin is never allowed.
    #[error("invalid target origin: {0}")]
    InvalidOrigin(String),

    /// Configuration never became available to serve.
    #[error("config unavailable after {0} attempts")]
    ConfigUnavailable(u32),

    #[error("payload error: {0}")]
    Payload(String),
}

/// One origin's shared broadcast bus. Cloning shares the same bus.
#[derive(Debug, Clone)]
pub struct Bus {
    tx: broadcast::Sender<ChannelMessage>,
    name: String,
}

impl Bus {
    /// Open a named bus.
    pub fn open(name: &str) -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            tx,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A participant's handle on this bus.
    pub fn handle(&self, source: Participant) -> CommsChannel {
        CommsChannel {
            source,
            tx: self.tx.clone(),
        }
    }
}

/// A participant's sending/receiving handle on a [`Bus`].
#[derive(Debug, Clone)]
pub struct CommsChannel {
    source: Participant,
    tx: broadcast::Sender<ChannelMessage>,
}

impl CommsChannel {
    pub fn source(&self) -> Participant {
        self.source
    }

    fn can_listen(&self) -> bool {
        self.source != Participant::EmitterOnly
    }

    /// Post a message; returns the sent message so callers can await a
    /// correlated response.
    pub fn post(&self, target: Option<Participant>, action: Action, data: Value) -> ChannelMessage {
        let message = ChannelMessage::new(self.source, target, action, data);
        // an error here just means no listener is subscribed yet
        let _ = self.tx.send(message.clone());
        message
    }

    /// Post a prebuilt message (used for replies).
    pub fn post_message(&self, message: ChannelMessage) {
        let _ = self.tx.send(message);
    }

    /// Subscribe to messages addressed to this participant.
    pub fn subscribe(&self) -> Result<Subscription, SyncError> {
        if !self.can_listen() {
            return Err(SyncError::EmitterOnly);
        }
        Ok(Subscription {
            source: self.source,
            rx: self.tx.subscribe(),
            tx: self.tx.clone(),
        })
    }

    /// Post `action` and resolve the response from `response_source` that
    /// carries the request's correlation id.
    pub async fn message_and_wait_for_response(
        &self,
        response_source: Participant,
        target: Option<Participant>,
        action: Action,
        data: Value,
    ) -> Result<ChannelMessage, SyncError> {
        if !self.can_listen() {
            return Err(SyncError::EmitterOnly);
        }
        let mut subscription = self.subscribe()?;
        let sent = self.post(target, action, data);

        loop {
            let message = subscription.recv().await?;
            if message.source == response_source && message.id == sent.id {
                return Ok(message);
            }
        }
    }
}

/// A live subscription on the bus.
pub struct Subscription {
    source: Participant,
    rx: broadcast::Receiver<ChannelMessage>,
    tx: broadcast::Sender<ChannelMessage>,
}

impl Subscription {
    /// The next message addressed to this participant.
    ///
    /// `PING`s are answered with a `PONG` (same data, same correlation id)
    /// and not delivered; a listener's own messages are skipped.
    pub async fn recv(&mut self) -> Result<ChannelMessage, SyncError> {
        loop {
            let message = match self.rx.recv().await {
                Ok(message) => message,
                Err(broadcast::error::RecvError::Closed) => return Err(SyncError::Closed),
                Err(broadcast::error::RecvError::Lagged(n)) => return Err(SyncError::Lagged(n)),
            };

            if message.source == self.source {
                continue;
            }
            if !message.addressed_to(self.source) {
                continue;
            }
            if message.action == Action::Ping {
                let pong = message.reply(self.source, Action::Pong, message.data.clone());
                let _ = self.tx.send(pong);
                continue;
            }
            return Ok(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_ping_is_auto_answered_with_same_data_and_id() {
        let bus = Bus::open("test");
        let window = bus.handle(Participant::Window);
        let worker = bus.handle(Participant::Worker);

        let mut worker_sub = worker.subscribe().unwrap();
        let listener = tokio::spawn(async move {
            // the ping never surfaces; the subscription answers it
            tokio::time::timeout(std::time::Duration::from_millis(200), worker_sub.recv()).await
        });

        let response = window
            .message_and_wait_for_response(
                Participant::Worker,
                Some(Participant::Worker),
                Action::Ping,
                json!({"probe": 7}),
            )
            .await
            .unwrap();

        assert_eq!(response.action, Action::Pong);
        assert_eq!(response.data, json!({"probe": 7}));
        assert!(listener.await.unwrap().is_err(), "ping must not be delivered");
    }

    #[tokio::test]
    async fn test_concurrent_waiters_get_their_own_responses() {
        let bus = Bus::open("test");
        let window = bus.handle(Participant::Window);
        let worker = bus.handle(Participant::Worker);

        // a responder that answers every request it sees, slowest first
        let mut worker_sub = worker.subscribe().unwrap();
        let responder = tokio::spawn(async move {
            let mut pending = Vec::new();
            for _ in 0..2 {
                let request = worker_sub.recv().await.unwrap();
                pending.push(request);
            }
            // answer in reverse arrival order to force a mismatch window
            for request in pending.into_iter().rev() {
                let reply = request.reply(
                    Participant::Worker,
                    Action::ConfigResponse,
                    request.data.clone(),
                );
                worker.post_message(reply);
            }
        });

        let first = window.clone();
        let second = window.clone();
        let (a, b) = tokio::join!(
            first.message_and_wait_for_response(
                Participant::Worker,
                Some(Participant::Worker),
                Action::ConfigRequest,
                json!("first"),
            ),
            second.message_and_wait_for_response(
                Participant::Worker,
                Some(Participant::Worker),
                Action::ConfigRequest,
                json!("second"),
            ),
        );

        assert_eq!(a.unwrap().data, json!("first"));
        assert_eq!(b.unwrap().data, json!("second"));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_emitter_only_cannot_listen() {
        let bus = Bus::open("test");
        let emitter = bus.handle(Participant::EmitterOnly);
        assert!(matches!(
            emitter.subscribe(),
            Err(SyncError::EmitterOnly)
        ));
        // posting still works
        emitter.post(None, Action::ShowStatus, json!("hello"));
    }

    #[tokio::test]
    async fn test_targeted_messages_skip_other_participants() {
        let bus = Bus::open("test");
        let window = bus.handle(Participant::Window);
        let worker = bus.handle(Participant::Worker);

        let mut worker_sub = worker.subscribe().unwrap();
        window.post(Some(Participant::Worker), Action::ReloadConfig, Value::Null);

        let message = worker_sub.recv().await.unwrap();
        assert_eq!(message.action, Action::ReloadConfig);
    }
}
