//! Channel message shapes.
//!
//! # Design Decisions
//! - Actions are a closed enum; receivers match exhaustively instead of
//!   falling through a string switch
//! - Every message carries a generated correlation id; replies echo it, so
//!   two concurrent waiters on the same source can never steal each
//!   other's response

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The three logical participants on a same-origin bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Participant {
    /// A page context.
    Window,
    /// The active worker.
    Worker,
    /// May post but never subscribe.
    EmitterOnly,
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Participant::Window => "WINDOW",
            Participant::Worker => "WORKER",
            Participant::EmitterOnly => "EMITTER_ONLY",
        };
        f.write_str(name)
    }
}

/// Every action a message can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Liveness probe; auto-answered with [`Action::Pong`] echoing the
    /// request data.
    Ping,
    Pong,
    /// Instruct the receiving context to reload configuration from its
    /// durable store.
    ReloadConfig,
    /// Ask the holder of durable configuration to produce it.
    ConfigRequest,
    ConfigResponse,
    /// Push a status line to any listening UI.
    ShowStatus,
}

/// A message on the same-origin broadcast bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Correlation id; replies echo the id of the request they answer.
    pub id: Uuid,
    pub source: Participant,
    /// `None` broadcasts to every listener.
    pub target: Option<Participant>,
    pub action: Action,
    pub data: Value,
}

impl ChannelMessage {
    /// A fresh message with a generated correlation id.
    pub fn new(source: Participant, target: Option<Participant>, action: Action, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            action,
            data,
        }
    }

    /// A reply carrying the correlation id of `self`.
    pub fn reply(&self, source: Participant, action: Action, data: Value) -> Self {
        Self {
            id: self.id,
            source,
            target: Some(self.source),
            action,
            data,
        }
    }

    /// Whether a listener registered as `participant` should see this
    /// message.
    pub fn addressed_to(&self, participant: Participant) -> bool {
        match self.target {
            Some(target) => target == participant,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_echoes_correlation_id() {
        let request = ChannelMessage::new(
            Participant::Window,
            Some(Participant::Worker),
            Action::Ping,
            json!({"n": 1}),
        );
        let reply = request.reply(Participant::Worker, Action::Pong, request.data.clone());
        assert_eq!(reply.id, request.id);
        assert_eq!(reply.target, Some(Participant::Window));
        assert_eq!(reply.data, json!({"n": 1}));
    }

    #[test]
    fn test_fresh_messages_get_distinct_ids() {
        let a = ChannelMessage::new(Participant::Window, None, Action::Ping, Value::Null);
        let b = ChannelMessage::new(Participant::Window, None, Action::Ping, Value::Null);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_wire_tags_are_screaming_snake() {
        let msg = ChannelMessage::new(
            Participant::EmitterOnly,
            None,
            Action::ReloadConfig,
            Value::Null,
        );
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["source"], "EMITTER_ONLY");
        assert_eq!(wire["action"], "RELOAD_CONFIG");
    }

    #[test]
    fn test_broadcast_addressing() {
        let broadcast = ChannelMessage::new(Participant::Worker, None, Action::ShowStatus, Value::Null);
        assert!(broadcast.addressed_to(Participant::Window));
        assert!(broadcast.addressed_to(Participant::Worker));

        let targeted =
            ChannelMessage::new(Participant::Window, Some(Participant::Worker), Action::Ping, Value::Null);
        assert!(targeted.addressed_to(Participant::Worker));
        assert!(!targeted.addressed_to(Participant::Window));
    }
}
