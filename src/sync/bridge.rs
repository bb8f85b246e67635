//! Cross-origin config bridge.
//!
//! # Responsibilities
//! - Build the iframe URL a subdomain embeds to reach the root origin's
//!   config page, with the subdomain's own origin in the hash fragment
//! - Root side: produce the durable config (retrying with capped doubling
//!   backoff while the store is still seeding) and post it back
//! - Subdomain side: accept only correctly-tagged messages from the
//!   expected origin, persist the config, and tell the worker to reload
//!
//! # Design Decisions
//! - Every cross-origin post names an explicit target origin; a wildcard
//!   is unrepresentable. The config can carry private routing and gateway
//!   URLs, and the page posting it cannot know what top-level origin has
//!   framed it
//! - Spoofed inbound messages are dropped, not surfaced as errors

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::config::store::ConfigStore;
use crate::gateway::params::{get_hash_fragment, set_hash_fragment};
use crate::sync::bus::{CommsChannel, SyncError};
use crate::sync::message::{Action, Participant};

/// Source tag every bridge message carries.
pub const BRIDGE_SOURCE_TAG: &str = "gateway-config-bridge";

/// Hash-fragment key naming the reply origin in the iframe URL.
pub const BRIDGE_ORIGIN_FRAGMENT: &str = "origin";

/// Path of the root origin's config page the iframe loads.
pub const BRIDGE_PAGE_PATH: &str = "/gw-config-bridge";

const BACKOFF_BASE_MS: u64 = 100;
const BACKOFF_MAX_MS: u64 = 2_000;
const BACKOFF_MAX_ATTEMPTS: u32 = 8;

/// A validated, non-wildcard web origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    /// Parse and normalize an origin. Wildcards and URLs with paths are
    /// rejected.
    pub fn parse(text: &str) -> Result<Self, SyncError> {
        if text == "*" {
            return Err(SyncError::InvalidOrigin("wildcard".to_string()));
        }
        let url = Url::parse(text).map_err(|e| SyncError::InvalidOrigin(e.to_string()))?;
        if url.host_str().is_none() {
            return Err(SyncError::InvalidOrigin(text.to_string()));
        }
        let origin = url.origin().ascii_serialization();
        if origin == "null" {
            return Err(SyncError::InvalidOrigin(text.to_string()));
        }
        Ok(Self(origin))
    }

    /// The origin of an already-parsed URL.
    pub fn of(url: &Url) -> Result<Self, SyncError> {
        Self::parse(url.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message crossing the origin boundary between a subdomain window and
/// the root-origin iframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMessage {
    /// Always [`BRIDGE_SOURCE_TAG`] for legitimate traffic.
    pub source: String,
    pub action: Action,
    pub config: Option<GatewayConfig>,
}

impl BridgeMessage {
    /// The config delivery message the root side posts.
    pub fn reload_config(config: GatewayConfig) -> Self {
        Self {
            source: BRIDGE_SOURCE_TAG.to_string(),
            action: Action::ReloadConfig,
            config: Some(config),
        }
    }
}

/// The transport that carries a [`BridgeMessage`] to another origin.
///
/// The target origin is part of the call, not of the message, so the
/// transport can enforce it; there is no variant that broadcasts.
#[async_trait]
pub trait MessagePort: Send + Sync {
    async fn post(&self, message: BridgeMessage, target: &Origin) -> Result<(), SyncError>;
}

/// The iframe URL a subdomain embeds: the root config page with the
/// subdomain's own origin percent-encoded into the hash.
pub fn bridge_iframe_url(root: &Url, subdomain_origin: &Origin) -> Url {
    let mut url = root.clone();
    url.set_path(BRIDGE_PAGE_PATH);
    url.set_query(None);
    set_hash_fragment(
        &mut url,
        BRIDGE_ORIGIN_FRAGMENT,
        Some(subdomain_origin.as_str()),
    );
    url
}

/// Recover the reply origin the iframe URL was loaded with.
pub fn reply_origin(iframe_url: &Url) -> Result<Origin, SyncError> {
    let encoded = get_hash_fragment(iframe_url, BRIDGE_ORIGIN_FRAGMENT)
        .ok_or_else(|| SyncError::InvalidOrigin("missing origin fragment".to_string()))?;
    Origin::parse(&encoded)
}

/// Root-origin side of the bridge: serves the durable config to the
/// subdomain that framed the config page.
pub struct RootConfigServer<'a> {
    store: &'a dyn ConfigStore,
    port: &'a dyn MessagePort,
}

impl<'a> RootConfigServer<'a> {
    pub fn new(store: &'a dyn ConfigStore, port: &'a dyn MessagePort) -> Self {
        Self { store, port }
    }

    /// Fetch the config (waiting out a store that is still seeding) and
    /// post it to the origin named in the iframe URL.
    pub async fn serve(&self, iframe_url: &Url) -> Result<(), SyncError> {
        let target = reply_origin(iframe_url)?;
        let config = self.fetch_config().await?;

        tracing::debug!(reply_origin = %target, "posting config across origin boundary");
        self.port
            .post(BridgeMessage::reload_config(config), &target)
            .await
    }

    async fn fetch_config(&self) -> Result<GatewayConfig, SyncError> {
        for attempt in 1..=BACKOFF_MAX_ATTEMPTS {
            match self.store.get().await {
                Ok(Some(config)) => return Ok(config.or_defaults()),
                Ok(None) => {
                    tracing::debug!(attempt, "config not yet seeded, backing off");
                }
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "config fetch failed, backing off");
                }
            }
            if attempt < BACKOFF_MAX_ATTEMPTS {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }
        }
        Err(SyncError::ConfigUnavailable(BACKOFF_MAX_ATTEMPTS))
    }
}

/// Capped exponential backoff with jitter: doubles per failed attempt up
/// to the cap.
fn backoff_delay(attempt: u32) -> Duration {
    let exponential = 2u64.saturating_pow(attempt.saturating_sub(1));
    let capped = BACKOFF_BASE_MS.saturating_mul(exponential).min(BACKOFF_MAX_MS);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(capped + jitter)
}

/// Subdomain side of the bridge: filters inbound messages and applies the
/// delivered config.
pub struct SubdomainConfigClient<'a> {
    expected_origin: Origin,
    store: &'a dyn ConfigStore,
    channel: &'a CommsChannel,
}

impl<'a> SubdomainConfigClient<'a> {
    pub fn new(expected_origin: Origin, store: &'a dyn ConfigStore, channel: &'a CommsChannel) -> Self {
        Self {
            expected_origin,
            store,
            channel,
        }
    }

    /// Handle one inbound cross-origin message.
    ///
    /// Returns `true` when a config was accepted and applied. Messages
    /// with the wrong source tag or origin are ignored, not errors.
    pub async fn accept(
        &self,
        from_origin: &str,
        message: BridgeMessage,
    ) -> Result<bool, SyncError> {
        if message.source != BRIDGE_SOURCE_TAG {
            tracing::debug!(source = %message.source, "dropping message with unknown source tag");
            return Ok(false);
        }
        if from_origin != self.expected_origin.as_str() {
            tracing::debug!(origin = %from_origin, "dropping message from unexpected origin");
            return Ok(false);
        }
        if message.action != Action::ReloadConfig {
            return Ok(false);
        }
        let Some(config) = message.config else {
            return Ok(false);
        };

        self.store
            .set(config.or_defaults())
            .await
            .map_err(|e| SyncError::Payload(e.to_string()))?;

        // wake the worker so it re-reads the store it shares with us
        self.channel
            .post(Some(Participant::Worker), Action::ReloadConfig, serde_json::Value::Null);
        Ok(true)
    }
}
