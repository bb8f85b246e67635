//! Cross-context config sync: the same-origin broadcast bus, the
//! cross-origin bridge, and the URL-safe compressed config transport.

pub mod bridge;
pub mod bus;
pub mod compress;
pub mod message;

pub use bridge::{
    bridge_iframe_url, reply_origin, BridgeMessage, MessagePort, Origin, RootConfigServer,
    SubdomainConfigClient, BRIDGE_SOURCE_TAG,
};
pub use bus::{Bus, CommsChannel, Subscription, SyncError};
pub use compress::{compress_config, decompress_config};
pub use message::{Action, ChannelMessage, Participant};
