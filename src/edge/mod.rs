//! Edge-side redirector: the path-to-subdomain rewrite and cache policy
//! applied in front of the origin.

pub mod cache;
pub mod server;

pub use cache::{cache_decision, registrable_domain, CacheDecision};
pub use server::{AppState, EdgeServer};
