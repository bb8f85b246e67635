//! First-hit navigation: per-navigation state capture, the single-shot
//! resolver, the subdomain-support probe and worker registration.

pub mod probe;
pub mod resolver;
pub mod state;
pub mod worker;

pub use probe::{check_subdomain_support, HttpImageProbe, SubdomainProbe};
pub use resolver::{resolve, serve_config_url, translate_pending_redirect, Resolution};
pub use state::NavigationState;
pub use worker::{register_worker, WorkerHandle, WorkerRuntime, WorkerState};

use thiserror::Error;

/// Errors surfaced by navigation-time machinery.
///
/// Only the worker activation failures are fatal and user-visible; probe
/// failures collapse into a fallback decision before they reach a caller.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// The one fatal, user-actionable failure: silently retrying instead
    /// risks an infinite redirect loop against same-site bounce
    /// protection.
    #[error("worker failed to activate within 30 seconds, refresh the page to retry")]
    ActivationTimeout,

    #[error("worker became redundant before activating, refresh the page to retry")]
    WorkerRedundant,

    #[error("worker runtime went away while waiting for activation")]
    WorkerGone,

    #[error("worker registration failed: {0}")]
    Registration(String),

    #[error("probe request failed: {0}")]
    Probe(String),
}
