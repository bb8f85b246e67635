//! Worker registration and activation.
//!
//! # Responsibilities
//! - Register the gateway worker at root scope, preferring the module
//!   script and falling back to the legacy classic script
//! - Wait for the `activated` state with a hard timeout
//!
//! # Design Decisions
//! - The activation wait tracks every state change rather than only the
//!   happy path; a worker going redundant mid-install fails explicitly
//! - On timeout the failure is surfaced to the user (refresh to retry),
//!   never silently retried

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::navigation::NavigationError;

/// Module worker script, registered first.
pub const WORKER_SCRIPT: &str = "gw-sw.js";

/// Classic fallback script for runtimes without module worker support.
pub const LEGACY_WORKER_SCRIPT: &str = "gw-sw-legacy.js";

/// Workers are always registered at the path root.
pub const WORKER_SCOPE: &str = "/";

/// How long activation may take before the failure surfaces to the user.
pub const ACTIVATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle states of a registered worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Waiting,
    Activated,
    /// Replaced by a newer version before activating.
    Redundant,
}

/// A registration whose state changes arrive on a watch channel.
#[derive(Debug)]
pub struct WorkerHandle {
    pub script: String,
    state_rx: watch::Receiver<WorkerState>,
}

impl WorkerHandle {
    pub fn new(script: impl Into<String>, state_rx: watch::Receiver<WorkerState>) -> Self {
        Self {
            script: script.into(),
            state_rx,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state_rx.borrow()
    }
}

/// The host capability that actually registers workers.
#[async_trait]
pub trait WorkerRuntime: Send + Sync {
    async fn register(&self, script: &str, scope: &str) -> Result<WorkerHandle, NavigationError>;
}

/// Register the worker at root scope and wait for activation.
///
/// A module-script registration error falls back to the legacy script
/// once; activation failures are final.
pub async fn register_worker(runtime: &dyn WorkerRuntime) -> Result<WorkerHandle, NavigationError> {
    let handle = match runtime.register(WORKER_SCRIPT, WORKER_SCOPE).await {
        Ok(handle) => handle,
        Err(err) => {
            tracing::warn!(
                error = %err,
                script = WORKER_SCRIPT,
                "module worker registration failed, falling back to legacy script"
            );
            runtime.register(LEGACY_WORKER_SCRIPT, WORKER_SCOPE).await?
        }
    };
    wait_for_activation(handle).await
}

/// Wait until `handle` reports `Activated`, failing on redundancy, a dead
/// runtime, or the 30-second timeout.
pub async fn wait_for_activation(
    mut handle: WorkerHandle,
) -> Result<WorkerHandle, NavigationError> {
    let outcome = tokio::time::timeout(ACTIVATION_TIMEOUT, track_activation(&mut handle)).await;
    match outcome {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(NavigationError::ActivationTimeout),
    }
}

async fn track_activation(handle: &mut WorkerHandle) -> Result<(), NavigationError> {
    loop {
        match handle.state() {
            WorkerState::Activated => return Ok(()),
            WorkerState::Redundant => return Err(NavigationError::WorkerRedundant),
            WorkerState::Installing | WorkerState::Waiting => {}
        }
        if handle.state_rx.changed().await.is_err() {
            return Err(NavigationError::WorkerGone);
        }
    }
}
