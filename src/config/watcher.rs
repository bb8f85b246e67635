//! Daemon configuration hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_edge_config;
use crate::config::schema::EdgeConfig;

/// Watches the daemon configuration file and emits validated replacements.
///
/// A change that fails to load or validate is logged and dropped; the
/// daemon keeps running on the previous configuration.
pub struct EdgeConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<EdgeConfig>,
}

impl EdgeConfigWatcher {
    /// Create a watcher and the receiver its updates arrive on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<EdgeConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive for events
    /// to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        match load_edge_config(&path) {
                            Ok(config) => {
                                tracing::info!(path = ?path, "edge config reloaded");
                                let _ = tx.send(config);
                            }
                            Err(err) => {
                                tracing::error!(
                                    path = ?path,
                                    error = %err,
                                    "edge config reload failed, keeping current configuration"
                                );
                            }
                        }
                    }
                }
                Err(err) => tracing::error!(error = ?err, "config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "edge config watcher started");
        Ok(watcher)
    }
}
