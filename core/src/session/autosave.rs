use crate::config::SessionConfig;
use crate::error::{CoreError, CoreResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use super::snapshot::SessionSnapshot;
use super::store::SessionStore;

/// Debounced background writer. Each scheduled snapshot restarts the quiet
/// period; only the newest snapshot is written once it elapses.
pub struct SessionAutosave {
    tx: mpsc::UnboundedSender<Value>,
    handle: JoinHandle<()>,
}

impl SessionAutosave {
    pub fn spawn(store: Arc<dyn SessionStore>, key: impl Into<String>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(autosave_loop(store, key.into(), debounce, rx));
        Self { tx, handle }
    }

    pub fn from_config(store: Arc<dyn SessionStore>, cfg: &SessionConfig) -> Self {
        Self::spawn(
            store,
            cfg.key.clone(),
            Duration::from_millis(cfg.autosave_debounce_ms),
        )
    }

    pub fn schedule(&self, snapshot: &SessionSnapshot) -> CoreResult<()> {
        let value = snapshot.to_value()?;
        self.tx
            .send(value)
            .map_err(|_| CoreError::Configuration("autosave task has stopped".to_string()))
    }

    /// Writes any pending snapshot immediately and waits for the task to end.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "autosave task ended abnormally");
        }
    }
}

async fn autosave_loop(
    store: Arc<dyn SessionStore>,
    key: String,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<Value>,
) {
    let mut pending: Option<Value> = None;
    let mut deadline = Instant::now();

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(value) => {
                    pending = Some(value);
                    deadline = Instant::now() + debounce;
                }
                None => break,
            },
            () = time::sleep_until(deadline), if pending.is_some() => {
                if let Some(value) = pending.take() {
                    write_snapshot(&store, &key, value).await;
                }
            }
        }
    }

    if let Some(value) = pending.take() {
        write_snapshot(&store, &key, value).await;
    }
}

/// Store writes are file I/O, so they run on the blocking pool.
async fn write_snapshot(store: &Arc<dyn SessionStore>, key: &str, value: Value) {
    let store = Arc::clone(store);
    let owned_key = key.to_string();
    let result = tokio::task::spawn_blocking(move || store.save(&owned_key, &value)).await;
    match result {
        Ok(Ok(())) => debug!(key, "session autosaved"),
        Ok(Err(e)) => warn!(key, error = %e, "session autosave failed"),
        Err(e) => warn!(key, error = %e, "session autosave task panicked"),
    }
}
