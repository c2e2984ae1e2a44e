//! Periodic backup snapshots.
//!
//! A background task copies the in-memory database into the backup slot on
//! a fixed interval. It never blocks writers for longer than one snapshot
//! write, skips empty stores, and logs failures instead of propagating
//! them.

use super::backend::SnapshotBackend;
use super::store::ResultStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// Interval between automatic backups.
pub const DEFAULT_BACKUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// A store shared between its owner and the backup task.
pub type SharedStore<B> = Arc<Mutex<ResultStore<B>>>;

/// Wrap a store for sharing with [`spawn_auto_backup`].
pub fn shared<B: SnapshotBackend>(store: ResultStore<B>) -> SharedStore<B> {
    Arc::new(Mutex::new(store))
}

/// Start the backup task. Abort the returned handle to stop it.
pub fn spawn_auto_backup<B>(store: SharedStore<B>, every: Duration) -> JoinHandle<()>
where
    B: SnapshotBackend + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let outcome = store.lock().await.backup_snapshot();
            match outcome {
                Ok(true) => debug!("Auto-backup written"),
                Ok(false) => {}
                Err(e) => error!(error = %e, "Auto-backup failed"),
            }
        }
    })
}
