use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

use api_types::dashboard::Dashboard;

use crate::{cache::ResourceFamily, session::Session};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Periodically invalidates and reloads the dashboard of a session.
///
/// The task ends on [`stop`](Self::stop) or when the handle is dropped.
#[derive(Debug)]
pub struct DashboardRefresher {
    handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    latest: watch::Receiver<Option<Arc<Dashboard>>>,
}

impl DashboardRefresher {
    pub fn start(session: Session, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let (latest_tx, latest) = watch::channel(None);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        session.invalidate(ResourceFamily::Dashboard);
                        match session.dashboard().await {
                            Ok(dashboard) => {
                                debug!("dashboard refreshed");
                                let _ = latest_tx.send(Some(dashboard));
                            }
                            Err(err) => warn!("dashboard refresh failed: {err}"),
                        }
                    }
                }
            }
            debug!("dashboard refresher stopped");
        });

        Self {
            handle: Some(handle),
            shutdown_tx: Some(shutdown_tx),
            latest,
        }
    }

    /// Receiver that changes every time a refresh succeeds.
    pub fn updates(&self) -> watch::Receiver<Option<Arc<Dashboard>>> {
        self.latest.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            // A refresh in progress is abandoned; the cache keeps its slot
            // consistent on its own.
            handle.abort();
        }
    }
}

impl Drop for DashboardRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}
