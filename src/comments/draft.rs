//! Debounced draft autosave.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::gateway::{DraftPayload, PersistenceGateway};
use super::race;
use crate::error::{GatewayError, LabelError};
use crate::model::{AnnotationId, DraftId};
use crate::serialize::ResultEntry;

/// Where the latest draft stands.
#[derive(Clone, Debug, PartialEq)]
pub enum DraftStatus {
    Idle,
    /// A change is waiting for the debounce delay.
    Pending,
    Saving,
    Saved {
        draft_id: DraftId,
        at: DateTime<Utc>,
    },
    Failed(GatewayError),
}

type Slot = Arc<Mutex<Option<DraftPayload>>>;

/// Persists the latest draft once no change arrived for `delay`.
///
/// Every [`schedule`] restarts the timer; only the newest payload is
/// saved. [`cancel`] drops the pending draft (explicit submit) and
/// [`flush`] saves it right away. Dropping the autosaver cancels any
/// timer or save in flight.
///
/// [`schedule`]: DraftAutosaver::schedule
/// [`cancel`]: DraftAutosaver::cancel
/// [`flush`]: DraftAutosaver::flush
pub struct DraftAutosaver {
    gateway: Arc<dyn PersistenceGateway>,
    annotation: AnnotationId,
    delay: Duration,
    pending: Slot,
    status: Arc<watch::Sender<DraftStatus>>,
    root: CancellationToken,
    timer: Option<CancellationToken>,
}

fn take(slot: &Slot) -> Option<DraftPayload> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Puts a draft whose save failed back, unless a newer one arrived.
fn restore(slot: &Slot, draft: DraftPayload) {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_none() {
        *slot = Some(draft);
    }
}

impl DraftAutosaver {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, annotation: AnnotationId, delay: Duration) -> Self {
        let (status, _) = watch::channel(DraftStatus::Idle);
        Self {
            gateway,
            annotation,
            delay,
            pending: Arc::new(Mutex::new(None)),
            status: Arc::new(status),
            root: CancellationToken::new(),
            timer: None,
        }
    }

    pub fn status(&self) -> DraftStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DraftStatus> {
        self.status.subscribe()
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// Records a draft change and restarts the debounce timer. Must be
    /// called from within a Tokio runtime.
    pub fn schedule(&mut self, result: Vec<ResultEntry>) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(DraftPayload {
            annotation: self.annotation,
            result,
        });
        self.stop_timer();
        self.status.send_replace(DraftStatus::Pending);

        let timer = self.root.child_token();
        self.timer = Some(timer.clone());

        let gateway = Arc::clone(&self.gateway);
        let pending = Arc::clone(&self.pending);
        let status = Arc::clone(&self.status);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            let Some(draft) = take(&pending) else {
                return;
            };
            tracing::debug!(annotation = %draft.annotation, "autosaving draft");
            status.send_replace(DraftStatus::Saving);
            match race(&timer, gateway.save_draft(&draft)).await {
                Ok(draft_id) => {
                    status.send_replace(DraftStatus::Saved {
                        draft_id,
                        at: Utc::now(),
                    });
                }
                // Superseded by a newer change, a cancel or a flush.
                Err(GatewayError::Cancelled) => {}
                Err(err) => {
                    tracing::warn!(annotation = %draft.annotation, error = %err, "draft autosave failed");
                    restore(&pending, draft);
                    status.send_replace(DraftStatus::Failed(err));
                }
            }
        });
    }

    /// Drops the pending draft without saving it.
    pub fn cancel(&mut self) {
        self.stop_timer();
        take(&self.pending);
        self.status.send_replace(DraftStatus::Idle);
    }

    /// Saves the pending draft now. Returns `None` when nothing was
    /// pending.
    pub async fn flush(&mut self) -> Result<Option<DraftId>, LabelError> {
        self.stop_timer();
        let Some(draft) = take(&self.pending) else {
            return Ok(None);
        };

        self.status.send_replace(DraftStatus::Saving);
        match race(&self.root, self.gateway.save_draft(&draft)).await {
            Ok(draft_id) => {
                self.status.send_replace(DraftStatus::Saved {
                    draft_id,
                    at: Utc::now(),
                });
                Ok(Some(draft_id))
            }
            Err(err) => {
                // Keep the draft for the next attempt unless a newer one
                // arrived meanwhile.
                restore(&self.pending, draft);
                tracing::warn!(annotation = %self.annotation, error = %err, "draft flush failed");
                self.status.send_replace(DraftStatus::Failed(err.clone()));
                Err(LabelError::Persistence(err))
            }
        }
    }
}

impl Drop for DraftAutosaver {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
