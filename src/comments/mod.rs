//! Comments with optimistic persistence, and draft autosave.
//!
//! Every change is applied locally first and then sent to the
//! [`PersistenceGateway`]. When the call fails the local change is rolled
//! back and the failure is returned as [`LabelError::Persistence`]. All
//! gateway calls race the store's [`CancellationToken`], so tearing down
//! the store abandons whatever is still in flight.

mod draft;
mod gateway;

pub use draft::{DraftAutosaver, DraftStatus};
pub use gateway::{CommentPayload, DraftPayload, PersistedComment, PersistenceGateway};

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::{GatewayError, LabelError};
use crate::model::CommentId;

/// One comment and its local UI flags.
#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author: Option<String>,
    pub resolved: bool,
    pub deleted: bool,
    pub edit_mode: bool,
    /// Must be set before [`CommentStore::delete`] is allowed.
    pub confirm_delete: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn is_persisted(&self) -> bool {
        self.id.is_persisted()
    }

    fn payload(&self) -> CommentPayload {
        CommentPayload {
            text: self.text.clone(),
            resolved: self.resolved,
        }
    }
}

/// Runs a gateway call unless `cancel` fires first.
pub(crate) async fn race<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(GatewayError::Cancelled),
        result = call => result,
    }
}

/// Comments of one annotation.
pub struct CommentStore {
    gateway: Arc<dyn PersistenceGateway>,
    comments: Vec<Comment>,
    author: Option<String>,
    next_local: i64,
    cancel: CancellationToken,
}

impl CommentStore {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            comments: Vec::new(),
            author: None,
            next_local: -1,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// A handle that aborts in-flight calls when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Comments that are not deleted, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(|c| !c.deleted)
    }

    fn index_of(&self, id: CommentId) -> Result<usize, LabelError> {
        self.comments
            .iter()
            .position(|c| c.id == id && !c.deleted)
            .ok_or_else(|| LabelError::not_found("comment", id))
    }

    fn failed(&self, id: CommentId, action: &str, err: GatewayError) -> LabelError {
        tracing::warn!(comment = %id, action, error = %err, "comment change rolled back");
        LabelError::Persistence(err)
    }

    /// Adds a comment. It shows up immediately under a local id that is
    /// replaced by the server id once the create is confirmed.
    pub async fn add(&mut self, text: impl Into<String>) -> Result<CommentId, LabelError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(LabelError::invalid("comment", "text is empty"));
        }

        let local = CommentId::new(self.next_local);
        self.next_local -= 1;
        let comment = Comment {
            id: local,
            text,
            author: self.author.clone(),
            resolved: false,
            deleted: false,
            edit_mode: false,
            confirm_delete: false,
            created_at: None,
        };
        let payload = comment.payload();
        self.comments.push(comment);

        match race(&self.cancel, self.gateway.create_comment(&payload)).await {
            Ok(persisted) => {
                let idx = self.index_of(local)?;
                self.comments[idx].id = persisted.id;
                self.comments[idx].created_at = Some(persisted.created_at);
                tracing::debug!(local = %local, comment = %persisted.id, "comment persisted");
                Ok(persisted.id)
            }
            Err(err) => {
                self.comments.retain(|c| c.id != local);
                Err(self.failed(local, "create", err))
            }
        }
    }

    /// Replaces a comment's text and leaves edit mode.
    pub async fn update(&mut self, id: CommentId, text: impl Into<String>) -> Result<(), LabelError> {
        let idx = self.index_of(id)?;
        let previous = self.comments[idx].clone();
        self.comments[idx].text = text.into();
        self.comments[idx].edit_mode = false;
        let payload = self.comments[idx].payload();

        if let Err(err) = race(&self.cancel, self.gateway.update_comment(id, &payload)).await {
            self.restore(previous);
            return Err(self.failed(id, "update", err));
        }
        Ok(())
    }

    /// Flips the resolved flag; returns the new value.
    pub async fn toggle_resolve(&mut self, id: CommentId) -> Result<bool, LabelError> {
        let idx = self.index_of(id)?;
        let resolved = !self.comments[idx].resolved;
        self.comments[idx].resolved = resolved;
        let payload = self.comments[idx].payload();

        if let Err(err) = race(&self.cancel, self.gateway.update_comment(id, &payload)).await {
            if let Ok(idx) = self.index_of(id) {
                self.comments[idx].resolved = !resolved;
            }
            return Err(self.failed(id, "resolve", err));
        }
        Ok(resolved)
    }

    pub fn set_edit_mode(&mut self, id: CommentId, edit_mode: bool) -> Result<(), LabelError> {
        let idx = self.index_of(id)?;
        self.comments[idx].edit_mode = edit_mode;
        Ok(())
    }

    pub fn set_confirm_delete(&mut self, id: CommentId, confirm: bool) -> Result<(), LabelError> {
        let idx = self.index_of(id)?;
        self.comments[idx].confirm_delete = confirm;
        Ok(())
    }

    /// Deletes a comment whose delete was confirmed beforehand.
    pub async fn delete(&mut self, id: CommentId) -> Result<(), LabelError> {
        let idx = self.index_of(id)?;
        if !self.comments[idx].confirm_delete {
            return Err(LabelError::ConfirmationRequired(format!("deleting comment {id}")));
        }
        self.comments[idx].deleted = true;

        if let Err(err) = race(&self.cancel, self.gateway.delete_comment(id)).await {
            if let Some(comment) = self.comments.iter_mut().find(|c| c.id == id) {
                comment.deleted = false;
            }
            return Err(self.failed(id, "delete", err));
        }
        Ok(())
    }

    fn restore(&mut self, previous: Comment) {
        if let Some(comment) = self.comments.iter_mut().find(|c| c.id == previous.id) {
            *comment = previous;
        }
    }

    /// Abandons in-flight calls and forgets every comment.
    pub fn teardown(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.comments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DraftId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    #[derive(Default)]
    struct Flaky {
        fail: AtomicBool,
        next: AtomicI64,
    }

    impl Flaky {
        fn check(&self) -> Result<(), GatewayError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(GatewayError::Network("offline".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PersistenceGateway for Flaky {
        async fn create_comment(
            &self,
            _comment: &CommentPayload,
        ) -> Result<PersistedComment, GatewayError> {
            self.check()?;
            Ok(PersistedComment {
                id: CommentId::new(self.next.fetch_add(1, Ordering::SeqCst) + 100),
                created_at: Utc::now(),
            })
        }

        async fn update_comment(
            &self,
            _id: CommentId,
            _comment: &CommentPayload,
        ) -> Result<(), GatewayError> {
            self.check()
        }

        async fn delete_comment(&self, _id: CommentId) -> Result<(), GatewayError> {
            self.check()
        }

        async fn save_draft(&self, _draft: &DraftPayload) -> Result<DraftId, GatewayError> {
            self.check()?;
            Ok(DraftId(1))
        }
    }

    #[tokio::test]
    async fn test_add_replaces_local_id() {
        let mut store = CommentStore::new(Arc::new(Flaky::default()));
        let id = store.add("looks off").await.expect("add");
        assert!(id.is_persisted());
        let comment = store.get(id).expect("comment");
        assert!(comment.created_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_resolve_rolls_back() {
        let gateway = Arc::new(Flaky::default());
        let mut store = CommentStore::new(gateway.clone());
        let id = store.add("check the left edge").await.expect("add");

        gateway.fail.store(true, Ordering::SeqCst);
        let err = store.toggle_resolve(id).await.expect_err("offline");
        assert!(matches!(err, LabelError::Persistence(GatewayError::Network(_))));
        assert!(!store.get(id).expect("comment").resolved);
    }

    #[tokio::test]
    async fn test_failed_add_leaves_nothing() {
        let gateway = Arc::new(Flaky::default());
        gateway.fail.store(true, Ordering::SeqCst);
        let mut store = CommentStore::new(gateway);
        assert!(store.add("hello").await.is_err());
        assert_eq!(store.visible().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let mut store = CommentStore::new(Arc::new(Flaky::default()));
        let id = store.add("typo").await.expect("add");
        assert!(matches!(
            store.delete(id).await,
            Err(LabelError::ConfirmationRequired(_))
        ));
        store.set_confirm_delete(id, true).expect("confirm");
        store.delete(id).await.expect("delete");
        assert_eq!(store.visible().count(), 0);
        assert!(store.get(id).expect("kept").deleted);
    }
}
