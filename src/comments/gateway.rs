//! The persistence seam for comments and drafts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::model::{AnnotationId, CommentId, DraftId};
use crate::serialize::ResultEntry;

/// Comment fields sent to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPayload {
    pub text: String,
    pub resolved: bool,
}

/// What the backend returns for a newly stored comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedComment {
    pub id: CommentId,
    pub created_at: DateTime<Utc>,
}

/// A not-yet-submitted annotation result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DraftPayload {
    pub annotation: AnnotationId,
    pub result: Vec<ResultEntry>,
}

/// Stores comments and drafts somewhere durable.
///
/// The engine only needs success or failure, plus the id of what was
/// created.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn create_comment(
        &self,
        comment: &CommentPayload,
    ) -> Result<PersistedComment, GatewayError>;

    async fn update_comment(
        &self,
        id: CommentId,
        comment: &CommentPayload,
    ) -> Result<(), GatewayError>;

    async fn delete_comment(&self, id: CommentId) -> Result<(), GatewayError>;

    async fn save_draft(&self, draft: &DraftPayload) -> Result<DraftId, GatewayError>;
}
