use super::ForumClient;
use crate::api::ForumApi;
use crate::enrich::{enrich, enrich_one};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    CommentId, CommentPatch, ContentStatus, EnrichedComment, NewComment, PostId,
};
use crate::store::CommentsAction;

impl<A: ForumApi + 'static> ForumClient<A> {
    /// Load the comments of `post_id`, authors attached
    pub async fn fetch_comments(&self, post_id: PostId) -> ClientResult<Vec<EnrichedComment>> {
        let (request, viewer) = {
            let mut store = self.store.lock().await;
            let request = store.state().comments.next_request_id();
            store.dispatch(CommentsAction::FetchStarted { post_id, request });
            (request, store.state().auth.viewer_id())
        };

        tracing::info!("Fetching comments for post {}", post_id);

        let result = async {
            let comments = self.api.list_comments(post_id, viewer).await?;
            enrich(self.api.as_ref(), comments).await
        }
        .await;

        match result {
            Ok(comments) => {
                self.dispatch(CommentsAction::FetchSucceeded {
                    request,
                    comments: comments.clone(),
                })
                .await;
                Ok(comments)
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(CommentsAction::FetchFailed {
                    request,
                    error: e.user_message("Failed to load the comments"),
                })
                .await;
                Err(e)
            }
        }
    }

    /// Comment on `post_id`, or reply to `parent` if given.
    ///
    /// The post must be active, and a reply's parent must be an active
    /// top-level comment.
    pub async fn add_comment(
        &self,
        post_id: PostId,
        content: &str,
        parent: Option<CommentId>,
    ) -> ClientResult<EnrichedComment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::validation("Comment cannot be empty"));
        }
        self.require_viewer().await?;

        let known = self
            .read(|s| s.posts.find(post_id).map(|p| p.record.status))
            .await;
        let post_status = match known {
            Some(status) => status,
            None => self.api.get_post(post_id).await?.status,
        };
        if post_status == ContentStatus::Inactive {
            return Err(ClientError::Forbidden(
                "Comments are closed on inactive posts".to_string(),
            ));
        }

        if let Some(parent_id) = parent {
            let parent_comment = self
                .read(|s| s.comments.find(parent_id).map(|c| c.record.clone()))
                .await
                .ok_or_else(|| ClientError::NotFound(format!("comment {}", parent_id)))?;
            if parent_comment.is_reply() {
                return Err(ClientError::validation("Replies cannot be nested"));
            }
            if parent_comment.status == ContentStatus::Inactive {
                return Err(ClientError::Forbidden(
                    "Cannot reply to an inactive comment".to_string(),
                ));
            }
        }

        self.dispatch(CommentsAction::SubmitStarted).await;

        let body = NewComment {
            content: content.to_string(),
            parent_comment_id: parent,
        };
        let result = async {
            let created = self.api.create_comment(post_id, &body).await?;
            enrich_one(self.api.as_ref(), created).await
        }
        .await;

        match result {
            Ok(comment) => {
                self.dispatch(CommentsAction::Added(comment.clone())).await;
                Ok(comment)
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(CommentsAction::SubmitFailed(
                    e.user_message("Failed to add the comment"),
                ))
                .await;
                Err(e)
            }
        }
    }

    pub async fn update_comment(&self, id: CommentId, patch: CommentPatch) -> ClientResult<()> {
        if patch
            .content
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(ClientError::validation("Comment cannot be empty"));
        }
        let viewer = self.require_viewer().await?;

        if patch.status == Some(ContentStatus::Active) && !viewer.is_admin() {
            let known = self
                .read(|s| s.comments.find(id).map(|c| c.record.status))
                .await;
            if known == Some(ContentStatus::Inactive) {
                return Err(ClientError::Forbidden(
                    "Only administrators can reactivate a comment".to_string(),
                ));
            }
        }

        self.dispatch(CommentsAction::SubmitStarted).await;

        match self.api.update_comment(id, &patch).await {
            Ok(comment) => {
                self.dispatch(CommentsAction::Updated(comment)).await;
                Ok(())
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(CommentsAction::SubmitFailed(
                    e.user_message("Failed to update the comment"),
                ))
                .await;
                Err(e)
            }
        }
    }

    /// Flip a loaded comment between active and inactive
    pub async fn toggle_comment_status(&self, id: CommentId) -> ClientResult<()> {
        let status = self
            .read(|s| s.comments.find(id).map(|c| c.record.status))
            .await
            .ok_or_else(|| ClientError::NotFound(format!("comment {}", id)))?;

        let patch = CommentPatch {
            status: Some(status.toggled()),
            ..Default::default()
        };
        self.update_comment(id, patch).await
    }

    pub async fn delete_comment(&self, id: CommentId) -> ClientResult<()> {
        self.require_viewer().await?;

        match self.api.delete_comment(id).await {
            Ok(()) => {
                self.dispatch(CommentsAction::Removed(id)).await;
                Ok(())
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(CommentsAction::SubmitFailed(
                    e.user_message("Failed to delete the comment"),
                ))
                .await;
                Err(e)
            }
        }
    }
}
