use super::ForumClient;
use crate::api::ForumApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{CommentId, PostId};
use crate::reaction::{apply_transition, ReactionCall, ReactionIntent, ReactionStatus, ReactionTarget};
use crate::store::Action;

impl<A: ForumApi + 'static> ForumClient<A> {
    /// Apply `intent` optimistically, then bring the server along.
    ///
    /// If any gateway call fails the change is rolled back, which puts counters
    /// and status back exactly where they were, and the error is kept against
    /// the target.
    pub async fn react(
        &self,
        target: ReactionTarget,
        intent: ReactionIntent,
    ) -> ClientResult<ReactionStatus> {
        let viewer = self.require_viewer().await?;

        let (forward, inverse, copies, status) = {
            let mut store = self.store.lock().await;
            let state = store.state();

            let current = state
                .reaction_state(target)
                .ok_or_else(|| ClientError::NotFound(target.to_string()))?;
            if state.author_of(target) == Some(viewer.id) {
                return Err(ClientError::Forbidden(format!(
                    "You cannot react to your own {}",
                    match target {
                        ReactionTarget::Post(_) => "post",
                        ReactionTarget::Comment(_) => "comment",
                    }
                )));
            }

            let (next, inverse) = apply_transition(target.kind(), current, intent);
            let forward = inverse.inverse();
            if forward.is_noop() {
                return Ok(next.status);
            }

            let copies = match target {
                ReactionTarget::Post(id) => state.posts.counters_by_copy(id),
                ReactionTarget::Comment(_) => Vec::new(),
            };

            tracing::debug!(
                "{}: {} -> {}",
                target,
                forward.from.state_name(),
                forward.to.state_name()
            );
            store.dispatch(Action::reaction(target, forward.to, forward.delta));
            (forward, inverse, copies, next.status)
        };

        for call in forward.calls() {
            let result = match call {
                ReactionCall::Like => self.api.react(target, true).await,
                ReactionCall::Dislike => self.api.react(target, false).await,
                ReactionCall::Remove => self.api.remove_reaction(target).await,
            };

            if let Err(e) = result {
                tracing::warn!("Reaction on {} failed, rolling back: {}", target, e);
                {
                    let mut store = self.store.lock().await;
                    store.dispatch(Action::reaction_rollback(target, &inverse, copies));
                    store.dispatch(Action::reaction_failed(
                        target,
                        e.user_message("Failed to save your reaction"),
                    ));
                }
                self.settle_error(&e).await;
                return Err(e);
            }
        }

        Ok(status)
    }

    pub async fn like(&self, target: ReactionTarget) -> ClientResult<ReactionStatus> {
        self.react(target, ReactionIntent::Like).await
    }

    pub async fn dislike(&self, target: ReactionTarget) -> ClientResult<ReactionStatus> {
        self.react(target, ReactionIntent::Dislike).await
    }

    pub async fn remove_reaction(&self, target: ReactionTarget) -> ClientResult<ReactionStatus> {
        self.react(target, ReactionIntent::Remove).await
    }

    pub async fn like_post(&self, id: PostId) -> ClientResult<ReactionStatus> {
        self.like(ReactionTarget::Post(id)).await
    }

    pub async fn dislike_post(&self, id: PostId) -> ClientResult<ReactionStatus> {
        self.dislike(ReactionTarget::Post(id)).await
    }

    pub async fn like_comment(&self, id: CommentId) -> ClientResult<ReactionStatus> {
        self.like(ReactionTarget::Comment(id)).await
    }

    pub async fn dislike_comment(&self, id: CommentId) -> ClientResult<ReactionStatus> {
        self.dislike(ReactionTarget::Comment(id)).await
    }

    /// Load the viewer's reaction to `target`. Signed-out viewers have none.
    pub async fn fetch_reaction_status(
        &self,
        target: ReactionTarget,
    ) -> ClientResult<ReactionStatus> {
        if self.viewer().await.is_none() {
            return Ok(ReactionStatus::None);
        }

        match self.api.reaction_status(target).await {
            Ok(status) => {
                self.dispatch(Action::reaction_status(target, status)).await;
                Ok(status)
            }
            Err(e) => {
                self.settle_error(&e).await;
                Err(e)
            }
        }
    }
}
