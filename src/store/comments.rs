use std::collections::HashMap;

use crate::models::{Comment, CommentId, EnrichedComment, PostId};
use crate::reaction::{CounterDelta, Counters, ReactionState, ReactionStatus};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentsState {
    pub post_id: Option<PostId>,
    pub comments: Vec<EnrichedComment>,
    pub loading: bool,
    pub error: Option<String>,
    pub latest_request: u64,

    pub like_statuses: HashMap<CommentId, ReactionStatus>,
    pub reaction_errors: HashMap<CommentId, String>,

    pub submitting: bool,
    pub submit_error: Option<String>,
}

/// A top-level comment with its direct replies
#[derive(Debug, Clone, PartialEq)]
pub struct Thread<'a> {
    pub comment: &'a EnrichedComment,
    pub replies: Vec<&'a EnrichedComment>,
}

#[derive(Debug, Clone)]
pub enum CommentsAction {
    FetchStarted {
        post_id: PostId,
        request: u64,
    },
    FetchSucceeded {
        request: u64,
        comments: Vec<EnrichedComment>,
    },
    FetchFailed {
        request: u64,
        error: String,
    },
    ReactionStatusLoaded {
        id: CommentId,
        status: ReactionStatus,
    },
    ReactionApplied {
        id: CommentId,
        status: ReactionStatus,
        delta: CounterDelta,
    },
    ReactionFailed {
        id: CommentId,
        error: String,
    },
    SubmitStarted,
    Added(EnrichedComment),
    Updated(Comment),
    Removed(CommentId),
    SubmitFailed(String),
    ViewerCleared,
}

impl CommentsAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchStarted { .. } => "comments/fetch_started",
            Self::FetchSucceeded { .. } => "comments/fetch_succeeded",
            Self::FetchFailed { .. } => "comments/fetch_failed",
            Self::ReactionStatusLoaded { .. } => "comments/reaction_status_loaded",
            Self::ReactionApplied { .. } => "comments/reaction_applied",
            Self::ReactionFailed { .. } => "comments/reaction_failed",
            Self::SubmitStarted => "comments/submit_started",
            Self::Added(_) => "comments/added",
            Self::Updated(_) => "comments/updated",
            Self::Removed(_) => "comments/removed",
            Self::SubmitFailed(_) => "comments/submit_failed",
            Self::ViewerCleared => "comments/viewer_cleared",
        }
    }
}

impl CommentsState {
    pub fn next_request_id(&self) -> u64 {
        self.latest_request + 1
    }

    pub fn find(&self, id: CommentId) -> Option<&EnrichedComment> {
        self.comments.iter().find(|c| c.record.id == id)
    }

    pub fn status_of(&self, id: CommentId) -> ReactionStatus {
        self.like_statuses.get(&id).copied().unwrap_or_default()
    }

    pub fn reaction_state(&self, id: CommentId) -> Option<ReactionState> {
        self.find(id).map(|c| ReactionState {
            status: self.status_of(id),
            counters: Counters {
                likes: c.record.likes,
                dislikes: c.record.dislikes,
                rating: c.record.rating,
            },
        })
    }

    /// Top-level comments in fetch order, each with its replies grouped
    /// beneath it. Replies whose parent is not loaded are left out.
    pub fn thread(&self) -> Vec<Thread<'_>> {
        let mut replies: HashMap<CommentId, Vec<&EnrichedComment>> = HashMap::new();
        for comment in &self.comments {
            if let Some(parent) = comment.record.parent_comment_id {
                replies.entry(parent).or_default().push(comment);
            }
        }

        self.comments
            .iter()
            .filter(|c| !c.record.is_reply())
            .map(|comment| Thread {
                comment,
                replies: replies.remove(&comment.record.id).unwrap_or_default(),
            })
            .collect()
    }

    pub fn reduce(&mut self, action: CommentsAction) {
        match action {
            CommentsAction::FetchStarted { post_id, request } => {
                if self.post_id != Some(post_id) {
                    self.comments.clear();
                }
                self.post_id = Some(post_id);
                self.latest_request = request;
                self.loading = true;
                self.error = None;
            }
            CommentsAction::FetchSucceeded { request, comments } => {
                if request != self.latest_request {
                    tracing::warn!("Discarding stale comments response {}", request);
                    return;
                }
                self.loading = false;
                self.comments = comments;
            }
            CommentsAction::FetchFailed { request, error } => {
                if request != self.latest_request {
                    return;
                }
                self.loading = false;
                self.error = Some(error);
            }
            CommentsAction::ReactionStatusLoaded { id, status } => {
                self.like_statuses.insert(id, status);
            }
            CommentsAction::ReactionApplied { id, status, delta } => {
                if let Some(comment) = self.comments.iter_mut().find(|c| c.record.id == id) {
                    let counters = Counters {
                        likes: comment.record.likes,
                        dislikes: comment.record.dislikes,
                        rating: comment.record.rating,
                    }
                    .apply(delta);
                    comment.record.likes = counters.likes;
                    comment.record.dislikes = counters.dislikes;
                    comment.record.rating = counters.rating;
                }
                self.like_statuses.insert(id, status);
                self.reaction_errors.remove(&id);
            }
            CommentsAction::ReactionFailed { id, error } => {
                self.reaction_errors.insert(id, error);
            }
            CommentsAction::SubmitStarted => {
                self.submitting = true;
                self.submit_error = None;
            }
            CommentsAction::Added(comment) => {
                self.submitting = false;
                if self.post_id == Some(comment.record.post_id) {
                    self.comments.push(comment);
                }
            }
            CommentsAction::Updated(comment) => {
                self.submitting = false;
                if let Some(existing) = self
                    .comments
                    .iter_mut()
                    .find(|c| c.record.id == comment.id)
                {
                    existing.record = comment;
                }
            }
            CommentsAction::Removed(id) => {
                self.submitting = false;
                self.comments
                    .retain(|c| c.record.id != id && c.record.parent_comment_id != Some(id));
                self.like_statuses.remove(&id);
                self.reaction_errors.remove(&id);
            }
            CommentsAction::SubmitFailed(error) => {
                self.submitting = false;
                self.submit_error = Some(error);
            }
            CommentsAction::ViewerCleared => {
                self.like_statuses.clear();
                self.reaction_errors.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Enriched, UserId};
    use chrono::Utc;

    fn comment(id: u64, parent: Option<u64>) -> EnrichedComment {
        Enriched::bare(Comment {
            id: CommentId(id),
            post_id: PostId(1),
            user_id: UserId(1),
            content: format!("comment {}", id),
            status: Default::default(),
            likes: 0,
            dislikes: 0,
            rating: 0,
            parent_comment_id: parent.map(CommentId),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn loaded(comments: Vec<EnrichedComment>) -> CommentsState {
        let mut state = CommentsState::default();
        state.reduce(CommentsAction::FetchStarted {
            post_id: PostId(1),
            request: 1,
        });
        state.reduce(CommentsAction::FetchSucceeded {
            request: 1,
            comments,
        });
        state
    }

    #[test]
    fn thread_groups_replies_under_parents() {
        let state = loaded(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, None),
            comment(4, Some(1)),
            comment(5, Some(99)),
        ]);

        let threads = state.thread();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.record.id, CommentId(1));
        let reply_ids: Vec<_> = threads[0].replies.iter().map(|r| r.record.id).collect();
        assert_eq!(reply_ids, vec![CommentId(2), CommentId(4)]);
        assert!(threads[1].replies.is_empty());
    }

    #[test]
    fn removing_parent_drops_its_replies() {
        let mut state = loaded(vec![comment(1, None), comment(2, Some(1)), comment(3, None)]);
        state.reduce(CommentsAction::Removed(CommentId(1)));
        let ids: Vec<_> = state.comments.iter().map(|c| c.record.id).collect();
        assert_eq!(ids, vec![CommentId(3)]);
    }

    #[test]
    fn rollback_restores_counters() {
        let mut state = loaded(vec![comment(1, None)]);
        let delta = CounterDelta {
            likes: 0,
            dislikes: 1,
            rating: -1,
        };
        state.reduce(CommentsAction::ReactionApplied {
            id: CommentId(1),
            status: ReactionStatus::Disliked,
            delta,
        });
        state.reduce(CommentsAction::ReactionApplied {
            id: CommentId(1),
            status: ReactionStatus::None,
            delta: delta.negated(),
        });
        let c = &state.find(CommentId(1)).unwrap().record;
        assert_eq!((c.likes, c.dislikes, c.rating), (0, 0, 0));
        assert_eq!(state.status_of(CommentId(1)), ReactionStatus::None);
    }

    #[test]
    fn switching_posts_clears_old_comments() {
        let mut state = loaded(vec![comment(1, None)]);
        state.reduce(CommentsAction::FetchStarted {
            post_id: PostId(2),
            request: 2,
        });
        assert!(state.comments.is_empty());
        assert!(state.loading);
    }
}
