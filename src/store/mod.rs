// Client-side entity store - one reducer per slice, one dispatch entry point
pub mod auth;
pub mod categories;
pub mod comments;
pub mod posts;
pub mod users;

pub use auth::{AuthAction, AuthState};
pub use categories::{CategoriesAction, CategoriesState};
pub use comments::{CommentsAction, CommentsState, Thread};
pub use posts::{PostCopy, PostList, PostsAction, PostsState};
pub use users::{UsersAction, UsersState};

use crate::models::UserId;
use crate::reaction::{
    CounterDelta, Counters, ReactionState, ReactionStatus, ReactionTarget, Transition,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootState {
    pub auth: AuthState,
    pub users: UsersState,
    pub categories: CategoriesState,
    pub posts: PostsState,
    pub comments: CommentsState,
}

impl RootState {
    /// Status and counters the viewer currently sees for `target`
    pub fn reaction_state(&self, target: ReactionTarget) -> Option<ReactionState> {
        match target {
            ReactionTarget::Post(id) => self.posts.reaction_state(id),
            ReactionTarget::Comment(id) => self.comments.reaction_state(id),
        }
    }

    pub fn reaction_status(&self, target: ReactionTarget) -> ReactionStatus {
        match target {
            ReactionTarget::Post(id) => self.posts.status_of(id),
            ReactionTarget::Comment(id) => self.comments.status_of(id),
        }
    }

    pub fn reaction_error(&self, target: ReactionTarget) -> Option<&str> {
        let error = match target {
            ReactionTarget::Post(id) => self.posts.reaction_errors.get(&id),
            ReactionTarget::Comment(id) => self.comments.reaction_errors.get(&id),
        };
        error.map(String::as_str)
    }

    pub fn author_of(&self, target: ReactionTarget) -> Option<UserId> {
        match target {
            ReactionTarget::Post(id) => self.posts.find(id).map(|p| p.record.user_id),
            ReactionTarget::Comment(id) => self.comments.find(id).map(|c| c.record.user_id),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Auth(AuthAction),
    Users(UsersAction),
    Categories(CategoriesAction),
    Posts(PostsAction),
    Comments(CommentsAction),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auth(a) => a.name(),
            Self::Users(a) => a.name(),
            Self::Categories(a) => a.name(),
            Self::Posts(a) => a.name(),
            Self::Comments(a) => a.name(),
        }
    }

    /// Counter and status change for whichever slice owns `target`
    pub fn reaction(target: ReactionTarget, status: ReactionStatus, delta: CounterDelta) -> Self {
        match target {
            ReactionTarget::Post(id) => Self::Posts(PostsAction::ReactionApplied { id, status, delta }),
            ReactionTarget::Comment(id) => {
                Self::Comments(CommentsAction::ReactionApplied { id, status, delta })
            }
        }
    }

    /// Undo an optimistic reaction. A comment has a single copy and takes the
    /// inverse delta; posts put every copy in `copies` back as it was.
    pub fn reaction_rollback(
        target: ReactionTarget,
        inverse: &Transition,
        copies: Vec<(PostCopy, Counters)>,
    ) -> Self {
        match target {
            ReactionTarget::Post(id) => Self::Posts(PostsAction::ReactionRestored {
                id,
                status: inverse.to,
                copies,
            }),
            ReactionTarget::Comment(_) => Self::reaction(target, inverse.to, inverse.delta),
        }
    }

    pub fn reaction_status(target: ReactionTarget, status: ReactionStatus) -> Self {
        match target {
            ReactionTarget::Post(id) => Self::Posts(PostsAction::ReactionStatusLoaded { id, status }),
            ReactionTarget::Comment(id) => {
                Self::Comments(CommentsAction::ReactionStatusLoaded { id, status })
            }
        }
    }

    pub fn reaction_failed(target: ReactionTarget, error: String) -> Self {
        match target {
            ReactionTarget::Post(id) => Self::Posts(PostsAction::ReactionFailed { id, error }),
            ReactionTarget::Comment(id) => Self::Comments(CommentsAction::ReactionFailed { id, error }),
        }
    }
}

macro_rules! impl_from_action {
    ($variant:ident, $action:ty) => {
        impl From<$action> for Action {
            fn from(action: $action) -> Self {
                Self::$variant(action)
            }
        }
    };
}

impl_from_action!(Auth, AuthAction);
impl_from_action!(Users, UsersAction);
impl_from_action!(Categories, CategoriesAction);
impl_from_action!(Posts, PostsAction);
impl_from_action!(Comments, CommentsAction);

/// Holds the root state. Every change goes through [`Store::dispatch`].
#[derive(Debug, Default)]
pub struct Store {
    state: RootState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RootState {
        &self.state
    }

    pub fn dispatch(&mut self, action: impl Into<Action>) {
        let action = action.into();
        tracing::debug!("dispatch {}", action.name());

        match action {
            Action::Auth(action) => {
                let signed_out = matches!(action, AuthAction::SignedOut);
                self.state.auth.reduce(action);
                if signed_out {
                    self.state.posts.reduce(PostsAction::ViewerCleared);
                    self.state.comments.reduce(CommentsAction::ViewerCleared);
                }
            }
            Action::Users(action) => {
                if let UsersAction::Updated(user) = &action {
                    self.state.auth.reduce(AuthAction::ViewerUpdated(user.clone()));
                }
                self.state.users.reduce(action);
            }
            Action::Categories(action) => self.state.categories.reduce(action),
            Action::Posts(action) => self.state.posts.reduce(action),
            Action::Comments(action) => self.state.comments.reduce(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Enriched, Page, Post, PostId, Role, User};
    use crate::query::ListSource;
    use chrono::Utc;

    fn viewer() -> User {
        User {
            id: UserId(7),
            login: "ada".into(),
            email: "ada@example.com".into(),
            full_name: "Ada".into(),
            profile_picture_url: None,
            role: Role::User,
            rating: 0,
        }
    }

    fn post(id: u64, author: u64) -> Post {
        Post {
            id: PostId(id),
            user_id: UserId(author),
            title: "t".into(),
            content: "c".into(),
            status: Default::default(),
            likes: 0,
            dislikes: 0,
            rating: 0,
            category_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_favourite: None,
        }
    }

    #[test]
    fn sign_out_clears_reaction_statuses() {
        let mut store = Store::new();
        store.dispatch(AuthAction::SignedIn(viewer()));
        store.dispatch(Action::reaction_status(
            ReactionTarget::Post(PostId(1)),
            ReactionStatus::Liked,
        ));
        assert_eq!(
            store.state().reaction_status(ReactionTarget::Post(PostId(1))),
            ReactionStatus::Liked
        );

        store.dispatch(AuthAction::SignedOut);
        assert!(store.state().auth.viewer.is_none());
        assert_eq!(
            store.state().reaction_status(ReactionTarget::Post(PostId(1))),
            ReactionStatus::None
        );
    }

    #[test]
    fn profile_update_of_viewer_reaches_auth() {
        let mut store = Store::new();
        store.dispatch(AuthAction::SignedIn(viewer()));
        let mut renamed = viewer();
        renamed.full_name = "Ada L.".into();
        store.dispatch(UsersAction::Updated(renamed));
        assert_eq!(
            store.state().auth.viewer.as_ref().unwrap().full_name,
            "Ada L."
        );
    }

    #[test]
    fn author_lookup_spans_lists() {
        let mut store = Store::new();
        let request = store.state().posts.next_request_id();
        store.dispatch(PostsAction::FetchStarted {
            source: ListSource::All,
            request,
        });
        store.dispatch(PostsAction::FetchSucceeded {
            source: ListSource::All,
            request,
            page: Page {
                items: vec![Enriched::bare(post(3, 7))],
                found: 1,
                total: 1,
            },
        });
        assert_eq!(
            store.state().author_of(ReactionTarget::Post(PostId(3))),
            Some(UserId(7))
        );
        assert_eq!(store.state().author_of(ReactionTarget::Post(PostId(4))), None);
    }
}
