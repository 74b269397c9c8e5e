// Forum client - coordinates the gateway, enrichment and the store
mod categories;
mod comments;
mod posts;
mod reactions;
mod users;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::api::{ForumApi, Session};
use crate::debounce::KeyedDebouncer;
use crate::error::{ClientError, ClientResult};
use crate::models::User;
use crate::query::ListSource;
use crate::store::{Action, AuthAction, RootState, Store};

/// Settle time for search-as-you-type and date pickers
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Async front end over a [`ForumApi`]. Cheap to clone; clones share the
/// same store and debouncers. Title and date edits are debounced per list.
pub struct ForumClient<A: ForumApi + 'static> {
    api: Arc<A>,
    store: Arc<Mutex<Store>>,
    title_debounce: KeyedDebouncer<ListSource>,
    date_debounce: KeyedDebouncer<ListSource>,
}

impl<A: ForumApi + 'static> Clone for ForumClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: Arc::clone(&self.store),
            title_debounce: self.title_debounce.clone(),
            date_debounce: self.date_debounce.clone(),
        }
    }
}

impl<A: ForumApi + 'static> ForumClient<A> {
    pub fn new(api: A) -> Self {
        Self::with_debounce(api, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(api: A, delay: Duration) -> Self {
        Self {
            api: Arc::new(api),
            store: Arc::new(Mutex::new(Store::new())),
            title_debounce: KeyedDebouncer::new(delay),
            date_debounce: KeyedDebouncer::new(delay),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Snapshot of the whole state
    pub async fn state(&self) -> RootState {
        self.store.lock().await.state().clone()
    }

    /// Read part of the state without cloning all of it
    pub async fn read<R>(&self, f: impl FnOnce(&RootState) -> R) -> R {
        f(self.store.lock().await.state())
    }

    pub(crate) async fn dispatch(&self, action: impl Into<Action>) {
        self.store.lock().await.dispatch(action);
    }

    pub async fn viewer(&self) -> Option<User> {
        self.read(|s| s.auth.viewer.clone()).await
    }

    pub(crate) async fn require_viewer(&self) -> ClientResult<User> {
        self.viewer().await.ok_or(ClientError::NotSignedIn)
    }

    /// Store the viewer and tokens produced by the login flow
    pub async fn sign_in(&self, viewer: User, session: Session) {
        tracing::info!("Signed in as {}", viewer.login);
        self.api.set_session(session).await;
        self.dispatch(AuthAction::SignedIn(viewer)).await;
    }

    pub async fn sign_out(&self) {
        self.api.set_session(Session::default()).await;
        self.dispatch(AuthAction::SignedOut).await;
    }

    /// Sign out once the gateway reports the session could not be refreshed
    pub(crate) async fn settle_error(&self, err: &ClientError) {
        if matches!(err, ClientError::SessionExpired) {
            tracing::warn!("Session expired, signing out");
            self.sign_out().await;
        }
    }
}
