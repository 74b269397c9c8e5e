use super::ForumClient;
use crate::api::{ForumApi, UserSortKey};
use crate::error::{ClientError, ClientResult};
use crate::models::{Page, Upload, User, UserId, UserPatch};
use crate::query::SortOrder;
use crate::store::UsersAction;

impl<A: ForumApi + 'static> ForumClient<A> {
    /// Load a profile
    pub async fn get_user(&self, id: UserId) -> ClientResult<User> {
        self.dispatch(UsersAction::ProfileStarted).await;
        match self.api.get_user(id).await {
            Ok(user) => {
                self.dispatch(UsersAction::ProfileLoaded(user.clone()))
                    .await;
                Ok(user)
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(UsersAction::ProfileFailed(
                    e.user_message("Failed to load the user"),
                ))
                .await;
                Err(e)
            }
        }
    }

    pub async fn update_user(&self, id: UserId, patch: UserPatch) -> ClientResult<User> {
        if patch.login.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(ClientError::validation("Login cannot be empty"));
        }
        self.require_viewer().await?;

        match self.api.update_user(id, &patch).await {
            Ok(user) => {
                tracing::info!("Updated profile of {}", user.login);
                self.dispatch(UsersAction::Updated(user.clone())).await;
                Ok(user)
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(UsersAction::ProfileFailed(
                    e.user_message("Failed to update the user"),
                ))
                .await;
                Err(e)
            }
        }
    }

    /// Fetch the current page of the user directory
    pub async fn list_users(&self) -> ClientResult<Page<User>> {
        let query = {
            let mut store = self.store.lock().await;
            store.dispatch(UsersAction::ListStarted);
            store.state().users.list_query.clone()
        };

        match self.api.list_users(&query).await {
            Ok(page) => {
                self.dispatch(UsersAction::ListLoaded(page.clone())).await;
                Ok(page)
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(UsersAction::ListFailed(
                    e.user_message("Failed to load users"),
                ))
                .await;
                Err(e)
            }
        }
    }

    pub async fn set_users_sort(
        &self,
        sort_by: UserSortKey,
        order: SortOrder,
    ) -> ClientResult<Page<User>> {
        self.dispatch(UsersAction::SortChanged { sort_by, order })
            .await;
        self.list_users().await
    }

    /// Same bounds rule as post lists
    pub async fn set_users_page(&self, page: i64) -> ClientResult<bool> {
        {
            let mut store = self.store.lock().await;
            let total = store.state().users.total_pages();
            if page < 1 || page > i64::from(total) {
                return Ok(false);
            }
            store.dispatch(UsersAction::PageChanged(page as u32));
        }
        self.list_users().await?;
        Ok(true)
    }

    /// Upload a new avatar for the viewer and point the profile at it
    pub async fn upload_avatar(&self, file: Upload) -> ClientResult<User> {
        let viewer = self.require_viewer().await?;

        let name = match self.api.upload_avatar(file).await {
            Ok(name) => name,
            Err(e) => {
                self.settle_error(&e).await;
                return Err(e);
            }
        };

        let patch = UserPatch {
            profile_picture_name: Some(name),
            ..Default::default()
        };
        self.update_user(viewer.id, patch).await
    }
}
