use chrono::NaiveDate;
use tokio::task::JoinHandle;

use super::ForumClient;
use crate::api::ForumApi;
use crate::enrich::{enrich, enrich_one};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    CategoryId, ContentStatus, EnrichedPost, NewPost, Page, PostId, PostPatch, Upload,
};
use crate::query::{FilterPatch, ListSource, SortKey, SortOrder};
use crate::store::PostsAction;

fn require_text(value: &str, what: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(ClientError::validation(format!("{} cannot be empty", what)));
    }
    Ok(())
}

impl<A: ForumApi + 'static> ForumClient<A> {
    /// Fetch the current page of `source` with its query state.
    ///
    /// Completions of fetches superseded by a newer one are dropped by the
    /// store, so this can be fired freely while filters are still changing.
    pub async fn fetch_posts(&self, source: ListSource) -> ClientResult<()> {
        let (request, params) = {
            let mut store = self.store.lock().await;
            let request = store.state().posts.next_request_id();
            store.dispatch(PostsAction::FetchStarted { source, request });
            (request, store.state().posts.query(source).to_params(source))
        };

        tracing::info!("Fetching {} posts (request {})", source, request);

        let result = async {
            let page = self.api.list_posts(source, &params).await?;
            let items = enrich(self.api.as_ref(), page.items).await?;
            Ok::<_, ClientError>(Page {
                items,
                found: page.found,
                total: page.total,
            })
        }
        .await;

        match result {
            Ok(page) => {
                self.dispatch(PostsAction::FetchSucceeded {
                    source,
                    request,
                    page,
                })
                .await;
                Ok(())
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(PostsAction::FetchFailed {
                    source,
                    request,
                    error: e.user_message("Failed to load the posts"),
                })
                .await;
                Err(e)
            }
        }
    }

    /// Merge `patch` into the filters of `source`, back to page 1, refetch
    pub async fn set_filters(&self, source: ListSource, patch: FilterPatch) -> ClientResult<()> {
        self.dispatch(PostsAction::FiltersChanged { source, patch })
            .await;
        self.fetch_posts(source).await
    }

    pub async fn set_sort(
        &self,
        source: ListSource,
        sort_by: SortKey,
        order: SortOrder,
    ) -> ClientResult<()> {
        self.dispatch(PostsAction::SortChanged {
            source,
            sort_by,
            order,
        })
        .await;
        self.fetch_posts(source).await
    }

    /// Replace filters and sort together with a single fetch
    pub async fn set_query(
        &self,
        source: ListSource,
        patch: FilterPatch,
        sort_by: SortKey,
        order: SortOrder,
    ) -> ClientResult<()> {
        {
            let mut store = self.store.lock().await;
            store.dispatch(PostsAction::FiltersChanged { source, patch });
            store.dispatch(PostsAction::SortChanged {
                source,
                sort_by,
                order,
            });
        }
        self.fetch_posts(source).await
    }

    /// Jump to `page`. Returns `Ok(false)` without touching anything when
    /// the page lies outside `1..=total_pages`.
    pub async fn set_page(&self, source: ListSource, page: i64) -> ClientResult<bool> {
        {
            let mut store = self.store.lock().await;
            let total = store.state().posts.total_pages(source);
            if page < 1 || page > i64::from(total) {
                tracing::debug!("Page {} out of range 1..={} for {}", page, total, source);
                return Ok(false);
            }
            store.dispatch(PostsAction::PageChanged {
                source,
                page: page as u32,
            });
        }
        self.fetch_posts(source).await?;
        Ok(true)
    }

    /// Title search, applied once typing has settled
    pub fn search_title(&self, source: ListSource, title: impl Into<String>) -> JoinHandle<bool> {
        let client = self.clone();
        let patch = FilterPatch::title(title);
        self.title_debounce.schedule(source, async move {
            if let Err(e) = client.set_filters(source, patch).await {
                tracing::warn!("Title search on {} failed: {}", source, e);
            }
        })
    }

    /// Date range with an inclusive `end`, applied once the picker settles
    pub fn set_date_range(
        &self,
        source: ListSource,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> JoinHandle<bool> {
        let client = self.clone();
        let patch = FilterPatch::date_range(start, end);
        self.date_debounce.schedule(source, async move {
            if let Err(e) = client.set_filters(source, patch).await {
                tracing::warn!("Date filter on {} failed: {}", source, e);
            }
        })
    }

    pub async fn select_categories(
        &self,
        source: ListSource,
        selected: &[CategoryId],
    ) -> ClientResult<()> {
        self.set_filters(source, FilterPatch::categories(selected))
            .await
    }

    /// Load one post for the detail view
    pub async fn get_post(&self, id: PostId) -> ClientResult<EnrichedPost> {
        self.dispatch(PostsAction::DetailStarted).await;

        let result = async {
            let post = self.api.get_post(id).await?;
            enrich_one(self.api.as_ref(), post).await
        }
        .await;

        match result {
            Ok(post) => {
                self.dispatch(PostsAction::DetailLoaded(post.clone())).await;
                Ok(post)
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(PostsAction::DetailFailed(
                    e.user_message("Failed to load the post"),
                ))
                .await;
                Err(e)
            }
        }
    }

    /// Create a post. Files uploaded earlier are attached when `post.files`
    /// is empty, and the upload buffer is cleared on success.
    pub async fn create_post(&self, mut post: NewPost) -> ClientResult<EnrichedPost> {
        require_text(&post.title, "Title")?;
        require_text(&post.content, "Content")?;
        self.require_viewer().await?;

        {
            let mut store = self.store.lock().await;
            if post.files.is_empty() {
                post.files = store.state().posts.uploaded_files.clone();
            }
            store.dispatch(PostsAction::CreateStarted);
        }

        let result = async {
            let created = self.api.create_post(&post).await?;
            enrich_one(self.api.as_ref(), created).await
        }
        .await;

        match result {
            Ok(created) => {
                tracing::info!("Created post {}", created.record.id);
                let mut store = self.store.lock().await;
                store.dispatch(PostsAction::Created(created.clone()));
                store.dispatch(PostsAction::UploadedFilesReset);
                Ok(created)
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(PostsAction::CreateFailed(
                    e.user_message("Failed to create the post"),
                ))
                .await;
                Err(e)
            }
        }
    }

    pub async fn update_post(&self, id: PostId, patch: PostPatch) -> ClientResult<EnrichedPost> {
        if let Some(title) = &patch.title {
            require_text(title, "Title")?;
        }
        if let Some(content) = &patch.content {
            require_text(content, "Content")?;
        }
        self.require_viewer().await?;
        self.dispatch(PostsAction::UpdateStarted).await;

        let result = async {
            let updated = self.api.update_post(id, &patch).await?;
            enrich_one(self.api.as_ref(), updated).await
        }
        .await;

        match result {
            Ok(updated) => {
                self.dispatch(PostsAction::Updated(updated.clone())).await;
                Ok(updated)
            }
            Err(e) => {
                self.settle_error(&e).await;
                self.dispatch(PostsAction::UpdateFailed(
                    e.user_message("Failed to update the post"),
                ))
                .await;
                Err(e)
            }
        }
    }

    /// Flip a post between active and inactive. Only admins may reactivate.
    pub async fn toggle_post_status(&self, id: PostId) -> ClientResult<EnrichedPost> {
        let viewer = self.require_viewer().await?;

        let known = self
            .read(|s| s.posts.find(id).map(|p| p.record.status))
            .await;
        let status = match known {
            Some(status) => status,
            None => self.api.get_post(id).await?.status,
        };

        if status == ContentStatus::Inactive && !viewer.is_admin() {
            return Err(ClientError::Forbidden(
                "Only administrators can reactivate a post".to_string(),
            ));
        }

        let patch = PostPatch {
            status: Some(status.toggled()),
            ..Default::default()
        };
        self.update_post(id, patch).await
    }

    pub async fn delete_post(&self, id: PostId) -> ClientResult<()> {
        self.require_viewer().await?;
        if let Err(e) = self.api.delete_post(id).await {
            self.settle_error(&e).await;
            self.dispatch(PostsAction::UpdateFailed(
                e.user_message("Failed to delete the post"),
            ))
            .await;
            return Err(e);
        }
        tracing::info!("Deleted post {}", id);
        self.dispatch(PostsAction::Removed(id)).await;
        Ok(())
    }

    /// Upload attachments; server names accumulate until the next post is
    /// created or [`ForumClient::reset_uploaded_files`] is called.
    pub async fn upload_post_files(&self, files: Vec<Upload>) -> ClientResult<Vec<String>> {
        if files.is_empty() {
            return Err(ClientError::validation("No files to upload"));
        }
        self.require_viewer().await?;

        match self.api.upload_post_files(files).await {
            Ok(names) => {
                self.dispatch(PostsAction::FilesUploaded(names.clone()))
                    .await;
                Ok(names)
            }
            Err(e) => {
                self.settle_error(&e).await;
                Err(e)
            }
        }
    }

    pub async fn reset_uploaded_files(&self) {
        self.dispatch(PostsAction::UploadedFilesReset).await;
    }

    pub async fn add_favorite(&self, id: PostId) -> ClientResult<()> {
        self.set_favorite(id, true).await
    }

    pub async fn remove_favorite(&self, id: PostId) -> ClientResult<()> {
        self.set_favorite(id, false).await
    }

    async fn set_favorite(&self, id: PostId, favourite: bool) -> ClientResult<()> {
        self.require_viewer().await?;

        let previous = {
            let mut store = self.store.lock().await;
            let previous = store
                .state()
                .posts
                .find(id)
                .and_then(|p| p.record.is_favourite)
                .unwrap_or(false);
            store.dispatch(PostsAction::FavoriteSet { id, favourite });
            previous
        };

        let result = if favourite {
            self.api.add_favorite(id).await
        } else {
            self.api.remove_favorite(id).await
        };

        if let Err(e) = result {
            tracing::warn!("Favorite change on post {} failed, rolling back", id);
            self.dispatch(PostsAction::FavoriteSet {
                id,
                favourite: previous,
            })
            .await;
            self.settle_error(&e).await;
            return Err(e);
        }
        Ok(())
    }
}
