use super::ForumClient;
use crate::api::ForumApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{Category, CategoryId, CategoryInput, Page};
use crate::query::PAGE_SIZE;
use crate::store::CategoriesAction;

impl<A: ForumApi + 'static> ForumClient<A> {
    pub async fn list_categories(&self, page: u32, title: &str) -> ClientResult<Page<Category>> {
        let page = page.max(1);
        self.dispatch(CategoriesAction::ListStarted {
            page,
            title: title.to_string(),
        })
        .await;

        match self.api.list_categories(page, PAGE_SIZE, title).await {
            Ok(categories) => {
                self.dispatch(CategoriesAction::ListLoaded(categories.clone()))
                    .await;
                Ok(categories)
            }
            Err(e) => Err(self
                .category_failed(e, "Failed to load the categories")
                .await),
        }
    }

    pub async fn get_category(&self, id: CategoryId) -> ClientResult<Category> {
        self.dispatch(CategoriesAction::Started).await;
        match self.api.get_category(id).await {
            Ok(category) => {
                self.dispatch(CategoriesAction::Loaded(category.clone()))
                    .await;
                Ok(category)
            }
            Err(e) => Err(self.category_failed(e, "Failed to load the category").await),
        }
    }

    pub async fn create_category(&self, input: CategoryInput) -> ClientResult<Category> {
        if input.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(ClientError::validation("Title cannot be empty"));
        }
        self.require_viewer().await?;
        self.dispatch(CategoriesAction::Started).await;

        match self.api.create_category(&input).await {
            Ok(category) => {
                tracing::info!("Created category {}", category.title);
                self.dispatch(CategoriesAction::Created(category.clone()))
                    .await;
                Ok(category)
            }
            Err(e) => Err(self.category_failed(e, "Failed to create the category").await),
        }
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        input: CategoryInput,
    ) -> ClientResult<Category> {
        if input.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ClientError::validation("Title cannot be empty"));
        }
        self.require_viewer().await?;
        self.dispatch(CategoriesAction::Started).await;

        match self.api.update_category(id, &input).await {
            Ok(category) => {
                self.dispatch(CategoriesAction::Updated(category.clone()))
                    .await;
                Ok(category)
            }
            Err(e) => Err(self.category_failed(e, "Failed to update the category").await),
        }
    }

    pub async fn delete_category(&self, id: CategoryId) -> ClientResult<()> {
        self.require_viewer().await?;
        self.dispatch(CategoriesAction::Started).await;

        match self.api.delete_category(id).await {
            Ok(()) => {
                self.dispatch(CategoriesAction::Removed(id)).await;
                Ok(())
            }
            Err(e) => Err(self.category_failed(e, "Failed to delete the category").await),
        }
    }

    async fn category_failed(&self, e: ClientError, fallback: &str) -> ClientError {
        self.settle_error(&e).await;
        self.dispatch(CategoriesAction::Failed(e.user_message(fallback)))
            .await;
        e
    }
}
