// Gateway trait - isolates every network side effect behind one seam
mod http;
mod wire;

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::{
    Category, CategoryId, CategoryInput, Comment, CommentId, CommentPatch, NewComment, NewPost,
    Page, Post, PostId, PostPatch, Upload, User, UserId, UserPatch,
};
use crate::query::{ListSource, SortOrder};
use crate::reaction::{ReactionStatus, ReactionTarget};

pub use http::HttpForumApi;
pub use wire::{ApiError, DataEnvelope, ListEnvelope};

/// Bearer tokens handed over by the external login flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortKey {
    #[default]
    Login,
    Rating,
}

impl UserSortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Rating => "rating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_by: UserSortKey,
    pub order: SortOrder,
}

impl Default for UserListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: crate::query::PAGE_SIZE,
            sort_by: UserSortKey::Login,
            order: SortOrder::Asc,
        }
    }
}

/// One method per REST call the client makes
#[async_trait]
pub trait ForumApi: Send + Sync {
    /// Install (or, with an empty session, drop) the bearer tokens
    async fn set_session(&self, _session: Session) {}

    // Posts
    async fn list_posts(
        &self,
        source: ListSource,
        params: &[(String, String)],
    ) -> ClientResult<Page<Post>>;
    async fn get_post(&self, id: PostId) -> ClientResult<Post>;
    async fn create_post(&self, post: &NewPost) -> ClientResult<Post>;
    async fn update_post(&self, id: PostId, patch: &PostPatch) -> ClientResult<Post>;
    async fn delete_post(&self, id: PostId) -> ClientResult<()>;
    /// Returns the server-side file names
    async fn upload_post_files(&self, files: Vec<Upload>) -> ClientResult<Vec<String>>;
    async fn add_favorite(&self, id: PostId) -> ClientResult<()>;
    async fn remove_favorite(&self, id: PostId) -> ClientResult<()>;

    // Reactions
    async fn react(&self, target: ReactionTarget, like: bool) -> ClientResult<()>;
    async fn remove_reaction(&self, target: ReactionTarget) -> ClientResult<()>;
    async fn reaction_status(&self, target: ReactionTarget) -> ClientResult<ReactionStatus>;

    // Comments
    async fn list_comments(
        &self,
        post_id: PostId,
        viewer: Option<UserId>,
    ) -> ClientResult<Vec<Comment>>;
    async fn create_comment(&self, post_id: PostId, comment: &NewComment)
        -> ClientResult<Comment>;
    async fn update_comment(&self, id: CommentId, patch: &CommentPatch) -> ClientResult<Comment>;
    async fn delete_comment(&self, id: CommentId) -> ClientResult<()>;

    // Categories
    async fn list_categories(
        &self,
        page: u32,
        limit: u32,
        title: &str,
    ) -> ClientResult<Page<Category>>;
    async fn get_category(&self, id: CategoryId) -> ClientResult<Category>;
    async fn create_category(&self, input: &CategoryInput) -> ClientResult<Category>;
    async fn update_category(&self, id: CategoryId, input: &CategoryInput)
        -> ClientResult<Category>;
    async fn delete_category(&self, id: CategoryId) -> ClientResult<()>;

    // Users
    async fn get_user(&self, id: UserId) -> ClientResult<User>;
    async fn update_user(&self, id: UserId, patch: &UserPatch) -> ClientResult<User>;
    async fn list_users(&self, query: &UserListQuery) -> ClientResult<Page<User>>;
    /// Returns the server-side file name of the stored avatar
    async fn upload_avatar(&self, file: Upload) -> ClientResult<String>;
}
