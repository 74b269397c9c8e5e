use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use url::Url;

use super::wire::{
    ApiError, DataEnvelope, FavoriteBody, ListEnvelope, ReactionBody, RefreshBody,
    RefreshedToken, UploadAvatarResponse, UploadFilesResponse,
};
use super::{ForumApi, Session, UserListQuery};
use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    Category, CategoryId, CategoryInput, Comment, CommentId, CommentPatch, NewComment, NewPost,
    Page, Post, PostId, PostPatch, Upload, User, UserId, UserPatch,
};
use crate::query::ListSource;
use crate::reaction::{ReactionStatus, ReactionTarget};

/// `reqwest` implementation of the gateway
pub struct HttpForumApi {
    client: Client,
    base_url: Url,
    session: RwLock<Session>,
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn is_auth_path(path: &str) -> bool {
    path.starts_with("auth/")
}

fn file_part(upload: &Upload) -> Part {
    let part = Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name.clone());
    match part.mime_str(&upload.mime()) {
        Ok(part) => part,
        Err(_) => Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name.clone()),
    }
}

impl HttpForumApi {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            session: RwLock::new(Session::default()),
        })
    }

    pub fn from_config(config: &ApiConfig) -> ClientResult<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.read().await.access_token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ApiError>()
            .await
            .ok()
            .and_then(|body| body.message);
        Err(ClientError::from_status(status, message))
    }

    /// Send a request built by `build`. A 401/403 outside `auth/` triggers
    /// one token refresh and a single retry.
    async fn send<F>(&self, path: &str, build: F) -> ClientResult<Response>
    where
        F: Fn(&Client, Url) -> RequestBuilder + Send + Sync,
    {
        let url = self.url(path)?;
        let response = self
            .authorized(build(&self.client, url.clone()))
            .await
            .send()
            .await?;

        if !is_auth_failure(response.status()) || is_auth_path(path) {
            return Self::check(response).await;
        }

        tracing::debug!("{} on {}, refreshing access token", response.status(), path);
        self.refresh().await?;

        let retry = self
            .authorized(build(&self.client, url))
            .await
            .send()
            .await?;
        Self::check(retry).await
    }

    async fn refresh(&self) -> ClientResult<()> {
        let refresh_token = self.session.read().await.refresh_token.clone();
        let Some(refresh_token) = refresh_token else {
            self.expire().await;
            return Err(ClientError::SessionExpired);
        };

        let url = self.url("auth/access-token/refresh")?;
        let response = self
            .client
            .post(url)
            .json(&RefreshBody {
                refresh_token: &refresh_token,
            })
            .send()
            .await;

        let refreshed = match response {
            Ok(resp) if resp.status().is_success() => {
                resp.json::<DataEnvelope<RefreshedToken>>().await.ok()
            }
            Ok(resp) => {
                tracing::error!("Token refresh rejected with {}", resp.status());
                None
            }
            Err(e) => {
                tracing::error!("Token refresh failed: {}", e);
                None
            }
        };

        match refreshed {
            Some(envelope) => {
                self.session.write().await.access_token = Some(envelope.data.access_token);
                Ok(())
            }
            None => {
                self.expire().await;
                Err(ClientError::SessionExpired)
            }
        }
    }

    async fn expire(&self) {
        *self.session.write().await = Session::default();
    }

    async fn data<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let envelope: DataEnvelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn page<T: DeserializeOwned>(response: Response) -> ClientResult<Page<T>> {
        let envelope: ListEnvelope<T> = response.json().await?;
        Ok(envelope.into_page())
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(path, |c, url| c.get(url)).await?;
        Self::data(response).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(path, |c, url| c.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl ForumApi for HttpForumApi {
    async fn set_session(&self, session: Session) {
        *self.session.write().await = session;
    }

    async fn list_posts(
        &self,
        source: ListSource,
        params: &[(String, String)],
    ) -> ClientResult<Page<Post>> {
        let path = source.path();
        tracing::info!("Fetching posts for {}", source);
        let response = self.send(&path, |c, url| c.get(url).query(params)).await?;
        Self::page(response).await
    }

    async fn get_post(&self, id: PostId) -> ClientResult<Post> {
        self.get_data(&format!("posts/{}", id)).await
    }

    async fn create_post(&self, post: &NewPost) -> ClientResult<Post> {
        let response = self.send("posts", |c, url| c.post(url).json(post)).await?;
        Self::data(response).await
    }

    async fn update_post(&self, id: PostId, patch: &PostPatch) -> ClientResult<Post> {
        let path = format!("posts/{}", id);
        let response = self.send(&path, |c, url| c.patch(url).json(patch)).await?;
        Self::data(response).await
    }

    async fn delete_post(&self, id: PostId) -> ClientResult<()> {
        self.delete(&format!("posts/{}", id)).await
    }

    async fn upload_post_files(&self, files: Vec<Upload>) -> ClientResult<Vec<String>> {
        let response = self
            .send("posts/upload-files", |c, url| {
                let form = files
                    .iter()
                    .fold(Form::new(), |form, file| form.part("media", file_part(file)));
                c.post(url).multipart(form)
            })
            .await?;
        let saved: UploadFilesResponse = response.json().await?;
        Ok(saved
            .saved_files
            .into_iter()
            .map(|f| f.server_filename)
            .collect())
    }

    async fn add_favorite(&self, id: PostId) -> ClientResult<()> {
        let body = FavoriteBody {
            post_id: id.to_string(),
        };
        self.send("users/favorite-posts", |c, url| c.post(url).json(&body))
            .await?;
        Ok(())
    }

    async fn remove_favorite(&self, id: PostId) -> ClientResult<()> {
        self.delete(&format!("users/favorite-posts/{}", id)).await
    }

    async fn react(&self, target: ReactionTarget, like: bool) -> ClientResult<()> {
        let path = format!("{}/like", target.path());
        let body = ReactionBody::new(like);
        self.send(&path, |c, url| c.post(url).json(&body)).await?;
        Ok(())
    }

    async fn remove_reaction(&self, target: ReactionTarget) -> ClientResult<()> {
        self.delete(&format!("{}/like", target.path())).await
    }

    async fn reaction_status(&self, target: ReactionTarget) -> ClientResult<ReactionStatus> {
        self.get_data(&format!("{}/like-status", target.path()))
            .await
    }

    async fn list_comments(
        &self,
        post_id: PostId,
        viewer: Option<UserId>,
    ) -> ClientResult<Vec<Comment>> {
        let path = format!("posts/{}/comments", post_id);
        let response = self
            .send(&path, |c, url| match viewer {
                Some(id) => c.get(url).query(&[("userId", id.get())]),
                None => c.get(url),
            })
            .await?;
        Self::data(response).await
    }

    async fn create_comment(
        &self,
        post_id: PostId,
        comment: &NewComment,
    ) -> ClientResult<Comment> {
        let path = format!("posts/{}/comments", post_id);
        let response = self.send(&path, |c, url| c.post(url).json(comment)).await?;
        Self::data(response).await
    }

    async fn update_comment(&self, id: CommentId, patch: &CommentPatch) -> ClientResult<Comment> {
        let path = format!("comments/{}", id);
        let response = self.send(&path, |c, url| c.patch(url).json(patch)).await?;
        Self::data(response).await
    }

    async fn delete_comment(&self, id: CommentId) -> ClientResult<()> {
        self.delete(&format!("comments/{}", id)).await
    }

    async fn list_categories(
        &self,
        page: u32,
        limit: u32,
        title: &str,
    ) -> ClientResult<Page<Category>> {
        let response = self
            .send("categories", |c, url| {
                c.get(url).query(&[
                    ("page", page.to_string()),
                    ("limit", limit.to_string()),
                    ("title", title.to_string()),
                ])
            })
            .await?;
        Self::page(response).await
    }

    async fn get_category(&self, id: CategoryId) -> ClientResult<Category> {
        self.get_data(&format!("categories/{}", id)).await
    }

    async fn create_category(&self, input: &CategoryInput) -> ClientResult<Category> {
        let response = self
            .send("categories", |c, url| c.post(url).json(input))
            .await?;
        Self::data(response).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> ClientResult<Category> {
        let path = format!("categories/{}", id);
        let response = self.send(&path, |c, url| c.patch(url).json(input)).await?;
        Self::data(response).await
    }

    async fn delete_category(&self, id: CategoryId) -> ClientResult<()> {
        self.delete(&format!("categories/{}", id)).await
    }

    async fn get_user(&self, id: UserId) -> ClientResult<User> {
        self.get_data(&format!("users/{}", id)).await
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> ClientResult<User> {
        let path = format!("users/{}", id);
        let response = self.send(&path, |c, url| c.patch(url).json(patch)).await?;
        Self::data(response).await
    }

    async fn list_users(&self, query: &UserListQuery) -> ClientResult<Page<User>> {
        let response = self
            .send("users", |c, url| {
                c.get(url).query(&[
                    ("page", query.page.to_string()),
                    ("limit", query.limit.to_string()),
                    ("sortBy", query.sort_by.as_str().to_string()),
                    ("order", query.order.as_str().to_string()),
                ])
            })
            .await?;
        Self::page(response).await
    }

    async fn upload_avatar(&self, file: Upload) -> ClientResult<String> {
        let response = self
            .send("users/upload-avatar", |c, url| {
                c.post(url)
                    .multipart(Form::new().part("avatar", file_part(&file)))
            })
            .await?;
        let saved: UploadAvatarResponse = response.json().await?;
        Ok(saved.server_filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let api = HttpForumApi::new("http://localhost:3001/api", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url().as_str(), "http://localhost:3001/api/");
        assert_eq!(
            api.url("posts/4/like").unwrap().as_str(),
            "http://localhost:3001/api/posts/4/like"
        );
    }

    #[test]
    fn auth_paths_are_not_retried() {
        assert!(is_auth_path("auth/access-token/refresh"));
        assert!(!is_auth_path("posts"));
        assert!(is_auth_failure(StatusCode::FORBIDDEN));
        assert!(!is_auth_failure(StatusCode::NOT_FOUND));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = HttpForumApi::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(ClientError::Url(_))));
    }
}
