// JSON envelopes the forum API wraps its payloads in
use serde::{Deserialize, Serialize};

use crate::models::Page;

/// `{ "message": "...", "data": ... }`
#[derive(Debug, Deserialize, Serialize)]
pub struct DataEnvelope<T> {
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// `{ "data": [...], "found": n, "total": n }`
#[derive(Debug, Deserialize, Serialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub found: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> ListEnvelope<T> {
    /// `found` falls back to `total`, then to the page length
    pub fn into_page(self) -> Page<T> {
        let len = self.data.len() as u64;
        let found = self.found.or(self.total).unwrap_or(len);
        let total = self.total.unwrap_or(found);
        Page {
            items: self.data,
            found,
            total,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SavedFile {
    pub server_filename: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadFilesResponse {
    #[serde(rename = "savedFiles", default)]
    pub saved_files: Vec<SavedFile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadAvatarResponse {
    pub server_filename: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshedToken {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReactionBody {
    #[serde(rename = "isLike")]
    pub is_like: &'static str,
}

impl ReactionBody {
    pub fn new(like: bool) -> Self {
        Self {
            is_like: if like { "true" } else { "false" },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct FavoriteBody {
    #[serde(rename = "postId")]
    pub post_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshBody<'a> {
    #[serde(rename = "refreshToken")]
    pub refresh_token: &'a str,
}
