// Library exports for agora
// The binary and integration tests drive the client through these modules

pub mod api;
pub mod client;
pub mod config;
pub mod debounce;
pub mod enrich;
pub mod error;
pub mod models;
pub mod query;
pub mod reaction;
pub mod store;

pub use api::{ForumApi, HttpForumApi, Session};
pub use client::ForumClient;
pub use error::{ClientError, ClientResult};
