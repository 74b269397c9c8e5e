use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agora::api::{ForumApi, HttpForumApi, Session};
use agora::models::{CategoryId, PostId};
use agora::query::{FilterPatch, ListSource, QueryState};
use agora::reaction::{ReactionStatus, ReactionTarget};
use agora::ClientError;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Default)]
struct MockForum {
    refreshes: AtomicUsize,
    post_hits: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

type Shared = State<Arc<MockForum>>;

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn show_post(
    State(mock): Shared,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    mock.post_hits.fetch_add(1, Ordering::SeqCst);
    if bearer(&headers) != Some("fresh") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "jwt expired" })),
        );
    }
    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Post not found" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "data": {
                "id": id,
                "user_id": 1,
                "title": "Hello",
                "content": "<p>hi</p>",
                "status": "active",
                "likes": 2,
                "dislikes": 0,
                "rating": 4,
                "category_ids": [7],
                "created_at": "2024-05-10T12:00:00.000Z",
                "updated_at": "2024-05-10T12:00:00.000Z"
            }
        })),
    )
}

async fn refresh(State(mock): Shared, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.refreshes.fetch_add(1, Ordering::SeqCst);
    if body["refreshToken"] == "good" {
        (
            StatusCode::OK,
            Json(json!({ "data": { "accessToken": "fresh" } })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "invalid refresh token" })),
        )
    }
}

async fn list_posts(State(mock): Shared, RawQuery(query): RawQuery) -> Json<Value> {
    *mock.last_query.lock().unwrap() = query;
    Json(json!({ "data": [], "found": 0, "total": 0 }))
}

async fn like(Path(_id): Path<u64>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "You already liked this post" })),
    )
}

async fn like_status(Path(_id): Path<u64>) -> Json<Value> {
    Json(json!({ "data": "dislike" }))
}

async fn spawn_server() -> (Arc<MockForum>, String) {
    let mock = Arc::new(MockForum::default());
    let app = Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{id}", get(show_post))
        .route("/api/posts/{id}/like", post(like))
        .route("/api/posts/{id}/like-status", get(like_status))
        .route("/api/auth/access-token/refresh", post(refresh))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (mock, format!("http://{}/api", addr))
}

async fn gateway(base_url: &str, access: &str, refresh: &str) -> HttpForumApi {
    let api = HttpForumApi::new(base_url, Duration::from_secs(5)).unwrap();
    api.set_session(Session {
        access_token: Some(access.to_string()),
        refresh_token: Some(refresh.to_string()),
    })
    .await;
    api
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried() {
    let (mock, base_url) = spawn_server().await;
    let api = gateway(&base_url, "stale", "good").await;

    let post = api.get_post(PostId(4)).await.unwrap();
    assert_eq!(post.id, PostId(4));
    assert_eq!(post.rating, 4);

    assert_eq!(mock.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(mock.post_hits.load(Ordering::SeqCst), 2);
    assert_eq!(api.session().await.access_token.as_deref(), Some("fresh"));

    // Fresh token is reused without another refresh
    api.get_post(PostId(5)).await.unwrap();
    assert_eq!(mock.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_refresh_clears_session() {
    let (mock, base_url) = spawn_server().await;
    let api = gateway(&base_url, "stale", "bad").await;

    let err = api.get_post(PostId(4)).await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert_eq!(mock.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(api.session().await, Session::default());
}

#[tokio::test]
async fn server_message_is_kept() {
    let (_mock, base_url) = spawn_server().await;
    let api = gateway(&base_url, "fresh", "good").await;

    let err = api
        .react(ReactionTarget::Post(PostId(4)), true)
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
            assert_eq!(message, "You already liked this post");
        }
        other => panic!("unexpected error {:?}", other),
    }

    let err = api.get_post(PostId(404)).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.user_message("Failed"), "Post not found");
}

#[tokio::test]
async fn list_query_repeats_category_ids() {
    let (mock, base_url) = spawn_server().await;
    let api = gateway(&base_url, "fresh", "good").await;

    let mut query = QueryState::default();
    query.apply_filters(FilterPatch::categories(&[CategoryId(7)]));
    let page = api
        .list_posts(ListSource::All, &query.to_params(ListSource::All))
        .await
        .unwrap();
    assert!(page.items.is_empty());

    let sent = mock.last_query.lock().unwrap().clone().unwrap();
    assert!(sent.contains("category_ids=7&category_ids=7"), "{}", sent);
    assert!(sent.contains("sortBy=rating"), "{}", sent);
    assert!(sent.contains("order=DESC"), "{}", sent);
}

#[tokio::test]
async fn like_status_is_decoded() {
    let (_mock, base_url) = spawn_server().await;
    let api = gateway(&base_url, "fresh", "good").await;

    let status = api
        .reaction_status(ReactionTarget::Post(PostId(4)))
        .await
        .unwrap();
    assert_eq!(status, ReactionStatus::Disliked);
}
