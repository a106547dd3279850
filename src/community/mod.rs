//! Community forum posts: created by any signed-in user, readable by all.
//! The author's name and role are denormalized onto the post at create
//! time so listings render without a profile lookup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{require_user, Role, SessionService, UserId, UserProfile};
use crate::store::{self, KeyValueStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: PostId,
    pub user_id: UserId,
    pub author_name: String,
    pub author_role: Role,
    pub title: String,
    pub content: String,
    pub category: String,
    pub likes: u32,
    pub replies: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CommunityError {
    #[error(transparent)]
    Storage(#[from] StoreError),
}

static POST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_post_id() -> PostId {
    let seq = POST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PostId(format!("post-{}-{seq:04}", Utc::now().timestamp_millis()))
}

fn record_key(id: &PostId) -> String {
    format!("community:post:{}", id.0)
}

const ALL_POSTS_INDEX: &str = "community:posts:all";

pub struct CommunityService {
    store: Arc<dyn KeyValueStore>,
}

impl CommunityService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, author: &UserProfile, post: NewPost) -> Result<CommunityPost, CommunityError> {
        let post = CommunityPost {
            id: next_post_id(),
            user_id: author.id.clone(),
            author_name: author.name.clone(),
            author_role: author.role,
            title: post.title,
            content: post.content,
            category: post.category,
            likes: 0,
            replies: 0,
            created_at: Utc::now(),
        };

        store::put_record(self.store.as_ref(), &record_key(&post.id), &post)?;
        store::push_index(self.store.as_ref(), ALL_POSTS_INDEX, &post.id.0)?;
        Ok(post)
    }

    /// All posts, newest first.
    pub fn list(&self) -> Result<Vec<CommunityPost>, CommunityError> {
        let ids = store::read_index(self.store.as_ref(), ALL_POSTS_INDEX)?;
        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            let key = record_key(&PostId(id));
            if let Some(post) = store::get_record(self.store.as_ref(), &key)? {
                posts.push(post);
            }
        }
        posts.reverse();
        Ok(posts)
    }
}

/// Shared state for the forum endpoints.
#[derive(Clone)]
pub struct CommunityApi {
    pub sessions: Arc<SessionService>,
    pub service: Arc<CommunityService>,
}

pub fn community_router(api: CommunityApi) -> Router {
    Router::new()
        .route(
            "/api/v1/community/posts",
            get(list_handler).post(create_handler),
        )
        .with_state(api)
}

async fn create_handler(
    State(api): State<CommunityApi>,
    headers: HeaderMap,
    Json(post): Json<NewPost>,
) -> Response {
    let profile = match require_user(&api.sessions, &headers) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match api.service.create(&profile, post) {
        Ok(post) => (StatusCode::CREATED, Json(json!({ "post": post }))).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

async fn list_handler(State(api): State<CommunityApi>) -> Response {
    match api.service.list() {
        Ok(posts) => (StatusCode::OK, Json(json!({ "posts": posts }))).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FarmType;
    use crate::store::MemoryStore;

    fn author() -> UserProfile {
        UserProfile {
            id: UserId("user-1".to_string()),
            email: "farmer@example.com".to_string(),
            name: "Rajesh Kumar".to_string(),
            role: Role::Farmer,
            farm_type: Some(FarmType::Poultry),
            location: "Bangalore, Karnataka".to_string(),
            language: "en".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn posts_carry_the_author_snapshot() {
        let service = CommunityService::new(Arc::new(MemoryStore::default()));
        let post = service
            .create(
                &author(),
                NewPost {
                    title: "Best practices for footbath maintenance?".to_string(),
                    content: "How often should the disinfectant be changed?".to_string(),
                    category: "diseaseControl".to_string(),
                },
            )
            .expect("create succeeds");

        assert_eq!(post.author_name, "Rajesh Kumar");
        assert_eq!(post.author_role, Role::Farmer);
        assert_eq!(post.likes, 0);

        let listed = service.list().expect("list succeeds");
        assert_eq!(listed, vec![post]);
    }

    #[test]
    fn list_is_newest_first() {
        let service = CommunityService::new(Arc::new(MemoryStore::default()));
        let first = service
            .create(
                &author(),
                NewPost {
                    title: "First".to_string(),
                    content: "First post".to_string(),
                    category: "general".to_string(),
                },
            )
            .expect("create");
        let second = service
            .create(
                &author(),
                NewPost {
                    title: "Second".to_string(),
                    content: "Second post".to_string(),
                    category: "general".to_string(),
                },
            )
            .expect("create");

        let listed = service.list().expect("list");
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }
}
