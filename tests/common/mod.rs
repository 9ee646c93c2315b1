#![allow(dead_code)]

use axum_test::TestServer;
use scrumboard::core::{AppState, encode_jwt};
use scrumboard::entities::User;
use scrumboard::repositories::Read;
use sqlx::SqlitePool;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "scrumboard-test-secret-do-not-use-elsewhere";

/// AppState backed by the per-test database
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState::new(pool, TEST_JWT_SECRET.to_string(), 24))
}

pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = scrumboard::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Token valid for 24 hours, signed with the test secret
pub fn create_test_jwt(user_id: i64, username: &str) -> String {
    encode_jwt(username.to_string(), user_id, TEST_JWT_SECRET, 24)
        .expect("Failed to create JWT token")
}

/// `Authorization` header value for a fixture user
pub fn bearer(user_id: i64, username: &str) -> String {
    format!("Bearer {}", create_test_jwt(user_id, username))
}

/// Fixture users: alice (1, ADMIN), bob (2, USER), charlie (3, MODERATOR)
pub fn alice() -> String {
    bearer(1, "alice")
}

pub fn bob() -> String {
    bearer(2, "bob")
}

pub fn charlie() -> String {
    bearer(3, "charlie")
}

pub async fn load_user(state: &AppState, user_id: i64) -> User {
    state
        .user
        .read(&user_id)
        .await
        .expect("query failed")
        .expect("fixture user missing")
}
