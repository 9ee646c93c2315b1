//! Integration tests for the user endpoints
//!
//! - GET /api/users?search=
//! - GET /api/users/{user_id}
//! - PUT /api/users/{user_id}/role
//! - DELETE /api/users/me

mod common;

#[cfg(test)]
mod user_tests {
    use super::common::*;
    use axum::http::{StatusCode, header::AUTHORIZATION};
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    // ============================================================
    // GET /api/users?search=
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_search_users_by_prefix(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/users")
            .add_query_param("search", "ch")
            .add_header(AUTHORIZATION, bob())
            .await;

        response.assert_status_ok();
        let users = response.json::<Vec<Value>>();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["username"], "charlie");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_search_users_treats_wildcards_literally(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/users")
            .add_query_param("search", "%")
            .add_header(AUTHORIZATION, bob())
            .await;

        response.assert_status_ok();
        assert!(response.json::<Vec<Value>>().is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_search_users_requires_auth(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/api/users").add_query_param("search", "a").await;

        response.assert_status_unauthorized();
        Ok(())
    }

    // ============================================================
    // GET /api/users/{user_id}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_get_user_by_id(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/api/users/1").add_header(AUTHORIZATION, bob()).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role"], "ADMIN");
        assert!(body.get("password").is_none());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_get_user_not_found(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/api/users/999").add_header(AUTHORIZATION, bob()).await;

        response.assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // PUT /api/users/{user_id}/role
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_update_role_as_admin(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .put("/api/users/2/role")
            .add_header(AUTHORIZATION, alice())
            .json(&json!({"role": "MODERATOR"}))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["role"], "MODERATOR");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_update_role_denied_for_user(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .put("/api/users/2/role")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"role": "ADMIN"}))
            .await;

        response.assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_update_role_denied_for_moderator(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .put("/api/users/2/role")
            .add_header(AUTHORIZATION, charlie())
            .json(&json!({"role": "MODERATOR"}))
            .await;

        response.assert_status_forbidden();
        Ok(())
    }

    // ============================================================
    // DELETE /api/users/me
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_delete_my_account_revokes_access(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let response = server.delete("/api/users/me").add_header(AUTHORIZATION, bob()).await;
        response.assert_status(StatusCode::NO_CONTENT);

        // The account is anonymised and its token no longer authenticates
        let user = load_user(&state, 2).await;
        assert_eq!(user.username, "deleted-user-2");
        assert!(user.password.is_empty());

        server
            .get("/api/auth/me")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_unauthorized();
        Ok(())
    }
}
