//! Integration tests for the auth endpoints
//!
//! - POST /api/auth/register
//! - POST /api/auth/login
//! - GET /api/auth/me
//! - PUT /api/auth/profile
//! - PUT /api/auth/change-password
//!
//! Each `#[sqlx::test]` gets a fresh SQLite database with the migrations
//! applied, then loads the listed fixtures.

mod common;

#[cfg(test)]
mod auth_tests {
    use super::common::*;
    use axum::http::{StatusCode, header::AUTHORIZATION};
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    fn registration(username: &str, email: &str) -> Value {
        json!({
            "username": username,
            "email": email,
            "password": "Sup3rSecret!"
        })
    }

    // ============================================================
    // POST /api/auth/register
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_success(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/register")
            .json(&registration("dana", "dana@example.com"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(body["user"]["username"], "dana");
        assert_eq!(body["user"]["role"], "USER");
        assert!(body["user"].get("password").is_none(), "password must never be returned");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_duplicate_username(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/register")
            .json(&registration("alice", "another@example.com"))
            .await;

        response.assert_status_conflict();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_duplicate_email(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/register")
            .json(&registration("someone", "bob@example.com"))
            .await;

        response.assert_status_conflict();
        Ok(())
    }

    #[sqlx::test]
    async fn test_register_invalid_input(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "username": "x",
                "email": "not-an-email",
                "password": "123"
            }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(body["error"], "Validation error");
        Ok(())
    }

    // ============================================================
    // POST /api/auth/login
    // ============================================================

    #[sqlx::test]
    async fn test_login_success(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/api/auth/register")
            .json(&registration("logintest", "login@example.com"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/auth/login")
            .json(&json!({
                "email": "login@example.com",
                "password": "Sup3rSecret!"
            }))
            .await;

        response.assert_status_ok();
        let headers = response.headers();
        assert!(headers.get("set-cookie").is_some(), "Set-Cookie header should be present");
        let auth_header = headers
            .get("authorization")
            .expect("Authorization header should be present")
            .to_str()
            .unwrap();
        assert!(auth_header.starts_with("Bearer "));

        let body = response.json::<Value>();
        assert_eq!(body["user"]["email"], "login@example.com");
        Ok(())
    }

    #[sqlx::test]
    async fn test_login_wrong_password(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/api/auth/register")
            .json(&registration("logintest", "login@example.com"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/auth/login")
            .json(&json!({
                "email": "login@example.com",
                "password": "wrong-password"
            }))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_unknown_email(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/login")
            .json(&json!({
                "email": "nobody@example.com",
                "password": "whatever123"
            }))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    // ============================================================
    // GET /api/auth/me
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_me_with_valid_token(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/api/auth/me").add_header(AUTHORIZATION, bob()).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["id"], 2);
        assert_eq!(body["username"], "bob");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_me_without_token(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/api/auth/me").await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_me_with_invalid_token(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/auth/me")
            .add_header(AUTHORIZATION, "Bearer not.a.jwt".to_string())
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_me_with_token_in_query(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/auth/me")
            .add_query_param("token", create_test_jwt(3, "charlie"))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["username"], "charlie");
        Ok(())
    }

    // ============================================================
    // PUT /api/auth/profile
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_update_profile_ignores_protected_fields(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .put("/api/auth/profile")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({
                "bio": "Backend developer",
                "team_role": "Tech Lead",
                "email": "hacker@example.com",
                "role": "ADMIN",
                "password": "newpassword123"
            }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["bio"], "Backend developer");
        assert_eq!(body["team_role"], "Tech Lead");
        assert_eq!(body["email"], "bob@example.com");
        assert_eq!(body["role"], "USER");
        Ok(())
    }

    // ============================================================
    // PUT /api/auth/change-password
    // ============================================================

    #[sqlx::test]
    async fn test_change_password_wrong_current(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let registered = server
            .post("/api/auth/register")
            .json(&registration("erin", "erin@example.com"))
            .await;
        let token = registered.json::<Value>()["token"].as_str().unwrap().to_string();

        let response = server
            .put("/api/auth/change-password")
            .add_header(AUTHORIZATION, format!("Bearer {}", token))
            .json(&json!({
                "current_password": "not-my-password",
                "new_password": "An0therSecret!"
            }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test]
    async fn test_change_password_then_login(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let registered = server
            .post("/api/auth/register")
            .json(&registration("erin", "erin@example.com"))
            .await;
        let token = registered.json::<Value>()["token"].as_str().unwrap().to_string();

        server
            .put("/api/auth/change-password")
            .add_header(AUTHORIZATION, format!("Bearer {}", token))
            .json(&json!({
                "current_password": "Sup3rSecret!",
                "new_password": "An0therSecret!"
            }))
            .await
            .assert_status_ok();

        server
            .post("/api/auth/login")
            .json(&json!({"email": "erin@example.com", "password": "Sup3rSecret!"}))
            .await
            .assert_status_unauthorized();

        server
            .post("/api/auth/login")
            .json(&json!({"email": "erin@example.com", "password": "An0therSecret!"}))
            .await
            .assert_status_ok();
        Ok(())
    }
}
