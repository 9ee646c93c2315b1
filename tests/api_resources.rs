//! Integration tests for the learning resources endpoints
//!
//! - GET /api/resources with its filters
//! - GET /api/resources/category/{category} and /difficulty/{level}
//! - GET /api/resources/search/tags
//! - POST/PUT/DELETE /api/resources

mod common;

#[cfg(test)]
mod resource_tests {
    use super::common::*;
    use axum::http::{StatusCode, header::AUTHORIZATION};
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    fn titles(response: &axum_test::TestResponse) -> Vec<String> {
        response
            .json::<Vec<Value>>()
            .iter()
            .map(|r| r["title"].as_str().unwrap().to_string())
            .collect()
    }

    // ============================================================
    // Catalog reads
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "resources")))]
    async fn test_list_resources_sorted_by_title(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/resources")
            .add_header(AUTHORIZATION, bob())
            .await;

        response.assert_status_ok();
        assert_eq!(
            titles(&response),
            vec!["Planning Poker", "Scaling Scrum", "Scrum Guide", "Story Mapping"]
        );
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "resources")))]
    async fn test_list_resources_with_filters(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/resources")
            .add_query_param("category", "fundamentals")
            .add_header(AUTHORIZATION, bob())
            .await;
        assert_eq!(titles(&response), vec!["Scaling Scrum", "Scrum Guide"]);

        let response = server
            .get("/api/resources")
            .add_query_param("category", "fundamentals")
            .add_query_param("difficulty", "advanced")
            .add_header(AUTHORIZATION, bob())
            .await;
        assert_eq!(titles(&response), vec!["Scaling Scrum"]);

        let response = server
            .get("/api/resources")
            .add_query_param("resource_type", "article")
            .add_header(AUTHORIZATION, bob())
            .await;
        assert_eq!(titles(&response), vec!["Planning Poker", "Scaling Scrum"]);

        let response = server
            .get("/api/resources")
            .add_query_param("tag", "agile")
            .add_header(AUTHORIZATION, bob())
            .await;
        assert_eq!(titles(&response), vec!["Scrum Guide", "Story Mapping"]);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "resources")))]
    async fn test_list_by_category_and_difficulty(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/resources/category/estimation")
            .add_header(AUTHORIZATION, bob())
            .await;
        response.assert_status_ok();
        assert_eq!(titles(&response), vec!["Planning Poker"]);

        let response = server
            .get("/api/resources/difficulty/intermediate")
            .add_header(AUTHORIZATION, bob())
            .await;
        response.assert_status_ok();
        assert_eq!(titles(&response), vec!["Story Mapping"]);

        let response = server
            .get("/api/resources/difficulty/expert")
            .add_header(AUTHORIZATION, bob())
            .await;
        response.assert_status_ok();
        assert!(titles(&response).is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "resources")))]
    async fn test_search_by_any_tag(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/resources/search/tags")
            .add_query_param("tags", "games, scaling")
            .add_header(AUTHORIZATION, bob())
            .await;
        response.assert_status_ok();
        assert_eq!(titles(&response), vec!["Planning Poker", "Scaling Scrum"]);

        server
            .get("/api/resources/search/tags")
            .add_query_param("tags", " , ")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "resources")))]
    async fn test_get_resource(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/resources/2")
            .add_header(AUTHORIZATION, bob())
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["title"], "Planning Poker");
        assert_eq!(body["tags"], json!(["estimation", "games"]));
        assert_eq!(body["content"]["body"], "Estimate with Fibonacci cards");

        server
            .get("/api/resources/99")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_not_found();

        server
            .get("/api/resources/2")
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    // ============================================================
    // CRUD
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_resource_lifecycle(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/resources")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({
                "title": "Definition of Done",
                "resource_type": "checklist",
                "category": "quality",
                "difficulty": "beginner",
                "content": {"items": ["tested", "reviewed"]},
                "tags": ["quality"]
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let id = response.json::<Value>()["resource_id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/resources/{}", id))
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"title": "Definition of Done v2", "tags": ["quality", "team"]}))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["title"], "Definition of Done v2");
        assert_eq!(body["category"], "quality");
        assert_eq!(body["tags"], json!(["quality", "team"]));

        server
            .delete(&format!("/api/resources/{}", id))
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/api/resources/{}", id))
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_not_found();
        server
            .delete(&format!("/api/resources/{}", id))
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_not_found();
        server
            .put(&format!("/api/resources/{}", id))
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"title": "Gone"}))
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_resource_validates_input(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/api/resources")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({
                "title": "",
                "resource_type": "article",
                "category": "misc",
                "difficulty": "beginner"
            }))
            .await
            .assert_status_bad_request();
        Ok(())
    }
}
