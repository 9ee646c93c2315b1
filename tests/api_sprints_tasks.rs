//! Integration tests for sprints, tasks, the Kanban board and burndown charts
//!
//! - GET/POST /api/sprints, GET/PUT/DELETE /api/sprints/{id}
//! - GET/POST /api/tasks, GET/PUT/DELETE /api/tasks/{id}, PATCH /api/tasks/{id}/status
//! - GET /api/boards/{sprint_id}
//! - GET /api/burndown/sprint/{sprint_id}, POST /api/burndown/sprint/{sprint_id}/task/{task_id}

mod common;

#[cfg(test)]
mod sprint_task_tests {
    use super::common::*;
    use axum::http::{StatusCode, header::AUTHORIZATION};
    use scrumboard::dtos::{ServerEvent, TaskQuery};
    use scrumboard::entities::TaskStatus;
    use scrumboard::ws::usermap::InternalSignal;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;
    use tokio::sync::mpsc;

    // ============================================================
    // Sprints
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_list_sprints(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/api/sprints").add_header(AUTHORIZATION, bob()).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Value>>().len(), 2);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_sprint(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/sprints")
            .add_header(AUTHORIZATION, alice())
            .json(&json!({
                "name": "Sprint 3",
                "goal": "Polish",
                "start_date": "2025-04-01T09:00:00Z",
                "end_date": "2025-04-11T09:00:00Z",
                "total_story_points": 13
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["name"], "Sprint 3");
        assert_eq!(body["status"], "ACTIVE");
        assert_eq!(body["total_story_points"], 13);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_sprint_rejects_inverted_window(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/sprints")
            .add_header(AUTHORIZATION, alice())
            .json(&json!({
                "name": "Backwards",
                "start_date": "2025-04-11T09:00:00Z",
                "end_date": "2025-04-01T09:00:00Z"
            }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_sprint_rejects_overlong_window(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/api/sprints")
            .add_header(AUTHORIZATION, alice())
            .json(&json!({
                "name": "Forever",
                "start_date": "0001-01-01T00:00:00Z",
                "end_date": "9999-12-31T00:00:00Z"
            }))
            .await
            .assert_status_bad_request();

        server
            .post("/api/sprints")
            .add_header(AUTHORIZATION, alice())
            .json(&json!({
                "name": "Greedy",
                "start_date": "2025-04-01T09:00:00Z",
                "end_date": "2025-04-11T09:00:00Z",
                "total_story_points": i64::MAX
            }))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_update_sprint_checks_merged_window(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        // Sprint 1 starts on 2025-03-03, an end before that is invalid
        let response = server
            .put("/api/sprints/1")
            .add_header(AUTHORIZATION, alice())
            .json(&json!({"end_date": "2025-03-01T00:00:00Z"}))
            .await;
        response.assert_status_bad_request();

        let response = server
            .put("/api/sprints/1")
            .add_header(AUTHORIZATION, alice())
            .json(&json!({"status": "COMPLETED"}))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "COMPLETED");
        assert_eq!(body["name"], "Sprint 1");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_delete_sprint(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .delete("/api/sprints/2")
            .add_header(AUTHORIZATION, alice())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get("/api/sprints/2")
            .add_header(AUTHORIZATION, alice())
            .await
            .assert_status_not_found();

        server
            .delete("/api/sprints/2")
            .add_header(AUTHORIZATION, alice())
            .await
            .assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // Tasks
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_list_tasks_with_filters(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/tasks")
            .add_query_param("sprint_id", 1)
            .add_query_param("status", "DONE")
            .add_header(AUTHORIZATION, bob())
            .await;

        response.assert_status_ok();
        let tasks = response.json::<Vec<Value>>();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t["status"] == "DONE"));
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_create_task_rejects_unknown_sprint(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/tasks")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"title": "Orphan", "sprint_id": 42}))
            .await;

        response.assert_status_not_found();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_task_story_points_are_bounded(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/api/tasks")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"title": "Huge", "sprint_id": 2, "story_points": i64::MAX}))
            .await
            .assert_status_bad_request();

        server
            .put("/api/tasks/1")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"story_points": 10_001}))
            .await
            .assert_status_bad_request();

        server
            .get("/api/boards/2")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_ok();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_create_task_notifies_assignee(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        // Bob has a socket open
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.users_online.register_online(2, tx);

        let response = server
            .post("/api/tasks")
            .add_header(AUTHORIZATION, alice())
            .json(&json!({
                "title": "Review PR",
                "sprint_id": 1,
                "assignee_id": 2,
                "story_points": 3
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["status"], "TODO");
        assert_eq!(body["priority"], "MEDIUM");

        match rx.try_recv() {
            Ok(InternalSignal::Event(outbound)) => match &outbound.event {
                ServerEvent::Notification { kind, link, .. } => {
                    assert_eq!(kind, "task-assigned");
                    assert_eq!(link.as_deref(), Some("/sprints/1/board"));
                }
                other => panic!("unexpected event {:?}", other),
            },
            _ => panic!("assignee should have been notified"),
        }
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_status_change_tracks_completion(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let response = server
            .patch("/api/tasks/4/status")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"status": "DONE"}))
            .await;
        response.assert_status_ok();
        assert!(response.json::<Value>()["completed_at"].is_string());

        let response = server
            .patch("/api/tasks/4/status")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"status": "REVIEW"}))
            .await;
        response.assert_status_ok();
        assert!(response.json::<Value>()["completed_at"].is_null());

        let filter = TaskQuery {
            sprint_id: Some(1),
            status: Some(TaskStatus::Review),
            assignee_id: None,
        };
        let review = state.task.find_filtered(&filter).await?;
        assert_eq!(review.len(), 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_update_and_delete_task(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .put("/api/tasks/3")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"title": "Kanban view v2", "priority": "HIGH"}))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["title"], "Kanban view v2");
        assert_eq!(body["priority"], "HIGH");
        assert_eq!(body["status"], "IN_PROGRESS");

        server
            .delete("/api/tasks/3")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get("/api/tasks/3")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // Board
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_board_groups_tasks_by_status(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/api/boards/1").add_header(AUTHORIZATION, bob()).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        let columns = body["columns"].as_array().unwrap();
        let statuses: Vec<&str> = columns.iter().map(|c| c["status"].as_str().unwrap()).collect();
        assert_eq!(statuses, vec!["TODO", "IN_PROGRESS", "REVIEW", "DONE"]);
        assert_eq!(columns[3]["tasks"].as_array().unwrap().len(), 2);
        assert_eq!(columns[3]["story_points"], 13);
        assert!(columns[2]["tasks"].as_array().unwrap().is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_board_unknown_sprint(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/api/boards/99").add_header(AUTHORIZATION, bob()).await;

        response.assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // Burndown
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_burndown_of_fixture_sprint(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let response = server
            .get("/api/burndown/sprint/1")
            .add_header(AUTHORIZATION, bob())
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["total_story_points"], 20);

        let ideal = body["ideal_burndown"].as_array().unwrap();
        assert_eq!(ideal.len(), 11);
        assert_eq!(ideal[0]["remaining_points"], 20.0);
        assert_eq!(ideal[5]["remaining_points"], 10.0);
        assert_eq!(ideal[10]["remaining_points"], 0.0);

        // 5 points done on day 1, 8 on day 3
        let actual: Vec<f64> = body["actual_burndown"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["remaining_points"].as_f64().unwrap())
            .collect();
        assert_eq!(&actual[..5], &[20.0, 15.0, 15.0, 7.0, 7.0]);
        assert_eq!(actual[10], 7.0);

        assert!(state.burndown.get(1).is_some(), "chart should be cached");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "sprints")))]
    async fn test_burndown_refresh_after_task(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        // Finishing a task drops the cached chart
        server
            .get("/api/burndown/sprint/1")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_ok();
        server
            .patch("/api/tasks/3/status")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"status": "DONE"}))
            .await
            .assert_status_ok();
        assert!(state.burndown.get(1).is_none());

        let response = server
            .post("/api/burndown/sprint/1/task/3")
            .add_header(AUTHORIZATION, bob())
            .await;
        response.assert_status_ok();
        assert!(state.burndown.get(1).is_some());

        server
            .post("/api/burndown/sprint/1/task/999")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_not_found();
        server
            .get("/api/burndown/sprint/999")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_not_found();
        Ok(())
    }
}
