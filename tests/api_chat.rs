//! Integration tests for the chat endpoints
//!
//! - GET/POST /api/chat/{room_id}/messages
//! - GET /api/chat/{room_id}/search
//! - PUT/DELETE /api/chat/messages/{message_id}
//! - GET /api/chat/{room_id}/active-users

mod common;

#[cfg(test)]
mod chat_tests {
    use super::common::*;
    use axum::http::{StatusCode, header::AUTHORIZATION};
    use scrumboard::dtos::ServerEvent;
    use scrumboard::entities::ChatMessageType;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_post_message_broadcasts_to_room(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let mut rx = state.rooms.join("general", 3);

        let response = server
            .post("/api/chat/general/messages")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"content": "Standup in 5"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["username"], "bob");
        assert_eq!(body["message_type"], "TEXT");

        let outbound = rx.try_recv().expect("room should receive the message");
        match &outbound.event {
            ServerEvent::ChatMessage(dto) => {
                assert_eq!(dto.content, "Standup in 5");
                assert_eq!(dto.room_id, "general");
            }
            other => panic!("unexpected event {:?}", other),
        }
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_post_message_validates_length(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/api/chat/general/messages")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"content": ""}))
            .await
            .assert_status_bad_request();

        server
            .post("/api/chat/general/messages")
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"content": "x".repeat(5001)}))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_message_history_pages_are_chronological(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        for i in 1..=5 {
            state
                .chat
                .create("general", 2, &format!("message {}", i), ChatMessageType::Text)
                .await?;
        }
        state.chat.create("random", 2, "elsewhere", ChatMessageType::Text).await?;

        let response = server
            .get("/api/chat/general/messages")
            .add_query_param("limit", 2)
            .add_header(AUTHORIZATION, bob())
            .await;

        response.assert_status_ok();
        let page = response.json::<Value>();
        assert_eq!(page["total"], 5);
        assert_eq!(page["total_pages"], 3);
        let contents: Vec<&str> = page["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["message 4", "message 5"]);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_search_messages(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        state.chat.create("general", 2, "Deploy is done", ChatMessageType::Text).await?;
        state.chat.create("general", 3, "Lunch?", ChatMessageType::Text).await?;

        let response = server
            .get("/api/chat/general/search")
            .add_query_param("q", "deploy")
            .add_header(AUTHORIZATION, bob())
            .await;

        response.assert_status_ok();
        let found = response.json::<Vec<Value>>();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["content"], "Deploy is done");

        server
            .get("/api/chat/general/search")
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_only_own_text_messages_can_change(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let mine = state.chat.create("general", 2, "typo hree", ChatMessageType::Text).await?;
        let theirs = state.chat.create("general", 3, "hello", ChatMessageType::Text).await?;
        let image = state.chat.create("general", 2, "/img/board.png", ChatMessageType::Image).await?;

        server
            .put(&format!("/api/chat/messages/{}", theirs.message_id))
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"content": "not mine"}))
            .await
            .assert_status_forbidden();

        server
            .put(&format!("/api/chat/messages/{}", image.message_id))
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"content": "/img/other.png"}))
            .await
            .assert_status_forbidden();

        let mut rx = state.rooms.join("general", 3);
        let response = server
            .put(&format!("/api/chat/messages/{}", mine.message_id))
            .add_header(AUTHORIZATION, bob())
            .json(&json!({"content": "typo here"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["content"], "typo here");
        assert!(matches!(
            rx.try_recv().map(|o| o.event.clone()),
            Ok(ServerEvent::MessageUpdated(_))
        ));

        server
            .delete(&format!("/api/chat/messages/{}", mine.message_id))
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        assert!(matches!(
            rx.try_recv().map(|o| o.event.clone()),
            Ok(ServerEvent::MessageDeleted { .. })
        ));

        server
            .delete(&format!("/api/chat/messages/{}", mine.message_id))
            .add_header(AUTHORIZATION, bob())
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_active_users(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let _alice = state.rooms.join("general", 1);
        let _charlie = state.rooms.join("general", 3);
        let _charlie_again = state.rooms.join("general", 3);

        let response = server
            .get("/api/chat/general/active-users")
            .add_header(AUTHORIZATION, bob())
            .await;

        response.assert_status_ok();
        let users = response.json::<Vec<Value>>();
        let names: Vec<&str> = users.iter().map(|u| u["username"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["alice", "charlie"]);

        let response = server
            .get("/api/chat/empty-room/active-users")
            .add_header(AUTHORIZATION, bob())
            .await;
        assert!(response.json::<Vec<Value>>().is_empty());
        Ok(())
    }
}
