//! Conversation history integration tests

use alloychat_conversations::{ConversationStore, MessageRole};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{authed_request, create_test_jwt, parse_body, TestApp};

/// Seed a conversation with one user/assistant pair
async fn seed(app: &TestApp, owner: Uuid, title: &str) -> Uuid {
    let conv = app
        .store
        .create_conversation(owner, title.to_string())
        .await
        .unwrap();
    app.store
        .append_message(conv.id, MessageRole::User, "is 316L weldable?")
        .await
        .unwrap();
    app.store
        .append_message(conv.id, MessageRole::Assistant, "Yes, readily.")
        .await
        .unwrap();
    conv.id
}

mod test_list_conversations {
    use super::*;

    #[tokio::test]
    async fn test_list_returns_only_own_conversations_newest_first() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let older = seed(&app, user, "Older").await;
        let newer = seed(&app, user, "Newer").await;
        seed(&app, Uuid::new_v4(), "Someone else's").await;

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::GET,
                "/v1/conversations",
                &app.jwt_for(user),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = parse_body(resp).await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["id"], newer.to_string());
        assert_eq!(list[1]["id"], older.to_string());
        assert_eq!(list[0]["title"], "Newer");
        assert!(list[0].get("createdAt").is_some());
        assert!(list[0].get("updatedAt").is_some());
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        for i in 0..5 {
            seed(&app, user, &format!("Thread {}", i)).await;
        }

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::GET,
                "/v1/conversations?offset=1&limit=2",
                &app.jwt_for(user),
                None,
            ))
            .await
            .unwrap();

        let body = parse_body(resp).await;
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Thread 3", "Thread 2"]);
    }

    #[tokio::test]
    async fn test_list_rejects_invalid_token() {
        let app = TestApp::new();
        let jwt = create_test_jwt(Uuid::new_v4(), "some-other-secret");

        let resp = app
            .router()
            .oneshot(authed_request(Method::GET, "/v1/conversations", &jwt, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

mod test_get_conversation {
    use super::*;

    #[tokio::test]
    async fn test_get_own_conversation() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let id = seed(&app, user, "Welding").await;

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}", id),
                &app.jwt_for(user),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = parse_body(resp).await;
        assert_eq!(body["id"], id.to_string());
        assert_eq!(body["title"], "Welding");
    }

    #[tokio::test]
    async fn test_get_other_users_conversation_is_403() {
        let app = TestApp::new();
        let id = seed(&app, Uuid::new_v4(), "Private").await;

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}", id),
                &app.jwt_for(Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_get_unknown_conversation_is_404() {
        let app = TestApp::new();

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}", Uuid::new_v4()),
                &app.jwt_for(Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_with_malformed_id_is_400() {
        let app = TestApp::new();
        let req = authed_request(
            Method::GET,
            "/v1/conversations/not-a-uuid",
            &app.jwt_for(Uuid::new_v4()),
            None,
        );

        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

mod test_list_messages {
    use super::*;

    #[tokio::test]
    async fn test_messages_in_creation_order() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let id = seed(&app, user, "316L").await;

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}/messages", id),
                &app.jwt_for(user),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = parse_body(resp).await;
        let messages = body.as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["conversationId"], id.to_string());
        assert_eq!(messages[1]["role"], "assistant");
        assert!(messages[0]["id"].as_i64().unwrap() < messages[1]["id"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn test_messages_of_other_user_is_403() {
        let app = TestApp::new();
        let id = seed(&app, Uuid::new_v4(), "Private").await;

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}/messages", id),
                &app.jwt_for(Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}

mod test_delete_conversation {
    use super::*;

    #[tokio::test]
    async fn test_delete_removes_conversation_and_messages() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let id = seed(&app, user, "Disposable").await;
        let kept = seed(&app, user, "Kept").await;
        let jwt = app.jwt_for(user);

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::DELETE,
                &format!("/v1/conversations/{}", id),
                &jwt,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}", id),
                &jwt,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        assert!(app.store.recent_messages(id, 0).await.unwrap().is_empty());
        assert_eq!(app.store.recent_messages(kept, 0).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_other_users_conversation_is_403() {
        let app = TestApp::new();
        let owner = Uuid::new_v4();
        let id = seed(&app, owner, "Not yours").await;

        let resp = app
            .router()
            .oneshot(authed_request(
                Method::DELETE,
                &format!("/v1/conversations/{}", id),
                &app.jwt_for(Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.store.conversation_owner(id).await.unwrap(), Some(owner));
        assert_eq!(app.store.all_messages().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_404() {
        let app = TestApp::new();
        let req = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/v1/conversations/{}", Uuid::new_v4()))
            .header(
                "authorization",
                format!("Bearer {}", app.jwt_for(Uuid::new_v4())),
            )
            .body(Body::empty())
            .unwrap();

        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
