//! End-to-end tests driving the full router over in-memory stores.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use essay_circle_backend::{create_app, state::AppState, store::MessageStore};

struct TestApp {
    router: Router,
    state: AppState,
}

struct Reply {
    status: StatusCode,
    body: Value,
    cookie: Option<String>,
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::in_memory();
        Self {
            router: create_app(state.clone()),
            state,
        }
    }

    async fn call(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply { status, body, cookie }
    }

    /// Registers a user; returns (user id, session cookie).
    async fn signup(&self, username: &str) -> (String, String) {
        let reply = self
            .call(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({
                    "username": username,
                    "password": "correct horse",
                    "displayName": format!("{username} display"),
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        let id = reply.body["id"].as_str().unwrap().to_string();
        (id, reply.cookie.expect("signup sets a session cookie"))
    }

    async fn essay(&self, cookie: &str, content: &str, public: bool) -> Value {
        let reply = self
            .call(
                Method::POST,
                "/api/essays",
                Some(cookie),
                Some(json!({ "title": "On Gardens", "content": content, "isPublic": public })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body
    }
}

#[tokio::test]
async fn test_duplicate_signup_is_a_conflict() {
    let app = TestApp::new();
    app.signup("alice").await;

    let reply = app
        .call(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "username": "alice", "password": "x", "displayName": "Other" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["code"], "CONFLICT");
    assert!(reply.body["message"].is_string());
    assert!(reply.body.get("errors").is_none());
}

#[tokio::test]
async fn test_validation_errors_list_fields() {
    let app = TestApp::new();
    let reply = app
        .call(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "username": "", "password": "", "displayName": "" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = reply.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"displayName"));
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = TestApp::new();
    app.signup("bob").await;

    let login = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "bob", "password": "correct horse" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let cookie = login.cookie.unwrap();

    let me = app.call(Method::GET, "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "bob");

    let logout = app.call(Method::POST, "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["message"], "Logged out successfully");

    let me = app.call(Method::GET, "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_wrong_password_is_unauthenticated() {
    let app = TestApp::new();
    app.signup("carol").await;
    let reply = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "carol", "password": "nope" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_essay_crud_and_ownership() {
    let app = TestApp::new();
    let (author_id, author) = app.signup("dana").await;
    let (_, stranger) = app.signup("eve").await;

    let essay = app.essay(&author, "one two  three\nfour", false).await;
    assert_eq!(essay["wordCount"], 4);
    assert_eq!(essay["authorId"], author_id.as_str());
    assert_eq!(essay["authorName"], "dana display");
    let id = essay["id"].as_str().unwrap();

    let forbidden = app
        .call(
            Method::PUT,
            &format!("/api/essays/{id}"),
            Some(&stranger),
            Some(json!({ "title": "Mine now" })),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let updated = app
        .call(
            Method::PUT,
            &format!("/api/essays/{id}"),
            Some(&author),
            Some(json!({ "content": "just two" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["wordCount"], 2);

    let private_list = app.call(Method::GET, "/api/essays?isPublic=true", None, None).await;
    assert_eq!(private_list.body.as_array().unwrap().len(), 0);

    let deleted = app
        .call(Method::DELETE, &format!("/api/essays/{id}"), Some(&author), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = app.call(Method::GET, &format!("/api/essays/{id}"), None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_analysis_is_idempotent_and_updates_profile() {
    let app = TestApp::new();
    let (user_id, cookie) = app.signup("frank").await;
    let essay = app
        .essay(&cookie, "I think this is very good. In conclusion, gardens matter.", false)
        .await;
    let id = essay["id"].as_str().unwrap();

    let first = app
        .call(Method::POST, &format!("/api/essays/{id}/analyze"), None, None)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let second = app
        .call(Method::POST, &format!("/api/essays/{id}/analyze"), None, None)
        .await;
    assert_eq!(first.body["id"], second.body["id"]);
    assert!(first.body["corrections"].as_array().unwrap().len() >= 2);

    let essay = app.call(Method::GET, &format!("/api/essays/{id}"), None, None).await;
    assert_eq!(essay.body["isAnalyzed"], true);

    let profile = app
        .call(Method::GET, &format!("/api/profile/{user_id}"), None, None)
        .await;
    assert_eq!(profile.body["totalEssays"], 1);
    assert_eq!(profile.body["averageScore"], first.body["overallScore"]);

    let missing = app
        .call(Method::POST, "/api/essays/nope/analyze", None, None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_essays_are_analyzed_in_background() {
    let app = TestApp::new();
    let mut outcomes = app.state.analysis.subscribe();
    let (_, cookie) = app.signup("gina").await;

    let essay = app.essay(&cookie, "Plain words for the queue.", true).await;
    let outcome = outcomes.recv().await.unwrap();
    assert_eq!(outcome.essay_id(), essay["id"].as_str().unwrap());

    let id = essay["id"].as_str().unwrap();
    let reviews = app
        .call(Method::GET, &format!("/api/essays/{id}/peer-reviews"), None, None)
        .await;
    assert_eq!(reviews.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_likes_toggle() {
    let app = TestApp::new();
    let (_, cookie) = app.signup("hank").await;
    let essay = app.essay(&cookie, "Likeable text", false).await;
    let id = essay["id"].as_str().unwrap();
    let like = format!("/api/essays/{id}/like");
    let count = format!("/api/essays/{id}/likes");

    let on = app.call(Method::POST, &like, Some(&cookie), None).await;
    assert_eq!(on.body["liked"], true);
    assert_eq!(app.call(Method::GET, &count, None, None).await.body["count"], 1);

    let off = app.call(Method::POST, &like, Some(&cookie), None).await;
    assert_eq!(off.body["liked"], false);
    assert_eq!(app.call(Method::GET, &count, None, None).await.body["count"], 0);
}

#[tokio::test]
async fn test_reader_corrections_validate_spans_and_collect_likes() {
    let app = TestApp::new();
    let (_, author) = app.signup("ivy").await;
    let (_, reader) = app.signup("jack").await;
    let essay = app.essay(&author, "Teh garden grows.", false).await;
    let id = essay["id"].as_str().unwrap();
    let uri = format!("/api/essays/{id}/user-corrections");

    let bad = app
        .call(
            Method::POST,
            &uri,
            Some(&reader),
            Some(json!({
                "originalText": "Teh",
                "suggestedText": "The",
                "explanation": "typo",
                "startIndex": 5,
                "endIndex": 2,
            })),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let created = app
        .call(
            Method::POST,
            &uri,
            Some(&reader),
            Some(json!({
                "originalText": "Teh",
                "suggestedText": "The",
                "explanation": "typo",
                "startIndex": 0,
                "endIndex": 3,
            })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["userName"], "jack display");
    let correction_id = created.body["id"].as_str().unwrap();

    let liked = app
        .call(
            Method::POST,
            &format!("/api/user-corrections/{correction_id}/like"),
            Some(&author),
            None,
        )
        .await;
    assert_eq!(liked.body["likes"], 1);

    let listed = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_peer_review_workflow() {
    let app = TestApp::new();
    let (_, author) = app.signup("kate").await;
    let (_, reviewer) = app.signup("liam").await;
    let essay = app.essay(&author, "A modest essay about rivers.", false).await;
    let id = essay["id"].as_str().unwrap();
    let uri = format!("/api/essays/{id}/peer-reviews");

    let own = app.call(Method::POST, &uri, Some(&author), Some(json!({}))).await;
    assert_eq!(own.status, StatusCode::FORBIDDEN);

    let created = app
        .call(Method::POST, &uri, Some(&reviewer), Some(json!({ "grammarScore": 80 })))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["overallScore"], 580);
    let review_id = created.body["id"].as_str().unwrap().to_string();

    let again = app.call(Method::POST, &uri, Some(&reviewer), Some(json!({}))).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["id"], review_id.as_str());

    let correction = json!({
        "category": "style",
        "selectedText": "modest",
        "textStartIndex": 2,
        "textEndIndex": 8,
        "comment": "Try a stronger word",
    });
    let corrections_uri = format!("/api/peer-reviews/{review_id}/corrections");
    let added = app
        .call(Method::POST, &corrections_uri, Some(&reviewer), Some(correction.clone()))
        .await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.body["corrections"].as_array().unwrap().len(), 1);

    let submitted = app
        .call(
            Method::PATCH,
            &format!("/api/peer-reviews/{review_id}"),
            Some(&reviewer),
            Some(json!({ "isSubmitted": true })),
        )
        .await;
    assert_eq!(submitted.status, StatusCode::OK);
    assert_eq!(submitted.body["isSubmitted"], true);

    let frozen = app
        .call(Method::POST, &corrections_uri, Some(&reviewer), Some(correction))
        .await;
    assert_eq!(frozen.status, StatusCode::CONFLICT);

    let reopened = app
        .call(
            Method::PATCH,
            &format!("/api/peer-reviews/{review_id}"),
            Some(&reviewer),
            Some(json!({ "isSubmitted": false })),
        )
        .await;
    assert_eq!(reopened.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_friendship_requests() {
    let app = TestApp::new();
    let (alice_id, alice) = app.signup("alice").await;
    let (bob_id, bob) = app.signup("bob").await;

    let request = app
        .call(
            Method::POST,
            "/api/friendships",
            Some(&alice),
            Some(json!({ "addresseeId": bob_id })),
        )
        .await;
    assert_eq!(request.status, StatusCode::CREATED);
    assert_eq!(request.body["status"], "pending");
    let friendship_id = request.body["id"].as_str().unwrap().to_string();

    let reverse = app
        .call(
            Method::POST,
            "/api/friendships",
            Some(&bob),
            Some(json!({ "addresseeId": alice_id })),
        )
        .await;
    assert_eq!(reverse.status, StatusCode::CONFLICT);

    let by_requester = app
        .call(
            Method::PUT,
            &format!("/api/friendships/{friendship_id}"),
            Some(&alice),
            Some(json!({ "status": "accepted" })),
        )
        .await;
    assert_eq!(by_requester.status, StatusCode::FORBIDDEN);

    let accepted = app
        .call(
            Method::PUT,
            &format!("/api/friendships/{friendship_id}"),
            Some(&bob),
            Some(json!({ "status": "accepted" })),
        )
        .await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["status"], "accepted");

    let listed = app
        .call(
            Method::GET,
            &format!("/api/friendships/{alice_id}?status=accepted"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let snooping = app
        .call(Method::GET, &format!("/api/friendships/{alice_id}"), Some(&bob), None)
        .await;
    assert_eq!(snooping.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_messages_are_private_and_stored_encrypted() {
    let app = TestApp::new();
    let (alice_id, alice) = app.signup("alice").await;
    let (bob_id, bob) = app.signup("bob").await;
    let (_, mallory) = app.signup("mallory").await;

    let sent = app
        .call(
            Method::POST,
            "/api/messages",
            Some(&alice),
            Some(json!({ "toUserId": bob_id, "content": "meet at noon" })),
        )
        .await;
    assert_eq!(sent.status, StatusCode::CREATED);
    assert_eq!(sent.body["content"], "meet at noon");
    assert_eq!(sent.body["type"], "text");
    let message_id = sent.body["id"].as_str().unwrap().to_string();

    let stored = app
        .state
        .stores
        .messages
        .list_messages(&bob_id, false)
        .await
        .unwrap();
    assert_ne!(stored[0].content, "meet at noon");

    let inbox = app
        .call(Method::GET, &format!("/api/messages/{bob_id}?unreadOnly=true"), Some(&bob), None)
        .await;
    assert_eq!(inbox.body.as_array().unwrap().len(), 1);
    assert_eq!(inbox.body[0]["content"], "meet at noon");

    let peek = app
        .call(Method::GET, &format!("/api/messages/{bob_id}"), Some(&mallory), None)
        .await;
    assert_eq!(peek.status, StatusCode::FORBIDDEN);

    let sender_read = app
        .call(Method::PATCH, &format!("/api/messages/{message_id}/read"), Some(&alice), None)
        .await;
    assert_eq!(sender_read.status, StatusCode::FORBIDDEN);

    let read = app
        .call(Method::PATCH, &format!("/api/messages/{message_id}/read"), Some(&bob), None)
        .await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["isRead"], true);

    let to_self = app
        .call(
            Method::POST,
            "/api/messages",
            Some(&alice),
            Some(json!({ "toUserId": alice_id, "content": "hi me" })),
        )
        .await;
    assert_eq!(to_self.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_profiles_and_user_directory() {
    let app = TestApp::new();
    let (user_id, cookie) = app.signup("nora").await;
    let (_, other) = app.signup("omar").await;

    let duplicate = app
        .call(Method::POST, "/api/profile", Some(&cookie), Some(json!({ "displayName": "N" })))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let updated = app
        .call(
            Method::PUT,
            &format!("/api/profile/{user_id}"),
            Some(&cookie),
            Some(json!({ "bio": "<script>x</script>Writer" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["bio"], "Writer");

    let hijack = app
        .call(
            Method::PUT,
            &format!("/api/profile/{user_id}"),
            Some(&other),
            Some(json!({ "displayName": "Owned" })),
        )
        .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let users = app.call(Method::GET, "/api/users", None, None).await;
    assert_eq!(users.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_inspirations_are_seeded_and_filtered() {
    let app = TestApp::new();
    app.state.inspirations.seed_if_empty().await.unwrap();

    let all = app.call(Method::GET, "/api/inspirations", None, None).await;
    assert_eq!(all.status, StatusCode::OK);
    let items = all.body.as_array().unwrap();
    assert_eq!(items.len(), 6);

    let literature = app
        .call(Method::GET, "/api/inspirations?category=literature", None, None)
        .await;
    assert_eq!(literature.body.as_array().unwrap().len(), 2);

    let id = items[0]["id"].as_str().unwrap();
    let one = app
        .call(Method::GET, &format!("/api/inspirations/{id}"), None, None)
        .await;
    assert_eq!(one.body["id"], id);

    let missing = app.call(Method::GET, "/api/inspirations/nope", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
