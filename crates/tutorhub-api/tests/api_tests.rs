use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;
use tutorhub_api::{AppState, create_router};
use tutorhub_auth::{TokenCodec, hash_password};
use tutorhub_db::{Database, NewAccount, Role};

const SECRET: &str = "integration-test-secret";

struct TestApp {
    router: Router,
    db: Database,
    codec: Arc<TokenCodec>,
}

async fn spawn_app() -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let codec = Arc::new(TokenCodec::new(SECRET, Duration::hours(1)).unwrap());

    for (username, password, role) in [
        ("alice", "correct", Role::User),
        ("root", "root-password", Role::Admin),
    ] {
        db.insert_account(NewAccount {
            username: username.to_string(),
            password_hash: hash_password(password).unwrap(),
            role,
            full_name: None,
            email: None,
            phone: None,
        })
        .await
        .unwrap();
    }

    let state = AppState::new(db.clone(), codec.clone()).unwrap();
    TestApp {
        router: create_router(state, None),
        db,
        codec,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn login(&self, path: &str, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            path,
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    async fn token(&self, username: &str, password: &str) -> String {
        let (status, body) = self.login("/v1/auth/login", username, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_root_welcome() {
    let app = spawn_app().await;
    let (status, body) = app.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_string());
}

#[tokio::test]
async fn test_every_group_is_routed() {
    let app = spawn_app().await;
    for group in [
        "subject",
        "class",
        "category",
        "post",
        "salaryinfo",
        "tutor",
        "new_class",
        "trans",
    ] {
        let (status, _) = app
            .send(Method::GET, &format!("/v1/{group}/index"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK, "GET /v1/{group}/index");
    }
}

#[tokio::test]
async fn test_unsupported_method_is_not_gated() {
    let app = spawn_app().await;

    // Public GET and admin POST share the path; PUT is served by neither
    let (status, _) = app
        .send(Method::PUT, "/v1/subject/index", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = app
        .send(Method::DELETE, "/v1/trans/statistical", None, None)
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = app
        .send(Method::POST, "/v1/subject/index", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_issues_user_token() {
    let app = spawn_app().await;

    let (status, body) = app.login("/v1/auth/login", "alice", "correct").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    assert_eq!(body["expires_in"], 3600);

    let claims = app.codec.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.role, Role::User);
}

#[tokio::test]
async fn test_login_rejections_are_indistinguishable() {
    let app = spawn_app().await;

    let (wrong_status, wrong_body) = app.login("/v1/auth/login", "alice", "incorrect").await;
    let (unknown_status, unknown_body) = app.login("/v1/auth/login", "mallory", "correct").await;
    let (role_status, role_body) = app.login("/v1/auth/login-admin", "alice", "correct").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, json!({ "error": "invalid credentials" }));
    assert_eq!((unknown_status, &unknown_body), (wrong_status, &wrong_body));
    assert_eq!((role_status, &role_body), (wrong_status, &wrong_body));
}

#[tokio::test]
async fn test_admin_login() {
    let app = spawn_app().await;
    let (status, body) = app.login("/v1/auth/login-admin", "root", "root-password").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_me_returns_admitted_identity() {
    let app = spawn_app().await;
    let token = app.token("alice", "correct").await;

    let (status, body) = app.send(Method::GET, "/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_gate_rejections() {
    let app = spawn_app().await;
    let user = app.token("alice", "correct").await;

    // No token on an authenticated route
    let (status, body) = app.send(Method::GET, "/v1/class/id?id=1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "unauthorized" }));

    // User token on an admin route
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/subject/index",
            Some(&user),
            Some(json!({ "name": "Math" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "forbidden" }));

    // Expired token
    let stale = app
        .codec
        .issue_at(1, "alice", Role::User, Utc::now() - Duration::hours(2))
        .unwrap();
    let (status, body) = app
        .send(Method::GET, "/v1/class/id?id=1", Some(&stale.token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_expired");

    // Admin token signed with another key
    let other = TokenCodec::new("some-other-secret", Duration::hours(1)).unwrap();
    let forged = other.issue(2, "root", Role::Admin).unwrap();
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/subject/remove",
            Some(&forged.token),
            Some(json!({ "id": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "unauthorized" }));

    // Nothing was touched by the rejected mutations
    assert!(app.db.list_resources(tutorhub_db::ResourceKind::Subject).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_public_routes_need_no_token() {
    let app = spawn_app().await;

    let (status, body) = app.send(Method::GET, "/v1/tutor/index", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = app.send(Method::GET, "/v1/account/index", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_subject_lifecycle() {
    let app = spawn_app().await;
    let admin = app.token("root", "root-password").await;

    let (status, created) = app
        .send(
            Method::POST,
            "/v1/subject/index",
            Some(&admin),
            Some(json!({ "name": "Math", "hours": 30 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["kind"], "subject");
    let id = created["id"].as_i64().unwrap();

    // Subject lookup by id is public
    let (status, found) = app
        .send(Method::GET, &format!("/v1/subject/id?id={id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["data"]["name"], "Math");

    let (status, updated) = app
        .send(
            Method::POST,
            "/v1/subject/edit",
            Some(&admin),
            Some(json!({ "id": id, "data": { "name": "Algebra", "hours": 40 } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["name"], "Algebra");

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/subject/remove",
            Some(&admin),
            Some(json!({ "id": id })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send(Method::GET, &format!("/v1/subject/id?id={id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_find_by_id_requires_token_on_class() {
    let app = spawn_app().await;
    let admin = app.token("root", "root-password").await;
    let user = app.token("alice", "correct").await;

    let (_, created) = app
        .send(
            Method::POST,
            "/v1/class/index",
            Some(&admin),
            Some(json!({ "name": "10A" })),
        )
        .await;
    let uri = format!("/v1/class/id?id={}", created["id"]);

    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(Method::GET, &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "10A");
}

#[tokio::test]
async fn test_insert_rejects_non_object_body() {
    let app = spawn_app().await;
    let admin = app.token("root", "root-password").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/post/index",
            Some(&admin),
            Some(json!(["not", "an", "object"])),
        )
        .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_category_filter() {
    let app = spawn_app().await;
    let admin = app.token("root", "root-password").await;

    for (name, level) in [("Primary", 1), ("Secondary", 2), ("High school", 2)] {
        let (status, _) = app
            .send(
                Method::POST,
                "/v1/category/index",
                Some(&admin),
                Some(json!({ "name": name, "level": level })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .send(Method::GET, "/v1/category/filter?level=2", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app
        .send(
            Method::GET,
            "/v1/category/filter?level=2&name=Secondary",
            None,
            None,
        )
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Class has no filter route
    let (status, _) = app
        .send(Method::GET, "/v1/class/filter?level=2", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_new_class_status() {
    let app = spawn_app().await;
    let admin = app.token("root", "root-password").await;
    let user = app.token("alice", "correct").await;

    let (_, created) = app
        .send(
            Method::POST,
            "/v1/new_class/index",
            Some(&admin),
            Some(json!({ "subject": "Physics", "status": "pending" })),
        )
        .await;
    let id = created["id"].as_i64().unwrap();

    let request = json!({ "id": id, "status": "approved" });
    let (status, _) = app
        .send(
            Method::POST,
            "/v1/new_class/status",
            Some(&user),
            Some(request.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, "/v1/new_class/status", Some(&admin), Some(request))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["subject"], "Physics");
}

#[tokio::test]
async fn test_transactions() {
    let app = spawn_app().await;
    let admin = app.token("root", "root-password").await;

    for (account_id, amount) in [(1, json!(150.5)), (1, json!("49.5")), (2, json!(100))] {
        let (status, _) = app
            .send(
                Method::POST,
                "/v1/trans/index",
                Some(&admin),
                Some(json!({ "account_id": account_id, "amount": amount })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/trans/id",
            Some(&admin),
            Some(json!({ "account_id": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = app
        .send(Method::GET, "/v1/trans/statistical", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["total_amount"], 300.0);

    let (status, _) = app.send(Method::GET, "/v1/trans/statistical", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::GET, "/v1/trans/filter?account_id=2", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register() {
    let app = spawn_app().await;

    let request = json!({
        "username": "bob",
        "password": "bob-password",
        "email": "bob@example.com"
    });
    let (status, body) = app
        .send(Method::POST, "/v1/auth/register", None, Some(request.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "bob");
    assert_eq!(body["role"], "user");
    assert!(body.get("password_hash").is_none());

    let (status, _) = app
        .send(Method::POST, "/v1/auth/register", None, Some(request))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "username": "carol", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let token = app.token("bob", "bob-password").await;
    assert_eq!(app.codec.verify(&token).unwrap().role, Role::User);
}

#[tokio::test]
async fn test_account_management() {
    let app = spawn_app().await;
    let admin = app.token("root", "root-password").await;
    let alice = app.db.get_account_by_username("alice").await.unwrap().unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/account/edit",
            Some(&admin),
            Some(json!({ "id": alice.id, "full_name": "Alice Liddell" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Alice Liddell");
    assert_eq!(body["role"], "user");

    let (status, body) = app
        .send(Method::GET, "/v1/account/filter?role=admin", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let admins = body.as_array().unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0]["username"], "root");

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/account/password",
            Some(&admin),
            Some(json!({ "id": alice.id, "password": "a-new-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.login("/v1/auth/login", "alice", "correct").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let user = app.token("alice", "a-new-password").await;

    let uri = format!("/v1/account/id?id={}", alice.id);
    let (status, body) = app.send(Method::GET, &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/account/remove",
            Some(&user),
            Some(json!({ "id": alice.id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/account/remove",
            Some(&admin),
            Some(json!({ "id": alice.id })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.db.get_account_by_id(alice.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_edit_rejects_unknown_role() {
    let app = spawn_app().await;
    let admin = app.token("root", "root-password").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/account/edit",
            Some(&admin),
            Some(json!({ "id": 1, "role": "superuser" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
