//! End-to-end tests against a real server.
//!
//! Each test spawns an in-process axum server on 127.0.0.1:0 with
//! in-memory SQLite and a temp-dir object store, then drives the HTTP
//! API the way the frontend does.

use reqwest::StatusCode;
use serde_json::{json, Value};

use taskdeck_server::test_helpers::spawn_test_server;

struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    async fn spawn() -> Self {
        let server = spawn_test_server().await;
        Self {
            http: reqwest::Client::new(),
            base_url: server.base_url,
        }
    }

    async fn register(&self, email: &str, password: &str, role: &str) -> reqwest::Response {
        self.http
            .post(format!("{}/api/users/register", self.base_url))
            .json(&json!({ "email": email, "password": password, "role": role }))
            .send()
            .await
            .unwrap()
    }

    /// Register and log in, returning (token, user_id).
    async fn signup(&self, email: &str, password: &str, role: &str) -> (String, String) {
        let resp = self.register(email, password, role).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = resp.json().await.unwrap();
        let user_id = body["user"]["id"].as_str().unwrap().to_string();

        let resp = self
            .http
            .post(format!("{}/api/users/login", self.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        (body["token"].as_str().unwrap().to_string(), user_id)
    }

    async fn create_task(&self, token: &str, payload: Value) -> reqwest::Response {
        self.http
            .post(format!("{}/api/tasks", self.base_url))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .unwrap()
    }

    async fn update_task(&self, token: &str, id: &str, payload: Value) -> reqwest::Response {
        self.http
            .put(format!("{}/api/tasks/{id}", self.base_url))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn upload_pdf(&self, token: &str, task_id: &str, name: &str) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(b"%PDF-1.4 test content".to_vec())
            .file_name(name.to_string())
            .mime_str("application/pdf")
            .unwrap();
        let form = reqwest::multipart::Form::new().part("documents", part);
        self.http
            .post(format!("{}/api/tasks/{task_id}/documents", self.base_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn health_is_public() {
    let client = Client::spawn().await;
    let resp = client
        .http
        .get(format!("{}/api/health", client.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_and_login_flow() {
    let client = Client::spawn().await;

    let resp = client.register("alice@example.com", "hunter2", "USER").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "USER");
    assert!(body["user"].get("password_hash").is_none());

    // Second registration with the same email conflicts.
    let resp = client.register("alice@example.com", "other", "USER").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Wrong password and unknown email answer identically.
    for (email, password) in [
        ("alice@example.com", "wrong-password"),
        ("nobody@example.com", "hunter2"),
    ] {
        let resp = client
            .http
            .post(format!("{}/api/users/login", client.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn invalid_registration_payloads_are_rejected() {
    let client = Client::spawn().await;
    let resp = client.register("not-an-email", "hunter2", "USER").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = client.register("a@example.com", "", "USER").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn task_routes_require_a_token() {
    let client = Client::spawn().await;
    let resp = client
        .http
        .get(format!("{}/api/tasks", client.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client.get("garbage-token", "/api/tasks").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn assignment_override_and_admin_reassignment() {
    let client = Client::spawn().await;
    let (user_token, user_id) = client.signup("u25@example.com", "pw", "USER").await;
    let (other_token, other_id) = client.signup("u99@example.com", "pw", "USER").await;
    let (admin_token, _) = client.signup("root@example.com", "pw", "ADMIN").await;

    // Non-admin create with a foreign assignee: silently overridden.
    let resp = client
        .create_task(
            &user_token,
            json!({ "title": "write report", "assigned_to": other_id }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let task: Value = resp.json().await.unwrap();
    assert_eq!(task["assigned_to"], json!(user_id));
    assert_eq!(task["created_by"], json!(user_id));
    let task_id = task["id"].as_str().unwrap();

    // Admin reassigns to the originally requested user.
    let resp = client
        .update_task(&admin_token, task_id, json!({ "assigned_to": other_id }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let task: Value = resp.json().await.unwrap();
    assert_eq!(task["assigned_to"], json!(other_id));

    // The original creator is now locked out of mutation...
    let resp = client
        .update_task(&user_token, task_id, json!({ "title": "hijack" }))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // ...and the task is hidden from their reads.
    let resp = client.get(&user_token, &format!("/api/tasks/{task_id}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // The new assignee can both read and mutate.
    let resp = client.get(&other_token, &format!("/api/tasks/{task_id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = client
        .update_task(&other_token, task_id, json!({ "status": "completed" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn listing_is_scoped_and_annotated() {
    let client = Client::spawn().await;
    let (alice_token, _) = client.signup("alice@example.com", "pw", "USER").await;
    let (bob_token, _) = client.signup("bob@example.com", "pw", "USER").await;
    let (admin_token, _) = client.signup("root@example.com", "pw", "ADMIN").await;

    for title in ["a", "b"] {
        let resp = client.create_task(&alice_token, json!({ "title": title })).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
    let resp = client.create_task(&bob_token, json!({ "title": "c" })).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let mine: Value = client.get(&alice_token, "/api/tasks").await.json().await.unwrap();
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|t| t["is_assigned"] == json!(true)));

    let all: Value = client.get(&admin_token, "/api/tasks").await.json().await.unwrap();
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|t| t.get("is_assigned").is_none()));
}

#[tokio::test]
async fn missing_task_beats_permission_denial() {
    let client = Client::spawn().await;
    let (token, _) = client.signup("alice@example.com", "pw", "USER").await;

    let resp = client
        .update_task(&token, "no-such-task", json!({ "title": "x" }))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .http
        .delete(format!("{}/api/tasks/no-such-task", client.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_returns_the_removed_task() {
    let client = Client::spawn().await;
    let (token, _) = client.signup("alice@example.com", "pw", "USER").await;
    let resp = client.create_task(&token, json!({ "title": "temp" })).await;
    let task: Value = resp.json().await.unwrap();
    let task_id = task["id"].as_str().unwrap();

    let resp = client
        .http
        .delete(format!("{}/api/tasks/{task_id}", client.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Value = resp.json().await.unwrap();
    assert_eq!(deleted["id"], json!(task_id));

    let resp = client.get(&token, &format!("/api/tasks/{task_id}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_records_are_admin_or_self() {
    let client = Client::spawn().await;
    let (alice_token, alice_id) = client.signup("alice@example.com", "pw", "USER").await;
    let (_bob_token, bob_id) = client.signup("bob@example.com", "pw", "USER").await;
    let (admin_token, _) = client.signup("root@example.com", "pw", "ADMIN").await;

    let resp = client.get(&alice_token, &format!("/api/users/{alice_id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = client.get(&alice_token, &format!("/api/users/{bob_id}")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = client.get(&admin_token, &format!("/api/users/{bob_id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Listing is admin-only.
    let resp = client.get(&alice_token, "/api/users").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let all: Value = client.get(&admin_token, "/api/users").await.json().await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn non_admin_role_escalation_is_dropped() {
    let client = Client::spawn().await;
    let (alice_token, alice_id) = client.signup("alice@example.com", "pw", "USER").await;

    let resp = client
        .http
        .put(format!("{}/api/users/{alice_id}", client.base_url))
        .bearer_auth(&alice_token)
        .json(&json!({ "email": "alice2@example.com", "role": "ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["email"], "alice2@example.com");
    assert_eq!(user["role"], "USER");

    // They still cannot list users.
    let resp = client.get(&alice_token, "/api/users").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_promotes_a_user() {
    let client = Client::spawn().await;
    let (_alice_token, alice_id) = client.signup("alice@example.com", "pw", "USER").await;
    let (admin_token, _) = client.signup("root@example.com", "pw", "ADMIN").await;

    let resp = client
        .http
        .put(format!("{}/api/users/{alice_id}", client.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({ "role": "ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["role"], "ADMIN");
}

#[tokio::test]
async fn document_upload_view_download() {
    let client = Client::spawn().await;
    let (token, _) = client.signup("alice@example.com", "pw", "USER").await;
    let resp = client.create_task(&token, json!({ "title": "with docs" })).await;
    let task: Value = resp.json().await.unwrap();
    let task_id = task["id"].as_str().unwrap();

    let resp = client.upload_pdf(&token, task_id, "report.pdf").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let docs: Value = resp.json().await.unwrap();
    let doc_id = docs[0]["id"].as_str().unwrap();
    assert_eq!(docs[0]["file_name"], "report.pdf");

    let listed: Value = client
        .get(&token, &format!("/api/tasks/{task_id}/documents"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let resp = client
        .get(&token, &format!("/api/tasks/documents/{doc_id}/view"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "application/pdf"
    );
    assert!(resp.bytes().await.unwrap().starts_with(b"%PDF-"));

    let resp = client
        .get(&token, &format!("/api/tasks/documents/{doc_id}/download"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("report.pdf"));
}

#[tokio::test]
async fn document_view_accepts_query_token() {
    let client = Client::spawn().await;
    let (token, _) = client.signup("alice@example.com", "pw", "USER").await;
    let resp = client.create_task(&token, json!({ "title": "t" })).await;
    let task: Value = resp.json().await.unwrap();
    let task_id = task["id"].as_str().unwrap();
    let resp = client.upload_pdf(&token, task_id, "a.pdf").await;
    let docs: Value = resp.json().await.unwrap();
    let doc_id = docs[0]["id"].as_str().unwrap();

    // The browser opens view links without headers; the token rides in
    // the query string.
    let resp = client
        .http
        .get(format!(
            "{}/api/tasks/documents/{doc_id}/view?token={token}",
            client.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn document_limits_are_enforced() {
    let client = Client::spawn().await;
    let (token, _) = client.signup("alice@example.com", "pw", "USER").await;
    let resp = client.create_task(&token, json!({ "title": "t" })).await;
    let task: Value = resp.json().await.unwrap();
    let task_id = task["id"].as_str().unwrap();

    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        let resp = client.upload_pdf(&token, task_id, name).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
    // Fourth document is rejected.
    let resp = client.upload_pdf(&token, task_id, "d.pdf").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Non-PDF uploads are rejected outright.
    let resp = client.upload_pdf(&token, task_id, "notes.txt").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn documents_are_hidden_with_their_parent_task() {
    let client = Client::spawn().await;
    let (alice_token, _) = client.signup("alice@example.com", "pw", "USER").await;
    let (bob_token, _) = client.signup("bob@example.com", "pw", "USER").await;

    let resp = client.create_task(&alice_token, json!({ "title": "t" })).await;
    let task: Value = resp.json().await.unwrap();
    let task_id = task["id"].as_str().unwrap();
    let resp = client.upload_pdf(&alice_token, task_id, "a.pdf").await;
    let docs: Value = resp.json().await.unwrap();
    let doc_id = docs[0]["id"].as_str().unwrap();

    // A non-assignee cannot tell the document exists.
    let resp = client
        .get(&bob_token, &format!("/api/tasks/documents/{doc_id}/view"))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = client
        .get(&bob_token, &format!("/api/tasks/{task_id}/documents"))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    // And cannot attach to the foreign task either.
    let resp = client.upload_pdf(&bob_token, task_id, "b.pdf").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
