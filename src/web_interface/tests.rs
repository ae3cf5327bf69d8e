use serde_json::{json, Value};
use warp::http::StatusCode;

use super::MockServer;
use crate::configuration::types::ServerConfig;

// Helper to build a server over the demo accounts
fn server() -> MockServer {
    MockServer::new(&ServerConfig::default())
}

fn body(response: &warp::http::Response<impl AsRef<[u8]>>) -> Value {
    serde_json::from_slice(response.body().as_ref()).unwrap()
}

async fn login(server: &MockServer, username: &str, role: &str) -> Value {
    let response = warp::test::request()
        .method("POST")
        .path("/api/login")
        .json(&json!({"username": username, "password": "pw", "role": role}))
        .reply(&server.routes())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body(&response)
}

#[tokio::test]
async fn list_users_returns_paged_envelope() {
    let server = server();
    let response = warp::test::request()
        .path("/api/users?page=1&size=2&search=yunmeng")
        .reply(&server.routes())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let envelope = body(&response);
    assert_eq!(envelope["code"], 200);
    assert!(envelope["timestamp"].is_string());
    assert_eq!(envelope["data"]["total"], 3);
    assert_eq!(envelope["data"]["size"], 2);
    assert_eq!(envelope["data"]["pages"], 2);
    assert_eq!(envelope["data"]["list"].as_array().unwrap().len(), 2);
    assert_eq!(envelope["data"]["list"][0]["realName"], "系统管理员");
}

#[tokio::test]
async fn list_users_filters_by_role_and_status() {
    let server = server();
    let response = warp::test::request()
        .path("/api/users?role=teacher&status=active")
        .reply(&server.routes())
        .await;
    let envelope = body(&response);
    assert_eq!(envelope["data"]["total"], 1);
    assert_eq!(envelope["data"]["size"], 20);
    assert_eq!(envelope["data"]["list"][0]["username"], "teacher001");
}

#[tokio::test]
async fn get_user_and_missing_user() {
    let server = server();
    let response = warp::test::request()
        .path("/api/users/3")
        .reply(&server.routes())
        .await;
    assert_eq!(body(&response)["data"]["studentId"], "2021001");

    let response = warp::test::request()
        .path("/api/users/99")
        .reply(&server.routes())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(&response)["code"], 404);
    assert!(body(&response)["data"].is_null());
}

#[tokio::test]
async fn create_user_validates_and_detects_conflicts() {
    let server = server();
    let routes = server.routes();
    let new_user = json!({
        "username": "student002",
        "realName": "王五",
        "email": "wangwu@yunmeng.edu.cn",
        "password": "secret",
        "role": "student",
        "studentId": "2021002"
    });

    let created = warp::test::request()
        .method("POST")
        .path("/api/users")
        .json(&new_user)
        .reply(&routes)
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(body(&created)["code"], 201);
    assert_eq!(body(&created)["data"]["id"], 4);
    assert_eq!(body(&created)["data"]["status"], "active");

    let duplicate = warp::test::request()
        .method("POST")
        .path("/api/users")
        .json(&new_user)
        .reply(&routes)
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let incomplete = warp::test::request()
        .method("POST")
        .path("/api/users")
        .json(&json!({"username": "x"}))
        .reply(&routes)
        .await;
    assert_eq!(incomplete.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&incomplete)["code"], 400);
}

#[tokio::test]
async fn update_status_reset_and_delete() {
    let server = server();
    let routes = server.routes();

    let updated = warp::test::request()
        .method("PUT")
        .path("/api/users/2")
        .json(&json!({"phone": "13900000000"}))
        .reply(&routes)
        .await;
    assert_eq!(body(&updated)["data"]["phone"], "13900000000");
    assert!(body(&updated)["data"]["updateTime"].is_string());

    let clash = warp::test::request()
        .method("PUT")
        .path("/api/users/2")
        .json(&json!({"email": "admin@yunmeng.edu.cn"}))
        .reply(&routes)
        .await;
    assert_eq!(clash.status(), StatusCode::CONFLICT);

    let status = warp::test::request()
        .method("PATCH")
        .path("/api/users/2/status")
        .json(&json!({"status": "inactive"}))
        .reply(&routes)
        .await;
    assert_eq!(body(&status)["data"]["status"], "inactive");

    let bad_status = warp::test::request()
        .method("PATCH")
        .path("/api/users/2/status")
        .json(&json!({"status": "asleep"}))
        .reply(&routes)
        .await;
    assert_eq!(bad_status.status(), StatusCode::BAD_REQUEST);

    let reset = warp::test::request()
        .method("POST")
        .path("/api/users/2/reset-password")
        .reply(&routes)
        .await;
    assert_eq!(body(&reset)["data"]["id"], 2);
    assert!(body(&reset)["data"]["resetTime"].is_string());

    let deleted = warp::test::request()
        .method("DELETE")
        .path("/api/users/2")
        .reply(&routes)
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(server.directory().len(), 2);
}

#[tokio::test]
async fn batch_delete_and_stats() {
    let server = server();
    let routes = server.routes();

    let bad = warp::test::request()
        .method("POST")
        .path("/api/users/batch-delete")
        .json(&json!({"userIds": 1}))
        .reply(&routes)
        .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let deleted = warp::test::request()
        .method("POST")
        .path("/api/users/batch-delete")
        .json(&json!({"userIds": [2, 3]}))
        .reply(&routes)
        .await;
    assert_eq!(body(&deleted)["data"], json!({"deletedCount": 2, "deletedIds": [2, 3]}));

    let stats = warp::test::request()
        .path("/api/users/stats")
        .reply(&routes)
        .await;
    let data = &body(&stats)["data"];
    assert_eq!(data["totalUsers"], 1);
    assert_eq!(data["roleStats"], json!({"admin": 1, "teacher": 0, "student": 0}));
    assert_eq!(data["departmentStats"], json!({"信息技术部": 1}));
}

#[tokio::test]
async fn login_reports_refusals_in_envelope_code() {
    let server = server();

    let ok = login(&server, "student001", "student").await;
    assert_eq!(ok["code"], 200);
    assert!(ok["token"].as_str().unwrap().split('.').count() == 3);
    assert_eq!(ok["data"]["username"], "student001");

    assert_eq!(login(&server, "nobody", "student").await["code"], 401);
    assert_eq!(login(&server, "student001", "admin").await["code"], 403);

    let missing = warp::test::request()
        .method("POST")
        .path("/api/login")
        .json(&json!({"username": "admin"}))
        .reply(&server.routes())
        .await;
    assert_eq!(missing.status(), StatusCode::OK);
    assert_eq!(body(&missing)["code"], 400);
}

#[tokio::test]
async fn refresh_and_user_info_require_valid_bearer() {
    let server = server();
    let token = login(&server, "teacher001", "teacher").await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let refreshed = warp::test::request()
        .method("POST")
        .path("/api/refresh-token")
        .header("authorization", format!("Bearer {}", token))
        .reply(&server.routes())
        .await;
    assert_eq!(refreshed.status(), StatusCode::OK);
    let renewed = body(&refreshed)["token"].as_str().unwrap().to_string();
    assert_ne!(renewed, token);

    let info = warp::test::request()
        .path("/api/auth/user-info")
        .header("authorization", format!("Bearer {}", renewed))
        .reply(&server.routes())
        .await;
    assert_eq!(body(&info)["data"]["username"], "teacher001");

    let anonymous = warp::test::request()
        .method("POST")
        .path("/api/refresh-token")
        .reply(&server.routes())
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(&anonymous)["code"], 401);

    let garbage = warp::test::request()
        .path("/api/auth/user-info")
        .header("authorization", "Bearer a.b.c")
        .reply(&server.routes())
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_cannot_be_refreshed() {
    let config = ServerConfig {
        token_ttl_secs: 0,
        ..Default::default()
    };
    let server = MockServer::new(&config);
    let token = server
        .issuer()
        .issue(&server.directory().get(1).unwrap());

    let response = warp::test::request()
        .method("POST")
        .path("/api/refresh-token")
        .header("authorization", format!("Bearer {}", token))
        .reply(&server.routes())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_routes_and_bad_bodies_get_envelopes() {
    let server = server();

    let missing = warp::test::request()
        .path("/api/nothing-here")
        .reply(&server.routes())
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(&missing)["code"], 404);

    let malformed = warp::test::request()
        .method("POST")
        .path("/api/users")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&server.routes())
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&malformed)["code"], 400);
}
