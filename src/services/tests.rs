use std::sync::Arc;

use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

use super::*;
use crate::api_client::transport::test_support::{json_response, token_expiring_in, ScriptedTransport};
use crate::api_client::ApiClient;
use crate::configuration::types::ServerConfig;
use crate::error_handling::types::ApiError;
use crate::models::{NewUser, Role, UserQuery, UserStatus};
use crate::session_management::{Session, SessionState};
use crate::token_management::token_guard::REFRESH_PATH;
use crate::web_interface::web_server::test_support::FilterTransport;
use crate::web_interface::MockServer;

// Client talking straight to a fresh mock server
fn mock_client(config: &ServerConfig) -> ApiClient {
    let server = MockServer::new(config);
    ApiClient::new(
        Arc::new(FilterTransport::new(server.routes())),
        SessionState::in_memory(),
    )
}

fn scripted(data: Value) -> (Arc<ScriptedTransport>, ApiClient) {
    let transport = Arc::new(ScriptedTransport::new(move |_| {
        json_response(200, json!({"code": 200, "message": "ok", "data": data}))
    }));
    let session = SessionState::in_memory();
    session
        .begin(&Session::new(
            token_expiring_in(3600, "t"),
            Role::Student,
            json!({"id": 3}),
        ))
        .unwrap();
    (transport.clone(), ApiClient::new(transport, session))
}

#[tokio::test]
async fn login_starts_a_session_against_the_mock() {
    let client = mock_client(&ServerConfig::default());
    let auth = AuthService::new(client.clone());

    let outcome = assert_ok!(auth.login("student001", "pw", Role::Student).await);
    let LoginOutcome::LoggedIn { user, token, .. } = outcome else {
        panic!("expected a successful login, got {:?}", outcome);
    };
    assert_eq!(user["username"], "student001");
    assert_eq!(client.session().token(), Some(token));
    assert_eq!(client.session().role(), Some(Role::Student));

    let status = auth.check_auth();
    assert!(status.has_token && status.has_user_info && status.has_user_role);
    assert!(!status.is_admin);
    assert!(!status.is_expiring_soon);

    let me = assert_ok!(auth.user_info().await);
    assert_eq!(me.id, 3);

    auth.logout();
    assert!(!auth.check_auth().has_token);
}

#[tokio::test]
async fn login_refusals_are_outcomes_not_errors() {
    let client = mock_client(&ServerConfig::default());
    let auth = AuthService::new(client.clone());

    let unknown = assert_ok!(auth.login("nobody", "pw", Role::Student).await);
    assert!(matches!(unknown, LoginOutcome::Refused { code: 401, .. }));

    let wrong_role = assert_ok!(auth.login("teacher001", "pw", Role::Admin).await);
    assert!(matches!(wrong_role, LoginOutcome::Refused { code: 403, .. }));
    assert!(!wrong_role.is_success());
    assert_eq!(client.session().token(), None);
}

#[tokio::test]
async fn login_drops_a_stale_session_without_refreshing() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        json_response(401, json!({"code": 401, "message": "bad credentials"}))
    }));
    let session = SessionState::in_memory();
    session
        .begin(&Session::new(
            token_expiring_in(-60, "stale"),
            Role::Admin,
            json!({"id": 1}),
        ))
        .unwrap();
    let auth = AuthService::new(ApiClient::new(transport.clone(), session.clone()));

    let outcome = assert_ok!(auth.login("admin", "pw", Role::Admin).await);
    assert_eq!(
        outcome,
        LoginOutcome::Refused {
            code: 401,
            message: "bad credentials".into()
        }
    );
    assert_eq!(transport.calls_to(REFRESH_PATH), 0);
    assert_eq!(transport.requests()[0].bearer, None);
    assert_eq!(session.current(), None);
}

#[tokio::test]
async fn login_network_failure_is_an_error() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Err(ApiError::Network("connection refused".into()))
    }));
    let auth = AuthService::new(ApiClient::new(transport, SessionState::in_memory()));
    let err = assert_err!(auth.login("admin", "pw", Role::Admin).await);
    assert!(matches!(err, ApiError::Network(_)));
}

#[tokio::test]
async fn login_without_token_is_refused() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        json_response(200, json!({"code": 200, "message": "", "data": {"id": 1}}))
    }));
    let auth = AuthService::new(ApiClient::new(transport, SessionState::in_memory()));
    let outcome = assert_ok!(auth.login("admin", "pw", Role::Admin).await);
    assert_eq!(
        outcome,
        LoginOutcome::Refused {
            code: 200,
            message: "Login failed".into()
        }
    );
}

#[tokio::test]
async fn user_administration_round_trip_against_the_mock() {
    let client = mock_client(&ServerConfig::default());
    let auth = AuthService::new(client.clone());
    assert_ok!(auth.login("admin", "pw", Role::Admin).await);
    assert!(auth.check_auth().is_admin);

    let users = UserService::new(client);
    let page = assert_ok!(
        users
            .list(&UserQuery {
                search: Some("teacher".into()),
                ..Default::default()
            })
            .await
    );
    assert_eq!(page.total, 1);
    assert_eq!(page.page_size, 20);
    assert_eq!(page.items[0].username, "teacher001");

    let created = assert_ok!(
        users
            .create(&NewUser {
                username: Some("student002".into()),
                real_name: Some("王五".into()),
                email: Some("wangwu@yunmeng.edu.cn".into()),
                password: Some("secret".into()),
                role: Some("student".into()),
                ..Default::default()
            })
            .await
    );
    assert_eq!(created.id, 4);

    let duplicate = assert_err!(
        users
            .create(&NewUser {
                username: Some("student002".into()),
                real_name: Some("王五".into()),
                email: Some("other@yunmeng.edu.cn".into()),
                password: Some("secret".into()),
                role: Some("student".into()),
                ..Default::default()
            })
            .await
    );
    assert!(matches!(duplicate, ApiError::Validation { status: 409, .. }));

    let change = assert_ok!(users.set_status(4, UserStatus::Inactive).await);
    assert_eq!(change.status, UserStatus::Inactive);

    let reset = assert_ok!(users.reset_password(4).await);
    assert_eq!(reset.id, 4);

    let missing = assert_err!(users.get(99).await);
    assert!(matches!(missing, ApiError::Validation { status: 404, .. }));

    let removed = assert_ok!(users.batch_delete(&[3, 4]).await);
    assert_eq!(removed.deleted_ids, vec![3, 4]);
    assert_ok!(users.delete(2).await);

    let stats = assert_ok!(users.stats().await);
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.role_stats.admin, 1);
}

#[tokio::test]
async fn expiring_mock_token_is_refreshed_before_use() {
    let client = mock_client(&ServerConfig {
        token_ttl_secs: 60,
        ..Default::default()
    });
    let auth = AuthService::new(client.clone());
    let LoginOutcome::LoggedIn { token, .. } =
        assert_ok!(auth.login("teacher001", "pw", Role::Teacher).await)
    else {
        panic!("login refused");
    };
    assert!(auth.check_auth().is_expiring_soon);

    let me = assert_ok!(auth.user_info().await);
    assert_eq!(me.username, "teacher001");
    let renewed = client.session().token().unwrap();
    assert_ne!(renewed, token);
    assert_eq!(client.session().role(), Some(Role::Teacher));
}

#[tokio::test]
async fn my_projects_drops_incomplete_rows() {
    let (transport, client) = scripted(json!({
        "list": [{"id": 1, "name": "Smart campus"}, {"foo": 1}, {"id": 3, "name": null}],
        "total": 3, "page": 1, "size": 10
    }));
    let projects = ProjectService::new(client);

    let rows = assert_ok!(projects.my_projects(Some("draft")).await);
    assert_eq!(rows, vec![json!({"id": 1, "name": "Smart campus"})]);

    let sent = &transport.requests()[0];
    assert_eq!(sent.path, "/projects/my");
    assert_eq!(sent.query, vec![("status".to_string(), "draft".to_string())]);

    assert_ok!(projects.my_projects(None).await);
    assert!(transport.requests()[1].query.is_empty());
}

#[tokio::test]
async fn project_submit_and_reviews() {
    let (transport, client) = scripted(json!({"id": 9, "comment": "ok"}));
    let projects = ProjectService::new(client);

    assert_ok!(projects.submit(9).await);
    let reviews = assert_ok!(projects.reviews(9).await);
    assert_eq!(reviews, vec![json!({"id": 9, "comment": "ok"})]);

    let sent = transport.requests();
    assert_eq!(sent[0].path, "/projects/submit");
    assert_eq!(sent[0].body, Some(json!({"id": 9})));
    assert_eq!(sent[1].path, "/projects/9/reviews");
}

#[tokio::test]
async fn competition_lists_accept_bare_arrays() {
    let (_, client) = scripted(json!([{"id": 1}, {"id": 2}]));
    let competitions = CompetitionService::new(client);

    let page = assert_ok!(competitions.list(query(&[("page", "1")])).await);
    assert_eq!(page.total, 2);
    assert_eq!((page.page, page.page_size), (1, 10));

    let mine = assert_ok!(competitions.my_registrations().await);
    assert_eq!(mine.len(), 2);
}

#[tokio::test]
async fn unread_count_reads_both_shapes() {
    let (_, client) = scripted(json!({"unreadCount": 4}));
    assert_eq!(
        assert_ok!(NotificationService::new(client).unread_count().await),
        4
    );

    let (_, client) = scripted(json!(7));
    assert_eq!(
        assert_ok!(NotificationService::new(client).unread_count().await),
        7
    );

    let (_, client) = scripted(Value::Null);
    assert_eq!(
        assert_ok!(NotificationService::new(client).unread_count().await),
        0
    );
}

#[tokio::test]
async fn notification_updates_use_expected_routes() {
    let (transport, client) = scripted(Value::Null);
    let notifications = NotificationService::new(client);

    assert_ok!(notifications.mark_read(5).await);
    assert_ok!(notifications.mark_all_read().await);
    assert_ok!(notifications.delete(5).await);

    let paths: Vec<String> = transport.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec!["/notifications/5/read", "/notifications/read-all", "/notifications/5"]
    );
}

#[tokio::test]
async fn teacher_and_student_views_page_their_lists() {
    let (transport, client) = scripted(json!({"list": [{"id": 1}], "total": 11, "page": 2, "size": 5}));

    let page = assert_ok!(TeacherService::new(client.clone()).students(Vec::new()).await);
    assert_eq!(page.total, 11);
    assert_eq!(page.pages(), 3);

    let page = assert_ok!(StudentService::new(client.clone()).projects(Vec::new()).await);
    assert_eq!(page.page, 2);

    assert_ok!(
        TeacherService::new(client.clone())
            .review_project(1, &json!({"status": "approved"}))
            .await
    );
    assert_ok!(
        StudentService::new(client)
            .update_progress(1, &json!({"progress": 50}))
            .await
    );

    let sent = transport.requests();
    assert_eq!(sent[0].path, "/teachers/students");
    assert_eq!(sent[1].path, "/projects/my");
    assert_eq!(sent[2].path, "/projects/1/review");
    assert_eq!(sent[3].path, "/student/projects/1/progress");
}

#[tokio::test]
async fn admin_project_management_routes() {
    let (transport, client) = scripted(json!({"id": 7, "status": "approved"}));
    let admin = AdminService::new(client);

    let changed = assert_ok!(admin.force_update_status(7, "approved").await);
    assert_eq!(changed["status"], "approved");
    assert_ok!(admin.soft_delete_project(7).await);
    assert_ok!(admin.restore_project(7).await);
    assert_ok!(admin.cleanup_projects().await);
    assert_ok!(
        admin
            .batch_review(&[7, 8], &json!({"status": "rejected", "projectIds": [1]}))
            .await
    );

    let sent = transport.requests();
    assert_eq!(sent[0].path, "/admin/projects/7/status");
    assert_eq!(sent[0].method, reqwest::Method::PUT);
    assert_eq!(
        sent[0].body,
        Some(json!({"status": "approved", "reason": admin::FORCE_UPDATE_REASON}))
    );
    assert_eq!(sent[1].path, "/admin/projects/7/soft");
    assert_eq!(sent[1].method, reqwest::Method::DELETE);
    assert_eq!(sent[2].path, "/admin/projects/7/restore");
    assert_eq!(sent[2].method, reqwest::Method::PUT);
    assert_eq!(sent[3].path, "/admin/projects/cleanup");
    assert_eq!(sent[3].method, reqwest::Method::POST);
    assert_eq!(sent[4].path, "/admin/projects/batch-review");
    assert_eq!(
        sent[4].body,
        Some(json!({"projectIds": [7, 8], "status": "rejected"}))
    );
}

#[tokio::test]
async fn admin_statistics_and_logs() {
    let (transport, client) = scripted(json!({"list": [{"id": 1}, {"id": 2}], "total": 2}));
    let admin = AdminService::new(client);

    let logs = assert_ok!(admin.project_logs(3, query(&[("page", "1")])).await);
    assert_eq!(logs.total, 2);
    assert_eq!(logs.items.len(), 2);

    let stats = assert_ok!(admin.project_stats().await);
    assert_eq!(stats["total"], 2);
    assert_ok!(admin.system_overview().await);
    assert_ok!(admin.dashboard_stats().await);

    let paths: Vec<String> = transport.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/admin/projects/3/logs",
            "/admin/projects/stats",
            "/admin/system/overview",
            "/admin/dashboard/stats"
        ]
    );
}

#[tokio::test]
async fn admin_calls_surface_permission_errors() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        json_response(403, json!({"code": 403, "message": "admins only"}))
    }));
    let session = SessionState::in_memory();
    session
        .begin(&Session::new(
            token_expiring_in(3600, "t"),
            Role::Student,
            json!({"id": 3}),
        ))
        .unwrap();
    let admin = AdminService::new(ApiClient::new(transport, session.clone()));

    let err = assert_err!(admin.dashboard_stats().await);
    assert!(matches!(err, ApiError::PermissionDenied(_)));
    assert!(session.current().is_some());
}

#[tokio::test]
async fn project_type_crud_routes() {
    let (transport, client) = scripted(json!([{"id": 1, "name": "创新训练"}]));
    let types = ProjectTypeService::new(client);

    let page = assert_ok!(types.list().await);
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0]["name"], "创新训练");

    assert_ok!(types.stats().await);
    assert_ok!(types.detail(1).await);
    assert_ok!(types.create(&json!({"name": "创业实践"})).await);
    assert_ok!(types.update(1, &json!({"name": "创新训练项目"})).await);
    assert_ok!(types.delete(1).await);

    let sent: Vec<(reqwest::Method, String)> = transport
        .requests()
        .into_iter()
        .map(|r| (r.method, r.path))
        .collect();
    assert_eq!(
        sent,
        vec![
            (reqwest::Method::GET, "/project-types".to_string()),
            (reqwest::Method::GET, "/project-types/stats".to_string()),
            (reqwest::Method::GET, "/project-types/1".to_string()),
            (reqwest::Method::POST, "/project-types".to_string()),
            (reqwest::Method::PUT, "/project-types/1".to_string()),
            (reqwest::Method::DELETE, "/project-types/1".to_string()),
        ]
    );
}

#[test]
fn query_skips_empty_values() {
    assert_eq!(
        query(&[("page", "2"), ("search", "")]),
        vec![("page".to_string(), "2".to_string())]
    );
}
