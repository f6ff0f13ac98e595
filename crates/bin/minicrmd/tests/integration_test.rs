//! End-to-end smoke tests for the full minicrmd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real repos,
//! change feed, a running automation engine, real axum router) and exercises
//! the HTTP layer via `tower::ServiceExt::oneshot` — no TCP port is bound.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use minicrm_adapter_http_axum::router;
use minicrm_adapter_http_axum::state::AppState;
use minicrm_adapter_storage_sqlite_sqlx::{
    Config, SqliteAutomationRuleRepository, SqliteExecutionLogStore, SqliteTaskRepository,
};
use minicrm_adapter_webhook_reqwest::ReqwestWebhookClient;
use minicrm_app::action_dispatcher::ActionDispatcher;
use minicrm_app::automation_engine::AutomationEngine;
use minicrm_app::change_feed::InProcessChangeFeed;
use minicrm_app::rule_store::RuleStore;
use minicrm_domain::id::TenantId;
use sqlx::SqlitePool;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceExt;

struct Stack {
    app: axum::Router,
    pool: SqlitePool,
    tenant: TenantId,
    stop: Option<oneshot::Sender<()>>,
    engine: Option<JoinHandle<()>>,
}

impl Stack {
    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(engine) = self.engine.take() {
            engine.await.unwrap();
        }
    }
}

/// Wire every adapter around an in-memory database, with one tenant whose
/// automation engine is already listening.
async fn stack() -> Stack {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    let pool = db.pool().clone();

    let feed = Arc::new(InProcessChangeFeed::new());
    let rule_repo = Arc::new(SqliteAutomationRuleRepository::new(
        pool.clone(),
        Arc::clone(&feed),
    ));
    let dispatcher = Arc::new(ActionDispatcher::new(
        SqliteTaskRepository::new(pool.clone()),
        ReqwestWebhookClient::new(Duration::from_secs(2)).unwrap(),
        SqliteExecutionLogStore::new(pool.clone()),
    ));

    let tenant = TenantId::new();
    let store = Arc::new(RuleStore::new(tenant, rule_repo));
    store.load().await.unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let engine = AutomationEngine::new(Arc::clone(&store), dispatcher);
    let engine = tokio::spawn(engine.run(Arc::clone(&feed), async move {
        let _ = stop_rx.await;
    }));
    // rules, customers, orders
    wait_until(|| feed.subscriber_count() == 3).await;

    let app = router::build(AppState::new([store], feed));
    Stack {
        app,
        pool,
        tenant,
        stop: Some(stop_tx),
        engine: Some(engine),
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: String,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn list_rules(stack: &Stack) -> Vec<serde_json::Value> {
    let (status, body) = send(
        &stack.app,
        "GET",
        format!("/api/tenants/{}/automations", stack.tenant),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body.as_array().cloned().unwrap_or_default()
}

/// Poll the rule list until `predicate` holds for it.
async fn wait_for_rules(stack: &Stack, predicate: impl Fn(&[serde_json::Value]) -> bool) {
    for _ in 0..400 {
        if predicate(&list_rules(stack).await) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("rule list never reached the expected state");
}

async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
}

async fn wait_for_count(pool: &SqlitePool, sql: &str, expected: i64) {
    for _ in 0..400 {
        if count(pool, sql).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("`{sql}` never returned {expected}");
}

fn welcome_call_rule() -> serde_json::Value {
    serde_json::json!({
        "name": "Welcome call",
        "trigger_type": "new_customer",
        "trigger_config": {"tags": []},
        "action_type": "create_task",
        "action_config": {"title": "Welcome call", "assignee": null}
    })
}

fn new_customer() -> serde_json::Value {
    serde_json::json!({
        "table": "customers",
        "operation": "insert",
        "record": {"id": "c-1", "name": "Ada", "email": "ada@example.com"}
    })
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack().await;

    let response = stack
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    stack.shutdown().await;
}

// ---------------------------------------------------------------------------
// Automations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_mirror_created_rule_in_list() {
    let stack = stack().await;

    let (status, created) = send(
        &stack.app,
        "POST",
        format!("/api/tenants/{}/automations", stack.tenant),
        Some(welcome_call_rule()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_active"], true);
    let id = created["id"].clone();
    wait_for_rules(&stack, |rules| rules.iter().any(|rule| rule["id"] == id)).await;
    stack.shutdown().await;
}

#[tokio::test]
async fn should_create_pending_task_and_success_log_when_customer_inserted() {
    let stack = stack().await;
    send(
        &stack.app,
        "POST",
        format!("/api/tenants/{}/automations", stack.tenant),
        Some(welcome_call_rule()),
    )
    .await;
    wait_for_rules(&stack, |rules| rules.len() == 1).await;

    let (status, _) = send(
        &stack.app,
        "POST",
        format!("/api/tenants/{}/changes", stack.tenant),
        Some(new_customer()),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_count(
        &stack.pool,
        "SELECT COUNT(*) FROM automation_logs WHERE success = 1",
        1,
    )
    .await;
    let (title, status): (String, String) = sqlx::query_as("SELECT title, status FROM tasks")
        .fetch_one(&stack.pool)
        .await
        .unwrap();
    assert_eq!(title, "Welcome call");
    assert_eq!(status, "pending");
    stack.shutdown().await;
}

#[tokio::test]
async fn should_skip_rule_when_deactivated() {
    let stack = stack().await;
    let (_, task_rule) = send(
        &stack.app,
        "POST",
        format!("/api/tenants/{}/automations", stack.tenant),
        Some(welcome_call_rule()),
    )
    .await;
    send(
        &stack.app,
        "POST",
        format!("/api/tenants/{}/automations", stack.tenant),
        Some(serde_json::json!({
            "name": "Welcome email",
            "trigger_type": "new_customer",
            "trigger_config": {"tags": []},
            "action_type": "send_email",
            "action_config": {"template": "welcome", "subject": "Welcome aboard"}
        })),
    )
    .await;
    wait_for_rules(&stack, |rules| rules.len() == 2).await;
    let id = task_rule["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &stack.app,
        "PUT",
        format!("/api/tenants/{}/automations/{id}/active", stack.tenant),
        Some(serde_json::json!({"is_active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    wait_for_rules(&stack, |rules| {
        rules
            .iter()
            .any(|rule| rule["id"] == id.as_str() && rule["is_active"] == false)
    })
    .await;

    send(
        &stack.app,
        "POST",
        format!("/api/tenants/{}/changes", stack.tenant),
        Some(new_customer()),
    )
    .await;

    wait_for_count(&stack.pool, "SELECT COUNT(*) FROM automation_logs", 1).await;
    let action_type: String = sqlx::query_scalar("SELECT action_type FROM automation_logs")
        .fetch_one(&stack.pool)
        .await
        .unwrap();
    assert_eq!(action_type, "send_email");
    assert_eq!(count(&stack.pool, "SELECT COUNT(*) FROM tasks").await, 0);
    stack.shutdown().await;
}

#[tokio::test]
async fn should_return_not_found_when_tenant_is_not_served() {
    let stack = stack().await;

    let (status, _) = send(
        &stack.app,
        "GET",
        format!("/api/tenants/{}/automations", TenantId::new()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    stack.shutdown().await;
}
