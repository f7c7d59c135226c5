//! HTTP surface tests: auth, liveness, ask and queue streams.

use std::time::Duration;

use serde_json::{json, Value};

mod common;

use common::{bridge_config, parse_events, start_bridge, start_echo_backend, TOKEN};

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_ping_needs_no_token() {
    let (backend, _) = start_echo_backend(0, Duration::ZERO).await;
    let (addr, shutdown) = start_bridge(bridge_config(backend)).await;

    let res = client().get(format!("http://{addr}/ping")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "Pong");

    shutdown.trigger();
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let (backend, _) = start_echo_backend(0, Duration::ZERO).await;
    let (addr, shutdown) = start_bridge(bridge_config(backend)).await;
    let client = client();

    let missing = client.get(format!("http://{addr}/status")).send().await.unwrap();
    assert_eq!(missing.status(), 401);

    let wrong = client
        .post(format!("http://{addr}/queue"))
        .bearer_auth("nope")
        .json(&json!({ "prompt": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    let ok = client
        .get(format!("http://{addr}/status"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    let body: Value = ok.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["pending_tasks"], 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_ask_streams_partials_then_reply() {
    let (backend, _) = start_echo_backend(2, Duration::ZERO).await;
    let (addr, shutdown) = start_bridge(bridge_config(backend)).await;

    let res = client()
        .post(format!("http://{addr}/ask"))
        .bearer_auth(TOKEN)
        .json(&json!({ "prompt": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let events = parse_events(&res.text().await.unwrap());
    let expected: Vec<(String, String)> = vec![
        ("partial".into(), "H".into()),
        ("partial".into(), "HE".into()),
        ("reply".into(), "HELLO".into()),
    ];
    assert_eq!(events, expected);

    shutdown.trigger();
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let (backend, echo) = start_echo_backend(0, Duration::ZERO).await;
    let (addr, shutdown) = start_bridge(bridge_config(backend)).await;

    for path in ["ask", "queue"] {
        let res = client()
            .post(format!("http://{addr}/{path}"))
            .bearer_auth(TOKEN)
            .json(&json!({ "prompt": "   " }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
    }
    assert_eq!(echo.submits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_queue_then_run_queue() {
    let (backend, _) = start_echo_backend(1, Duration::ZERO).await;
    let (addr, shutdown) = start_bridge(bridge_config(backend)).await;
    let client = client();

    let mut ids = Vec::new();
    for prompt in ["hello", "missing"] {
        let res = client
            .post(format!("http://{addr}/queue"))
            .bearer_auth(TOKEN)
            .json(&json!({ "prompt": prompt }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 202);
        let body: Value = res.json().await.unwrap();
        let id = body["task_id"].as_str().unwrap().to_string();
        assert_eq!(body["message"], format!("Task added: {id}"));
        ids.push(id);
    }

    let status: Value = client
        .get(format!("http://{addr}/status"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["pending_tasks"], 2);

    let res = client
        .post(format!("http://{addr}/runqueue"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    let events = parse_events(&res.text().await.unwrap());

    let expected: Vec<(String, String)> = vec![
        ("report".into(), format!("Task {}: HELLO", ids[0])),
        ("report".into(), format!("Task {}: task not found", ids[1])),
        ("done".into(), "2 task(s) processed".into()),
    ];
    assert_eq!(events, expected);

    shutdown.trigger();
}
