//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{header, Method, StatusCode, Uri};
use axum::Router;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use inference_bridge::engine::{DeliveryError, ReplySink};
use inference_bridge::{BridgeConfig, BridgeContext, HttpServer, Shutdown};

pub const TOKEN: &str = "test-token";

/// What the mock backend saw.
pub struct MockRequest {
    pub method: Method,
    pub path: String,
    pub body: String,
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    let app = Router::new().fallback(move |method: Method, uri: Uri, body: String| {
        let f = f.clone();
        async move {
            let request = MockRequest {
                method,
                path: uri.path().to_string(),
                body,
            };
            let (status, body) = f(request).await;
            (
                StatusCode::from_u16(status).unwrap(),
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
        }
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Backend that answers each prompt with its upper-case form.
///
/// Every job reports `running` (with a growing partial) for `running_polls`
/// polls before completing. Magic prompts: `missing` is never found, `boom`
/// fails, `reject` is refused at submission.
pub struct EchoBackend {
    jobs: Mutex<HashMap<String, (String, usize)>>,
    running_polls: usize,
    submit_delay: Duration,
    submits: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl EchoBackend {
    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn handle(&self, request: MockRequest) -> (u16, String) {
        if request.method == Method::POST && request.path == "/generate" {
            return self.submit(&request.body).await;
        }
        match request.path.strip_prefix("/result/") {
            Some(id) if request.method == Method::GET => self.result(id),
            _ => (404, String::new()),
        }
    }

    async fn submit(&self, body: &str) -> (u16, String) {
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.submit_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let prompt = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["prompt"].as_str().map(str::to_string))
            .unwrap_or_default();
        if prompt == "reject" {
            return (500, json!({ "detail": "overloaded" }).to_string());
        }

        let id = format!("task-{n}");
        self.jobs.lock().unwrap().insert(id.clone(), (prompt, 0));
        (200, json!({ "task_id": id }).to_string())
    }

    fn result(&self, id: &str) -> (u16, String) {
        let mut jobs = self.jobs.lock().unwrap();
        let Some((prompt, polls)) = jobs.get_mut(id) else {
            return (404, String::new());
        };
        let upper = prompt.to_uppercase();
        let body = match prompt.as_str() {
            "missing" => return (404, String::new()),
            "boom" => json!({ "status": "failed" }),
            _ if *polls < self.running_polls => {
                let shown: String = upper.chars().take(*polls + 1).collect();
                json!({ "status": "running", "partial": shown })
            }
            _ => json!({ "status": "completed", "output": upper }),
        };
        *polls += 1;
        (200, body.to_string())
    }
}

pub async fn start_echo_backend(running_polls: usize, submit_delay: Duration) -> (SocketAddr, Arc<EchoBackend>) {
    let backend = Arc::new(EchoBackend {
        jobs: Mutex::new(HashMap::new()),
        running_polls,
        submit_delay,
        submits: AtomicUsize::new(0),
        in_flight: AtomicUsize::new(0),
        max_in_flight: AtomicUsize::new(0),
    });
    let handler = backend.clone();
    let addr = start_programmable_backend(move |request| {
        let handler = handler.clone();
        async move { handler.handle(request).await }
    })
    .await;
    (addr, backend)
}

/// Bridge configuration pointed at `backend` with test-sized timeouts.
pub fn bridge_config(backend: SocketAddr) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.backend.base_url = format!("http://{backend}");
    config.listener.bind_address = "127.0.0.1:0".into();
    config.listener.access_token = TOKEN.into();
    config.timeouts.submit_ms = 1_000;
    config.timeouts.poll_ms = 500;
    config.timeouts.poll_interval_ms = 20;
    config.timeouts.total_ms = 2_000;
    config.timeouts.delivery_ms = 500;
    config
}

/// Serve the bridge on an ephemeral port. Trigger the returned handle to stop it.
pub async fn start_bridge(config: BridgeConfig) -> (SocketAddr, Shutdown) {
    let context = Arc::new(BridgeContext::from_config(config).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = Shutdown::wait(shutdown.subscribe());
    tokio::spawn(async move {
        let _ = HttpServer::new(context).run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// Split an event-stream body into `(event, data)` pairs.
pub fn parse_events(body: &str) -> Vec<(String, String)> {
    body.split("\n\n")
        .filter_map(|frame| {
            let mut event = String::from("message");
            let mut data = Vec::new();
            for line in frame.lines() {
                if let Some(name) = line.strip_prefix("event:") {
                    event = name.trim().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
                }
            }
            (!data.is_empty()).then(|| (event, data.join("\n")))
        })
        .collect()
}

/// Sink collecting every delivery.
#[derive(Default)]
pub struct CollectingSink {
    pub delivered: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

impl ReplySink for CollectingSink {
    fn deliver(&self, text: String) -> BoxFuture<'_, Result<(), DeliveryError>> {
        async move {
            self.delivered.lock().unwrap().push(text);
            Ok(())
        }
        .boxed()
    }
}
