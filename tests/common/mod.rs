//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use lambda_serve::config::{parse_config, ServeConfig};
use lambda_serve::http::{HttpServer, ServeError};
use lambda_serve::invoke::{handler_fn, Handler, InvocationEvent, LocalContextProvider};
use lambda_serve::lifecycle::Shutdown;
use lambda_serve::reload::{BuildEvent, OutputLoader};

/// A running server and the handles a test drives it with.
pub struct TestServer {
    pub addr: SocketAddr,
    pub builds: mpsc::UnboundedSender<BuildEvent>,
    pub shutdown: Shutdown,
    pub task: tokio::task::JoinHandle<Result<(), ServeError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a server for `service` (TOML) on an ephemeral port.
pub async fn start_server(service: &str) -> TestServer {
    let config: ServeConfig = parse_config(service).unwrap();
    let server = HttpServer::new(&config, Arc::new(LocalContextProvider::new())).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (builds, build_rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let task = tokio::spawn(async move {
        server
            .run(listener, build_rx, Arc::new(OutputLoader::new()), server_shutdown)
            .await
    });

    TestServer {
        addr,
        builds,
        shutdown,
        task,
    }
}

/// A function that records every event it receives and answers with `reply`.
#[allow(dead_code)]
pub fn recording(reply: Value) -> (Arc<dyn Handler>, Arc<Mutex<Vec<InvocationEvent>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let handler: Arc<dyn Handler> = Arc::new(handler_fn(move |event: InvocationEvent, _| {
        log.lock().unwrap().push(event);
        let reply = reply.clone();
        async move { Ok(reply) }
    }));
    (handler, seen)
}

/// Wait until the server has applied the builds sent so far.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
