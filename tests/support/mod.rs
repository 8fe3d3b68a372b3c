//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use stream_saver::core::app::App;
use stream_saver::core::launcher::{DownloadLauncher, DownloadTicket};
use stream_saver::error::Result;
use stream_saver::storage::kv::KvStore;
use stream_saver::types::{Config, ConnectivityStatus, DownloadRequest};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CODE: &str = "1512";

/// Records every launch and reports it as fire-and-forget.
#[derive(Default)]
pub struct RecordingLauncher {
    pub launched: Mutex<Vec<DownloadRequest>>,
}

impl DownloadLauncher for RecordingLauncher {
    fn launch(&self, request: &DownloadRequest) -> Result<DownloadTicket> {
        self.launched.lock().unwrap().push(request.clone());
        Ok(DownloadTicket::Detached)
    }
}

/// Config with timings short enough for tests.
pub fn test_config(backend_url: &str) -> Config {
    Config {
        backend_url: backend_url.to_string(),
        access_code: CODE.into(),
        health_interval_ms: 50,
        probe_timeout_ms: 500,
        analyze_timeout_ms: 2_000,
        download_cooldown_ms: 300,
        ..Config::default()
    }
}

/// Address where nothing is listening.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Mock server answering the liveness probe.
pub async fn backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Server is running!"))
        .mount(&server)
        .await;
    server
}

pub fn analysis_payload() -> Value {
    json!({
        "title": "T",
        "author": "A",
        "formats": [{"id": "mp4", "quality": "720p", "ext": "mp4"}]
    })
}

pub async fn app_with(
    config: Config,
    dir: &TempDir,
    launcher: Arc<dyn DownloadLauncher>,
) -> App {
    let store = KvStore::new(dir.path().join("state.json"));
    App::restore(config, store, launcher)
        .await
        .expect("app should build")
}

pub async fn unlocked_app(
    config: Config,
    dir: &TempDir,
    launcher: Arc<dyn DownloadLauncher>,
) -> App {
    let mut app = app_with(config, dir, launcher).await;
    app.unlock(CODE).await.expect("unlock should succeed");
    app
}

/// Wait until the health monitor publishes `target`.
pub async fn wait_for_status(app: &App, target: ConnectivityStatus) {
    let mut rx = app
        .subscribe_connectivity()
        .expect("monitor should be running");
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == target))
        .await
        .expect("status should settle in time")
        .expect("monitor should still be alive");
}
