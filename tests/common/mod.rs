//! Shared test helpers for integration tests
//!
//! Every command runs against a throwaway client home (`DRX_HOME`) and, unless
//! a test points it at a stub server, an API URL where nothing listens.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Port 9 (discard) on loopback: connections are refused
pub const UNREACHABLE_API: &str = "http://127.0.0.1:9/api";

/// Helper to get a drx command with no saved session
pub fn drx() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("drx"));
    cmd.env("DRX_API_URL", UNREACHABLE_API)
        .env_remove("DRX_LOG")
        .env_remove("DRX_PASSWORD");
    for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Client home directory for one test
pub struct TestHome {
    pub dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Write a saved session with the given roles
    pub fn login_as(self, username: &str, roles: &[&str]) -> Self {
        let profile = serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "roles": roles,
        });
        fs::write(self.dir.path().join("user"), profile.to_string()).unwrap();
        fs::write(self.dir.path().join("accessToken"), "test-token").unwrap();
        self
    }

    /// A drx command using this home
    pub fn cmd(&self) -> Command {
        let mut cmd = drx();
        cmd.env("DRX_HOME", self.dir.path());
        cmd
    }

    /// A drx command using this home and the given backend
    pub fn cmd_with(&self, server: &StubServer) -> Command {
        let mut cmd = self.cmd();
        cmd.env("DRX_API_URL", server.url());
        cmd
    }

    pub fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.dir.path().join(key)).ok()
    }
}

/// One request as seen by the stub server
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }
}

type Route = Box<dyn Fn(&str, &str) -> (u16, String) + Send + Sync>;

struct Stub {
    route: Route,
    seen: Mutex<Vec<Recorded>>,
}

/// Local backend stand-in served by axum
///
/// `route` maps `(method, path)` to a status code and a JSON body. Paths are
/// seen without the `/api` prefix.
pub struct StubServer {
    port: u16,
    stub: Arc<Stub>,
    // Dropping the runtime stops the server
    _runtime: Runtime,
}

impl StubServer {
    pub fn start<F>(route: F) -> Self
    where
        F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let stub = Arc::new(Stub {
            route: Box::new(route),
            seen: Mutex::new(Vec::new()),
        });

        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = Router::new().fallback(record).with_state(stub.clone());
        runtime.spawn(async move { axum::serve(listener, app).await });

        Self {
            port,
            stub,
            _runtime: runtime,
        }
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/api", self.port)
    }

    /// Requests answered so far, in arrival order
    pub fn finish(self) -> Vec<Recorded> {
        self.stub.seen.lock().unwrap().clone()
    }
}

async fn record(
    State(stub): State<Arc<Stub>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let path = uri.path().trim_start_matches("/api").to_string();
    let (status, reply) = (stub.route)(method.as_str(), &path);
    stub.seen.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path,
        headers,
        body,
    });

    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, "application/json")],
        reply,
    )
}
