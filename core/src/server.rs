// apiseed
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Lifecycle of the HTTP server.
//!
//! A `Server` takes the `Router` of a service, mounts it under its base path, optionally wraps it
//! with an access log, and serves it until the process receives Ctrl-C or SIGTERM.  Services can
//! register hooks to run right before serving starts and right after it stops, which is where
//! persistent state should be loaded and saved.

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use derivative::Derivative;
use log::{info, warn};
use std::future::{self, Future};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;

/// A lifecycle hook.
pub type Hook = Box<dyn FnOnce() + Send>;

/// Middleware that logs every request and the status code of its response.
async fn log_api_call(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;
    info!("{} {} -> {}", method, path, response.status().as_u16());
    response
}

/// Normalizes a base path into the form accepted by `Router::nest`.
///
/// Returns `None` if the base path refers to the root.
fn normalize_base_path(base_path: &str) -> Option<String> {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() { None } else { Some(format!("/{}", trimmed)) }
}

/// Waits until the process is asked to terminate via Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Cannot wait for Ctrl-C: {}", e);
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Cannot wait for SIGTERM: {}", e);
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C"),
        () = terminate => info!("Received SIGTERM"),
    }
}

/// Builder and runner for the HTTP server of a service.
#[derive(Derivative)]
#[derivative(Debug)]
#[must_use]
pub struct Server {
    /// Routes of the service, relative to the base path.
    #[derivative(Debug = "ignore")]
    router: Router,

    /// Path under which to mount the routes of the service.
    base_path: String,

    /// Whether to log every request.
    log_api_calls: bool,

    /// Hooks to run before serving starts, in registration order.
    #[derivative(Debug = "ignore")]
    on_start: Vec<Hook>,

    /// Hooks to run after serving stops, in registration order.
    #[derivative(Debug = "ignore")]
    on_stop: Vec<Hook>,
}

impl Server {
    /// Creates a new server for the routes in `router`, mounted at the root.
    pub fn new(router: Router) -> Self {
        Self {
            router,
            base_path: String::new(),
            log_api_calls: false,
            on_start: vec![],
            on_stop: vec![],
        }
    }

    /// Mounts the routes under `base_path`.  An empty path or `/` mean the root.
    pub fn base_path<P: Into<String>>(mut self, base_path: P) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Enables or disables logging of every request at the INFO level.
    pub fn log_api_calls(mut self, enabled: bool) -> Self {
        self.log_api_calls = enabled;
        self
    }

    /// Registers a `hook` to run before serving starts.
    pub fn on_start<F: FnOnce() + Send + 'static>(mut self, hook: F) -> Self {
        self.on_start.push(Box::from(hook));
        self
    }

    /// Registers a `hook` to run after serving stops.
    pub fn on_stop<F: FnOnce() + Send + 'static>(mut self, hook: F) -> Self {
        self.on_stop.push(Box::from(hook));
        self
    }

    /// Builds the router to serve, mounted under the base path and with the access log if
    /// enabled.  Lifecycle hooks are discarded.
    pub fn into_router(self) -> Router {
        Self::build_router(self.router, &self.base_path, self.log_api_calls)
    }

    /// Internal implementation of `into_router` that does not consume the hooks.
    fn build_router(router: Router, base_path: &str, log_api_calls: bool) -> Router {
        let mut router = match normalize_base_path(base_path) {
            Some(base_path) => Router::new().nest(&base_path, router),
            None => router,
        };
        if log_api_calls {
            router = router.layer(middleware::from_fn(log_api_call));
        }
        router
    }

    /// Serves requests on `listener` until `shutdown` completes, running the lifecycle hooks
    /// around it.
    pub async fn serve_with_shutdown<S>(self, listener: TcpListener, shutdown: S) -> io::Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        info!("initializing...");
        let router = Self::build_router(self.router, &self.base_path, self.log_api_calls);
        for hook in self.on_start {
            hook();
        }
        info!("ready...");

        let result = axum::serve(listener, router).with_graceful_shutdown(shutdown).await;

        info!("stopping...");
        for hook in self.on_stop {
            hook();
        }
        result
    }

    /// Serves requests on `addr` until the process receives Ctrl-C or SIGTERM.
    pub async fn serve(self, addr: SocketAddr) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);
        self.serve_with_shutdown(listener, shutdown_signal()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::testutils::CapturedConsole;
    use crate::logger::{self, Level, Logger, LoggerOptions};
    use crate::rest::testutils::OneShotBuilder;
    use axum::extract::Path;
    use axum::routing::get;
    use std::sync::{Arc, Mutex, OnceLock};

    /// Installs a logger that captures all messages, once for the whole test program.
    fn captured_logs() -> CapturedConsole {
        static CONSOLE: OnceLock<CapturedConsole> = OnceLock::new();
        CONSOLE
            .get_or_init(|| {
                let console = CapturedConsole::default();
                let opts = LoggerOptions { level: Level::Info, ..Default::default() };
                logger::install(Logger::new(opts).with_console(console.clone())).unwrap();
                console
            })
            .clone()
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "root" }))
            .route(
                "/hello/:name",
                get(|Path(name): Path<String>| async move { format!("hello {}", name) }),
            )
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(None, normalize_base_path(""));
        assert_eq!(None, normalize_base_path("/"));
        assert_eq!(Some("/api".to_owned()), normalize_base_path("api"));
        assert_eq!(Some("/api/v1".to_owned()), normalize_base_path("/api/v1/"));
    }

    #[tokio::test]
    async fn test_into_router_at_root() {
        let router = Server::new(app()).base_path("/").into_router();
        OneShotBuilder::new(router, (http::Method::GET, "/hello/root"))
            .send_empty()
            .await
            .expect_text("^hello root$")
            .await;
    }

    #[tokio::test]
    async fn test_into_router_with_base_path() {
        let router = Server::new(app()).base_path("/api/").into_router();
        OneShotBuilder::new(router.clone(), (http::Method::GET, "/api/hello/nested"))
            .send_empty()
            .await
            .expect_text("^hello nested$")
            .await;

        OneShotBuilder::new(router, (http::Method::GET, "/hello/nested"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_empty()
            .await;
    }

    #[tokio::test]
    async fn test_log_api_calls_enabled() {
        let console = captured_logs();

        let router = Server::new(app()).base_path("logged").log_api_calls(true).into_router();
        OneShotBuilder::new(router, (http::Method::GET, "/logged/hello/access-log"))
            .send_empty()
            .await
            .expect_text("access-log")
            .await;

        let lines = console.lines();
        assert!(
            lines.iter().any(|line| line.starts_with("[INFO] ")
                && line.ends_with(" GET /logged/hello/access-log -> 200")),
            "Access log not found in {:?}",
            lines
        );
    }

    #[tokio::test]
    async fn test_log_api_calls_disabled() {
        let console = captured_logs();

        let router = Server::new(app()).log_api_calls(false).into_router();
        OneShotBuilder::new(router, (http::Method::GET, "/hello/not-logged"))
            .send_empty()
            .await
            .expect_text("not-logged")
            .await;

        let lines = console.lines();
        assert!(!lines.iter().any(|line| line.contains("/hello/not-logged")), "{:?}", lines);
    }

    #[tokio::test]
    async fn test_serve_runs_hooks_in_order() {
        let console = captured_logs();
        let events: Arc<Mutex<Vec<&str>>> = Arc::new(Mutex::new(vec![]));

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let server = {
            let events1 = events.clone();
            let events2 = events.clone();
            let events3 = events.clone();
            Server::new(app())
                .on_start(move || events1.lock().unwrap().push("start 1"))
                .on_start(move || events2.lock().unwrap().push("start 2"))
                .on_stop(move || events3.lock().unwrap().push("stop"))
        };
        let handle = tokio::spawn(server.serve_with_shutdown(listener, async move {
            rx.await.unwrap();
        }));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(vec!["start 1", "start 2", "stop"], *events.lock().unwrap());
        let lines = console.lines();
        for message in ["initializing...", "ready...", "stopping..."] {
            assert!(lines.iter().any(|line| line.ends_with(message)), "{:?}", lines);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_signal_on_sigterm() {
        use std::process::Command;
        use std::time::Duration;
        use tokio::signal::unix::{SignalKind, signal};

        // Prevents SIGTERM from killing the test program.
        let _sigterm = signal(SignalKind::terminate()).unwrap();

        let handle = tokio::spawn(shutdown_signal());
        let pid = std::process::id().to_string();
        for _ in 0..100 {
            if handle.is_finished() {
                break;
            }
            assert!(Command::new("kill").args(["-TERM", &pid]).status().unwrap().success());
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }
}
