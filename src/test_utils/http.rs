//! Local HTTP server for exercising the network code offline.
//!
//! Built on axum. Every configured path gets its own handler and unknown
//! paths answer `404`. Requested paths are recorded by a middleware so
//! tests can assert on what the client fetched.

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type Hits = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone)]
enum Route {
    Body {
        status: StatusCode,
        body: Vec<u8>,
        with_length: bool,
    },
    /// Declares `declared` bytes but sends only `body` before failing.
    Truncated {
        body: Vec<u8>,
        declared: usize,
    },
}

impl IntoResponse for Route {
    fn into_response(self) -> Response {
        let octet_stream = (header::CONTENT_TYPE, "application/octet-stream");
        match self {
            Self::Body {
                status,
                body,
                with_length: true,
            } => (status, [octet_stream], body).into_response(),
            // a streamed body has no known size, so it goes out chunked
            Self::Body {
                status,
                body,
                with_length: false,
            } => {
                let stream = futures::stream::once(async move { Ok::<_, io::Error>(body) });
                (status, [octet_stream], Body::from_stream(stream)).into_response()
            }
            Self::Truncated {
                body,
                declared,
            } => {
                let chunks: Vec<Result<Vec<u8>, io::Error>> = vec![
                    Ok(body),
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "truncated")),
                ];
                let headers = [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (header::CONTENT_LENGTH, declared.to_string()),
                ];
                (StatusCode::OK, headers, Body::from_stream(futures::stream::iter(chunks)))
                    .into_response()
            }
        }
    }
}

/// Builder for [`TestServer`].
#[derive(Debug, Default)]
pub struct TestServerBuilder {
    routes: HashMap<String, Route>,
    stall: bool,
}

impl TestServerBuilder {
    /// Serve `body` with status 200 and a `Content-Length`.
    #[must_use]
    pub fn route(mut self, path: &str, body: Vec<u8>) -> Self {
        self.routes.insert(
            normalize(path),
            Route::Body {
                status: StatusCode::OK,
                body,
                with_length: true,
            },
        );
        self
    }

    /// Serve `body` with status 200 and no `Content-Length`.
    #[must_use]
    pub fn route_without_length(mut self, path: &str, body: Vec<u8>) -> Self {
        self.routes.insert(
            normalize(path),
            Route::Body {
                status: StatusCode::OK,
                body,
                with_length: false,
            },
        );
        self
    }

    /// Answer `path` with `status` and an empty body.
    #[must_use]
    pub fn status(mut self, path: &str, status: u16) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.routes.insert(
            normalize(path),
            Route::Body {
                status,
                body: Vec::new(),
                with_length: true,
            },
        );
        self
    }

    /// Promise `declared` bytes, send `body`, then drop the connection.
    #[must_use]
    pub fn truncated(mut self, path: &str, body: Vec<u8>, declared: usize) -> Self {
        self.routes.insert(
            normalize(path),
            Route::Truncated {
                body,
                declared,
            },
        );
        self
    }

    /// Accept requests but never answer.
    #[must_use]
    pub const fn stall(mut self) -> Self {
        self.stall = true;
        self
    }

    fn router(self, hits: Hits) -> Router {
        let router = if self.stall {
            Router::new().fallback(stall)
        } else {
            let mut router = Router::new();
            for (path, route) in self.routes {
                router = router.route(&path, get(move || std::future::ready(route.clone())));
            }
            router.fallback(|| async { (StatusCode::NOT_FOUND, "not found") })
        };
        router.layer(middleware::from_fn_with_state(hits, record_hit))
    }

    /// Bind to an ephemeral localhost port and start serving.
    pub async fn start(self) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("test server address");
        let hits = Hits::default();

        let app = self.router(Arc::clone(&hits));
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::debug!("test server stopped: {}", e);
            }
        });

        TestServer {
            addr,
            hits,
            task,
        }
    }
}

async fn record_hit(State(hits): State<Hits>, request: Request, next: Next) -> Response {
    hits.lock().expect("hits lock").push(request.uri().path().to_string());
    next.run(request).await
}

async fn stall() -> Response {
    std::future::pending().await
}

/// Running fixture server. Stops accepting when dropped.
pub struct TestServer {
    addr: SocketAddr,
    hits: Hits,
    task: JoinHandle<()>,
}

impl TestServer {
    #[must_use]
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder::default()
    }

    /// `http://127.0.0.1:<port>/`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Absolute URL of `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, normalize(path))
    }

    /// Paths requested so far, in arrival order.
    #[must_use]
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().expect("hits lock").clone()
    }

    /// How many times `path` was requested.
    #[must_use]
    pub fn hit_count(&self, path: &str) -> usize {
        let path = normalize(path);
        self.hits().iter().filter(|hit| **hit == path).count()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// URL of a localhost port with nothing listening on it.
pub async fn unused_local_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe port");
    let addr = listener.local_addr().expect("probe port address");
    drop(listener);
    format!("http://{addr}/")
}

fn normalize(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    if path.starts_with('/') { path.to_string() } else { format!("/{path}") }
}
