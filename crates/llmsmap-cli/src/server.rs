//! Local HTTP server for a generated output directory.
//!
//! Routes:
//!
//! - `GET /llmsmap.txt` and `GET /manifest.json`: the generated documents
//! - `GET <fetch path>`: query string handed to the fetch handler
//! - `OPTIONS <fetch path>`: CORS preflight
//!
//! Everything else is 404.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use axum::Router;
use axum::body::Body;
use axum::extract::{RawQuery, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use llmsmap_core::generate::{INDEX_FILE, MANIFEST_FILE};
use llmsmap_core::retrieval::{CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};
use llmsmap_core::{FetchHandler, FetchResponse, FsContentStore};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::commands::OutputSettings;

struct ServeState {
    output_dir: PathBuf,
    handler: FetchHandler<FsContentStore>,
}

/// Build the router for `settings`.
///
/// Fails if the fetch path is relative or collides with a document route.
pub fn router(settings: &OutputSettings) -> Result<Router> {
    if !settings.fetch_path.starts_with('/') {
        bail!(
            "fetch endpoint path must start with '/', got {}",
            settings.fetch_path
        );
    }
    let index_route = format!("/{INDEX_FILE}");
    let manifest_route = format!("/{MANIFEST_FILE}");
    if settings.fetch_path == index_route || settings.fetch_path == manifest_route {
        bail!(
            "fetch endpoint path {} collides with a generated document",
            settings.fetch_path
        );
    }

    let state = Arc::new(ServeState {
        output_dir: settings.output_dir.clone(),
        handler: FetchHandler::new(FsContentStore::new(&settings.output_dir))
            .with_cors(settings.cors),
    });

    let mut documents = Router::new()
        .route(&index_route, get(index_document))
        .route(&manifest_route, get(manifest_document));
    if settings.cors {
        documents = documents.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS]),
        );
    }

    Ok(documents
        .route(&settings.fetch_path, get(fetch).options(preflight))
        .fallback(not_found)
        .with_state(state))
}

/// A running server.
pub struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Server {
    /// Bind `addr` and start serving in the background.
    pub async fn start(addr: SocketAddr, settings: &OutputSettings) -> Result<Self> {
        let app = router(settings)?;
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                warn!(error = %e, "Server stopped with an error");
            }
        });

        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Bound address (with the real port when started on port 0).
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
    }
}

async fn index_document(State(state): State<Arc<ServeState>>) -> Response {
    document(&state, INDEX_FILE, CONTENT_TYPE_TEXT).await
}

async fn manifest_document(State(state): State<Arc<ServeState>>) -> Response {
    document(&state, MANIFEST_FILE, CONTENT_TYPE_JSON).await
}

async fn document(state: &ServeState, name: &str, content_type: &'static str) -> Response {
    match tokio::fs::read_to_string(state.output_dir.join(name)).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(file = name, "Document not generated yet");
            not_found().await.into_response()
        },
        Err(e) => {
            warn!(file = name, error = %e, "Failed to read document");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to read document").into_response()
        },
    }
}

async fn fetch(State(state): State<Arc<ServeState>>, RawQuery(query): RawQuery) -> Response {
    let query = query.unwrap_or_default();
    match tokio::task::spawn_blocking(move || state.handler.handle_query(&query)).await {
        Ok(response) => into_http(response),
        Err(e) => {
            warn!(error = %e, "Fetch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "fetch task failed").into_response()
        },
    }
}

async fn preflight(State(state): State<Arc<ServeState>>) -> Response {
    into_http(state.handler.preflight())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}

fn into_http(response: FetchResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = axum::http::Response::builder().status(status);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|e| {
            warn!(error = %e, "Invalid fetch response headers");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}
