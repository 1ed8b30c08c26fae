//! Streamable-HTTP transport: JSON-RPC over `POST /mcp/v1/message` with an
//! SSE channel at `GET /mcp/v1/stream` for server-to-client frames.

use crate::stream::{OutboundStream, PendingRequests};
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cdsync_mcp::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
use cdsync_mcp::{LifecycleEvent, McpService};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn};

/// Shared state behind the router.
pub struct AppState {
    service: Arc<McpService>,
    outbound: OutboundStream,
    pending: PendingRequests,
    started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<McpService>, pending_timeout: Duration) -> Self {
        Self {
            service,
            outbound: OutboundStream::new(),
            pending: PendingRequests::new(pending_timeout),
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP transport and serve until the process exits.
pub async fn serve(
    addr: &str,
    service: Arc<McpService>,
    pending_timeout: Duration,
) -> Result<()> {
    let state = Arc::new(AppState::new(service.clone(), pending_timeout));
    tokio::spawn(forward_lifecycle(service.subscribe(), state.clone()));

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP transport listening on {addr}");
    service.announce_started();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the transport router.
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mcp/v1/info", get(info_handler))
        .route("/mcp/v1/health", get(health_handler))
        .route("/mcp/v1/message", post(message_handler))
        .route("/mcp/v1/stream", get(stream_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Forward lifecycle events to stream subscribers as MCP log notifications.
async fn forward_lifecycle(
    mut events: broadcast::Receiver<LifecycleEvent>,
    state: Arc<AppState>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let notification = JsonRpcRequest::notification(
                    "notifications/message",
                    serde_json::json!({
                        "level": "info",
                        "logger": "cdsync",
                        "data": event,
                    }),
                );
                match serde_json::to_string(&notification) {
                    Ok(frame) => state.outbound.publish(frame),
                    Err(e) => warn!(error = %e, "failed to serialize lifecycle event"),
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "lifecycle forwarder lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn info_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "cdsync-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "protocolVersion": PROTOCOL_VERSION,
        "transport": "http",
        "toolCount": state.service.tool_count(),
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
    }))
}

/// One JSON-RPC envelope per POST.
///
/// Requests are dispatched and answered in the HTTP body. Responses (the
/// client answering a server-initiated request) and notifications are
/// acknowledged with 202. Malformed JSON gets a parse-error envelope.
async fn message_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    let value: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => return parse_error_response(e),
    };

    if value.get("method").is_some() {
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => return parse_error_response(e),
        };
        return match state.service.handle_request(request).await {
            Some(response) => Json(response).into_response(),
            None => accepted(),
        };
    }

    if value.get("result").is_some() || value.get("error").is_some() {
        return match serde_json::from_value::<JsonRpcResponse>(value) {
            Ok(response) => {
                state.pending.resolve(response);
                accepted()
            }
            Err(e) => parse_error_response(e),
        };
    }

    (
        StatusCode::BAD_REQUEST,
        Json(JsonRpcResponse::error(
            serde_json::Value::Null,
            JsonRpcError::invalid_request(),
        )),
    )
        .into_response()
}

async fn stream_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("stream client connected");
    let (backlog, live) = state.outbound.attach();

    let backlog = tokio_stream::iter(
        backlog
            .into_iter()
            .map(|frame| Ok::<_, Infallible>(Event::default().event("message").data(frame))),
    );
    let live = BroadcastStream::new(live).filter_map(|result| match result {
        Ok(frame) => Some(Ok(Event::default().event("message").data(frame))),
        // Lagged subscribers skip the missed frames.
        Err(_) => None,
    });

    Sse::new(backlog.chain(live)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn accepted() -> Response {
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"status": "accepted"})),
    )
        .into_response()
}

fn parse_error_response(e: serde_json::Error) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(JsonRpcResponse::error(
            serde_json::Value::Null,
            JsonRpcError::parse_error(e.to_string()),
        )),
    )
        .into_response()
}
