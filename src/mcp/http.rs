use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::server::McpServer;
use super::types::{JsonRpcError, JsonRpcResponse};

pub const SESSION_HEADER: &str = "mcp-session-id";

/// Router answering JSON-RPC posts on `path`
pub fn router(server: Arc<McpServer>, path: &str) -> Router {
    Router::new()
        .route(path, post(handle_rpc))
        .with_state(server)
}

/// Bind and serve until `shutdown` resolves
pub async fn serve(
    server: Arc<McpServer>,
    addr: &str,
    path: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Serving MCP on http://{}{}", listener.local_addr()?, path);

    axum::serve(listener, router(server, path))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn handle_rpc(State(server): State<Arc<McpServer>>, body: String) -> Response {
    let request = match McpServer::parse_request(&body) {
        Ok(request) => request,
        Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
    };

    let opens_session = request.method == "initialize";

    match server.dispatch(request).await {
        Ok(Some(response)) => {
            let mut http_response = Json(response).into_response();
            if opens_session
                && let Ok(value) = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            {
                http_response.headers_mut().insert(SESSION_HEADER, value);
            }
            http_response
        }
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            error!("Error processing request: {}", e);
            let response =
                JsonRpcResponse::error(None, JsonRpcError::internal_error(e.to_string()));
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}
