//! Webhook surface for event-triggered ingestion.
//!
//! - `POST /events` – Run one handler invocation on an object-created notification. The HTTP
//!   status mirrors the handler's `statusCode`; the body is the `{statusCode, body}` response.
//! - `GET /metrics` – Ingestion counters.
//! - `GET /commands` – Machine-readable catalog of the endpoints above.

use crate::handler::{HandlerContext, event::object_created_event, handle};
use crate::metrics::MetricsSnapshot;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Build the webhook router around a shared handler context.
pub fn create_router(context: Arc<HandlerContext>) -> Router {
    Router::new()
        .route("/events", post(receive_event))
        .route("/metrics", get(get_metrics))
        .route("/commands", get(get_commands))
        .with_state(context)
}

async fn receive_event(
    State(context): State<Arc<HandlerContext>>,
    Json(event): Json<Value>,
) -> Response {
    let response = handle(&context, event).await;
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response)).into_response()
}

async fn get_metrics(State(context): State<Arc<HandlerContext>>) -> Json<MetricsSnapshot> {
    Json(context.metrics().snapshot())
}

#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<Value>,
}

#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "events",
                method: "POST",
                path: "/events",
                description: "Download each referenced PDF, chunk and embed it, and insert the records into Milvus. Responds with { \"statusCode\": number, \"body\": string }.",
                request_example: Some(object_created_event("pdf-inbox", "uploads/report.pdf")),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return ingestion counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}
