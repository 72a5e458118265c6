//! HTTP routes
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/clients` | Register `{"userAgent", "host"}`, returns `{"id"}` |
//! | `GET` | `/clients` | List registered applications |
//! | `GET` | `/events/{id}` | Attach and stream envelopes |
//! | `POST` | `/events/{id}` | Publish the raw body as an `event` |
//! | `POST` | `/actions/{id}` | Publish the raw body as an `action` |
//!
//! `OPTIONS` on every route answers with an empty 200.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::registry::{AppId, ApplicationRegistry, Envelope, Identity, RegistryError};
use crate::server::config::ServerConfig;
use crate::server::stream::event_stream;

/// Shared state passed to all request handlers
#[derive(Clone)]
struct RelayState {
    registry: Arc<ApplicationRegistry>,
    keep_alive: Option<Duration>,
}

#[derive(Serialize)]
struct RegisterResponse {
    id: AppId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientSummary {
    id: AppId,
    user_agent: String,
    host: String,
    subscribers: usize,
    backlog: usize,
    stalled: bool,
}

#[derive(Serialize)]
struct ClientList {
    clients: Vec<ClientSummary>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Assemble the relay router
pub fn router(registry: Arc<ApplicationRegistry>, config: &ServerConfig) -> Router {
    let state = RelayState {
        registry,
        keep_alive: config.keep_alive,
    };

    let router = Router::new()
        .route(
            "/clients",
            get(list_clients).post(register_client).options(preflight),
        )
        .route(
            "/events/{id}",
            get(stream_events).post(publish_event).options(preflight),
        )
        .route("/actions/{id}", post(publish_action).options(preflight))
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .with_state(state);

    let router = if config.cors {
        router.layer(cors_layer())
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// POST /clients
async fn register_client(
    State(state): State<RelayState>,
    body: Bytes,
) -> Result<Json<RegisterResponse>> {
    let identity: Identity = serde_json::from_slice(&body)?;
    let id = state.registry.register(identity).await;

    Ok(Json(RegisterResponse { id }))
}

/// GET /clients
async fn list_clients(State(state): State<RelayState>) -> Result<Json<ClientList>> {
    let mut clients = Vec::new();

    for app in state.registry.applications().await {
        let stats = app.stats().await?;
        clients.push(ClientSummary {
            id: app.id().clone(),
            user_agent: app.identity().user_agent.clone(),
            host: app.identity().host.clone(),
            subscribers: stats.subscriber_count,
            backlog: stats.max_backlog,
            stalled: stats.is_stalled(),
        });
    }

    Ok(Json(ClientList { clients }))
}

/// GET /events/{id}
async fn stream_events(
    State(state): State<RelayState>,
    Path(id): Path<AppId>,
) -> Result<impl IntoResponse> {
    let subscription = state.registry.attach(&id).await?;

    Ok(event_stream(subscription, state.keep_alive))
}

/// POST /events/{id}
async fn publish_event(
    State(state): State<RelayState>,
    Path(id): Path<AppId>,
    body: Bytes,
) -> Result<StatusCode> {
    state.registry.publish(&id, Envelope::event(body)).await?;
    Ok(StatusCode::OK)
}

/// POST /actions/{id}
async fn publish_action(
    State(state): State<RelayState>,
    Path(id): Path<AppId>,
    body: Bytes,
) -> Result<StatusCode> {
    state.registry.publish(&id, Envelope::action(body)).await?;
    Ok(StatusCode::OK)
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Registry(RegistryError::ApplicationNotFound(_)) => StatusCode::NOT_FOUND,
            Error::MalformedRegistration(_) => StatusCode::BAD_REQUEST,
            Error::Registry(RegistryError::DispatcherClosed(_)) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        tracing::warn!(status = %status, error = %self, "Request failed");

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
