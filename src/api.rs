//! HTTP API server for the operator dashboard and the Telegram webhook.
//!
//! Every handler is a one-shot relay to the Bot API. Errors are converted at
//! this boundary into `{ok: false, error}` with a status derived from the
//! error kind.

use crate::dashboard;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use hostbot_core::config::{CommandReplies, ServerConfig};
use hostbot_core::error::HostbotError;
use hostbot_telegram::{BotApi, ChatId, Update, WebhookReceiver, SECRET_HEADER};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Shared state for API handlers. Immutable; cloned per request.
#[derive(Clone)]
pub struct ApiState {
    api: Arc<BotApi>,
    receiver: Arc<WebhookReceiver>,
    uptime: Instant,
}

impl ApiState {
    pub fn new(api: Arc<BotApi>, replies: CommandReplies) -> Self {
        let receiver = Arc::new(WebhookReceiver::new(Arc::clone(&api), replies));
        Self {
            api,
            receiver,
            uptime: Instant::now(),
        }
    }
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// `POST /api/send-message` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageBody {
    chat_id: Option<ChatId>,
    text: Option<String>,
    parse_mode: Option<String>,
    disable_notification: Option<bool>,
}

/// `POST /api/set-webhook` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetWebhookBody {
    url: Option<String>,
    secret_token: Option<String>,
    drop_pending_updates: Option<bool>,
}

/// `DELETE /api/set-webhook` body. Optional as a whole.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteWebhookBody {
    drop_pending_updates: Option<bool>,
}

fn failure_label(err: &HostbotError) -> &'static str {
    match err {
        HostbotError::Validation(_) | HostbotError::Auth(_) => "request rejected",
        HostbotError::Config(_) => "request failed",
        HostbotError::Relay(_) => "relay failed",
    }
}

fn error_response(err: HostbotError) -> (StatusCode, Json<Value>) {
    let status = match err {
        HostbotError::Validation(_) => StatusCode::BAD_REQUEST,
        HostbotError::Auth(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let label = failure_label(&err);
    if err.is_client_error() {
        warn!("{label} ({status}): {err}");
    } else {
        error!("{label} ({status}): {err}");
    }
    (status, Json(json!({"ok": false, "error": err.to_string()})))
}

/// Body extraction failures (over the size limit, aborted upload) in the
/// same `{ok: false, error}` shape as every other error.
fn rejection_response(rejection: BytesRejection) -> (StatusCode, Json<Value>) {
    let status = rejection.status();
    let error = rejection.body_text();
    warn!("request rejected ({status}): {error}");
    (status, Json(json!({"ok": false, "error": error})))
}

fn parse_body<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
) -> Result<T, (StatusCode, Json<Value>)> {
    let body = body.map_err(rejection_response)?;
    serde_json::from_slice(&body)
        .map_err(|e| error_response(HostbotError::Validation(format!("invalid request: {e}"))))
}

/// `GET /api/health`: uptime probe.
async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime.elapsed().as_secs(),
    }))
}

/// `POST /api/send-message`: send a test message.
async fn send_message(
    State(state): State<ApiState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let request: SendMessageBody = parse_body(body)?;

    let message_id = state
        .api
        .send_message(
            &request.chat_id.unwrap_or_default(),
            request.text.as_deref().unwrap_or_default(),
            request.parse_mode.as_deref(),
            request.disable_notification,
        )
        .await
        .map_err(error_response)?;

    Ok(Json(json!({"ok": true, "messageId": message_id})))
}

/// `POST /api/set-webhook`: register the webhook URL.
async fn set_webhook(
    State(state): State<ApiState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let request: SetWebhookBody = parse_body(body)?;

    state
        .api
        .set_webhook(
            request.url.as_deref().unwrap_or_default(),
            request.secret_token.as_deref(),
            request.drop_pending_updates,
        )
        .await
        .map_err(error_response)?;

    Ok(Json(json!({"ok": true})))
}

/// `DELETE /api/set-webhook`: remove the webhook. A missing or malformed
/// body means no options.
async fn delete_webhook(
    State(state): State<ApiState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let body = body.map_err(rejection_response)?;
    let request: DeleteWebhookBody = if body.is_empty() {
        DeleteWebhookBody::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            debug!("ignoring unparseable delete-webhook body: {e}");
            DeleteWebhookBody::default()
        })
    };

    state
        .api
        .delete_webhook(request.drop_pending_updates)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({"ok": true})))
}

/// `GET /api/telegram-status`: bot identity for the status card.
async fn telegram_status(State(state): State<ApiState>) -> ApiResult {
    let info = state.api.get_me().await.map_err(error_response)?;
    Ok(Json(json!({"ok": true, "info": info})))
}

/// `POST /api/webhook`: called by Telegram.
///
/// Only a secret mismatch is reported; everything past that point, including
/// an oversized or unparseable body, is acknowledged with `{ok: true}` so
/// Telegram does not redeliver.
async fn webhook(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let header = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    state.receiver.verify(header).map_err(error_response)?;

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(
                "webhook: unreadable update acknowledged ({}): {}",
                rejection.status(),
                rejection.body_text()
            );
            return Ok(Json(json!({"ok": true})));
        }
    };

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            state.receiver.handle(&update).await;
        }
        Err(e) => warn!("webhook: unparseable update acknowledged: {e}"),
    }

    Ok(Json(json!({"ok": true})))
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/api/health", get(health))
        .route("/api/send-message", post(send_message))
        .route("/api/set-webhook", post(set_webhook).delete(delete_webhook))
        .route("/api/telegram-status", get(telegram_status))
        .route("/api/webhook", post(webhook))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let app = build_router(state, config.body_limit_bytes);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;

    info!("hostbot listening on http://{addr}");
    info!("   Dashboard: http://{addr}/");
    info!("   Webhook:   http://{addr}/api/webhook");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("hostbot stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
