use crate::agent::{ LeadAgent, WebhookOutcome };
use crate::models::telegram::TelegramUpdate;
use crate::ratelimit::global_limiter;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ Request, State, rejection::JsonRejection },
    middleware::{ self, Next },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use chrono::Utc;
use governor::DefaultDirectRateLimiter;
use serde::{ Deserialize, Serialize };
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error };
use url::Url;

#[derive(Deserialize)]
pub struct AutomateRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Serialize)]
struct ReloadResponse {
    success: bool,
    message: String,
}

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<LeadAgent>,
    limiter: Arc<DefaultDirectRateLimiter>,
}

fn error_response(code: StatusCode, message: &str) -> Response {
    (code, Json(json!({ "error": message }))).into_response()
}

pub fn router(agent: Arc<LeadAgent>, requests_per_second: u32) -> Router {
    let state = AppState {
        agent,
        limiter: Arc::new(global_limiter(requests_per_second)),
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let throttled = Router::new()
        .route("/", get(index_handler))
        .route("/automate", post(automate_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .route("/api/reload-prompts", get(reload_prompts_handler))
        .layer(middleware::from_fn_with_state(state.clone(), throttle));

    // Telegram must always get a 200 {status}; per-chat limits apply there instead
    Router::new()
        .route("/telegram-webhook", post(telegram_webhook_handler))
        .merge(throttled)
        .layer(cors)
        .with_state(state)
}

async fn throttle(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.limiter.check().is_err() {
        warn!("Global request limit exceeded, rejecting {}", request.uri().path());
        return error_response(StatusCode::TOO_MANY_REQUESTS, "Too many requests");
    }
    next.run(request).await
}

async fn index_handler() -> impl IntoResponse {
    Json(json!({
        "agent": "🏥 Healthcare Lead Discovery Agent",
        "workflow": "Telegram → Exa Search → Notion → Telegram Output",
        "endpoints": {
            "/automate": "POST - Process healthcare practice URL",
            "/telegram-webhook": "POST - Telegram bot webhook",
            "/status": "GET - Configuration and counters",
            "/health": "GET - Liveness check",
            "/api/reload-prompts": "GET - Reload the prompt file if it changed"
        }
    }))
}

async fn automate_handler(
    State(state): State<AppState>,
    body: Result<Json<AutomateRequest>, JsonRejection>
) -> Response {
    let raw_url = match body {
        Ok(Json(AutomateRequest { url: Some(url) })) if !url.trim().is_empty() => url,
        Ok(_) => {
            return error_response(StatusCode::BAD_REQUEST, "URL is required");
        }
        Err(e) => {
            warn!("Rejected /automate body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "URL is required");
        }
    };
    let url = match Url::parse(raw_url.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => url,
        _ => {
            return error_response(StatusCode::BAD_REQUEST, "Invalid URL");
        }
    };

    info!("Automation requested for {}", url);
    let agent = Arc::clone(&state.agent);
    match tokio::spawn(async move { agent.automate(&url).await }).await {
        Ok(outcome) =>
            Json(json!({
                "success": true,
                "workflow_type": "3-step-simplified",
                "practice": outcome.lead,
                "notion": {
                    "stored": outcome.storage.success,
                    "lead_id": outcome.storage.lead_id,
                    "url": outcome.storage.url
                }
            })).into_response(),
        Err(e) => {
            error!("Automation failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Automation failed")
        }
    }
}

async fn telegram_webhook_handler(
    State(state): State<AppState>,
    body: Result<Json<TelegramUpdate>, JsonRejection>
) -> impl IntoResponse {
    let outcome = match &body {
        Ok(Json(update)) =>
            match update.chat_text() {
                Some((chat_id, text)) => state.agent.handle_telegram_message(chat_id, text).await,
                None => WebhookOutcome::Ignored,
            }
        Err(e) => {
            warn!("Ignoring unreadable Telegram update: {}", e);
            WebhookOutcome::Ignored
        }
    };
    // Telegram redelivers on anything but 200
    (StatusCode::OK, Json(json!({ "status": outcome })))
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.agent.status().await)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": state.agent.uptime_seconds()
    }))
}

async fn reload_prompts_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.agent.reload_prompts_if_changed().await {
        Ok(reloaded) =>
            (
                StatusCode::OK,
                Json(ReloadResponse {
                    success: true,
                    message: if reloaded { "Prompts reloaded".into() } else { "Prompts unchanged".into() },
                }),
            ),
        Err(e) => {
            error!("Prompt reload failed: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ReloadResponse {
                    success: false,
                    message: format!("Reload error: {}", e),
                }),
            )
        }
    }
}
