use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use cutquote_agent::{deliver_all, DialogueEngine, MessageSender};
use cutquote_core::domain::session::ContactId;
use cutquote_core::errors::InterfaceError;

#[derive(Clone)]
pub struct WebhookState {
    pub engine: Arc<DialogueEngine>,
    pub sender: Arc<dyn MessageSender>,
}

/// Inbound gateway payload. `from` carries the contact, optionally suffixed with `@<domain>`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InboundMessage {
    pub from: Option<String>,
    pub body: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub status: &'static str,
    pub correlation_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WebhookError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/webhook", post(receive)).with_state(state)
}

/// Contact id and trimmed text, or `None` when either field is missing or blank.
pub fn parse_inbound(payload: &InboundMessage) -> Option<(ContactId, String)> {
    let from = payload.from.as_deref()?;
    let contact = from.split('@').next().unwrap_or_default().trim();
    let text = payload.body.as_deref()?.trim();
    if contact.is_empty() || text.is_empty() {
        return None;
    }
    Some((ContactId::from(contact), text.to_string()))
}

/// Acknowledges immediately and runs the turn on its own task; replies go out through the
/// configured sender once the turn completes.
pub async fn receive(
    State(state): State<WebhookState>,
    Json(payload): Json<InboundMessage>,
) -> Result<(StatusCode, Json<Accepted>), (StatusCode, Json<WebhookError>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let Some((contact, text)) = parse_inbound(&payload) else {
        let error = InterfaceError::BadRequest {
            message: "`from` and a non-blank `body` are required".to_string(),
            correlation_id,
        };
        warn!(
            event_name = "webhook.rejected",
            correlation_id = %error.correlation_id(),
            error = %error,
            "inbound message rejected"
        );
        let body = WebhookError {
            error: error.user_message().to_string(),
            correlation_id: error.correlation_id().to_string(),
        };
        return Err((StatusCode::BAD_REQUEST, Json(body)));
    };

    info!(
        event_name = "webhook.received",
        correlation_id = %correlation_id,
        contact_id = %contact,
        "inbound message accepted"
    );
    tokio::spawn(process(state, contact, text));

    Ok((StatusCode::ACCEPTED, Json(Accepted { status: "accepted", correlation_id })))
}

pub async fn process(state: WebhookState, contact: ContactId, text: String) {
    let outcome = state.engine.handle_message(&contact, &text).await;
    let delivered = deliver_all(state.sender.as_ref(), &contact, &outcome.replies).await;
    info!(
        event_name = "webhook.replied",
        contact_id = %contact,
        replies = outcome.replies.len(),
        delivered,
        "turn replies dispatched"
    );
}
