//! `POST /api/v1/webhooks/:job_id`, always answered with 200 and an ack body

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::Value;

use super::commands::{receive, ReceiveWebhookCommand, WebhookAck};
use crate::features::FeatureState;

pub fn webhooks_routes() -> Router<FeatureState> {
    Router::new().route("/:job_id", post(receive_webhook))
}

/// The raw body is taken instead of `Json` so a bad content type or
/// malformed body is still acknowledged and audited.
async fn receive_webhook(
    State(state): State<FeatureState>,
    Path(job_id): Path<String>,
    body: Bytes,
) -> (StatusCode, Json<WebhookAck>) {
    tracing::info!(job_id = %job_id, bytes = body.len(), "Webhook received");

    let payload = parse_payload(&body);
    let ack = receive::handle(
        state.db.clone(),
        state.queue.as_ref(),
        ReceiveWebhookCommand { job_id, payload },
    )
    .await;

    (StatusCode::OK, Json(ack))
}

/// Non-JSON bodies are kept verbatim as a JSON string
fn parse_payload(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload(br#"[{"type":"SWAP"}]"#), json!([{ "type": "SWAP" }]));
        assert_eq!(parse_payload(b"not json"), json!("not json"));
        assert_eq!(parse_payload(b""), Value::Null);
    }
}
