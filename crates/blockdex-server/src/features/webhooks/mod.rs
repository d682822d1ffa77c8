//! Webhook ingestion gateway and audit log

pub mod commands;
pub mod routes;

pub use commands::{ReceiveWebhookCommand, WebhookAck};
pub use routes::webhooks_routes;
