pub mod receive;
pub mod record_event;

pub use receive::{ReceiveWebhookCommand, WebhookAck};
pub use record_event::{RecordEventCommand, RecordEventError};
