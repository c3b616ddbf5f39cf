//! Outbound SMS and email. No provider is wired in; messages are logged.

use aarakshan_core::{Dispatcher, Outbound};
use tracing::info;

/// Logs every outbound message and reports it as sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

impl Dispatcher for TracingDispatcher {
    fn dispatch(&self, message: &Outbound) -> bool {
        match message {
            Outbound::Sms { phone, text } => {
                info!(channel = "sms", to = %phone, chars = text.chars().count(), "outbound message");
            }
            Outbound::Email { to, subject, .. } => {
                info!(channel = "email", to = %to, subject = %subject, "outbound message");
            }
        }
        true
    }
}
