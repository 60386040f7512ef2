//! Order status notification delivery
//!
//! Drains the event channel and forwards a human-readable message to the
//! configured notifier. Delivery errors are logged and dropped; the
//! scheduler never waits on this path.

use crate::events::OrderStatusEvent;
use crate::logger::{self, LogTag};
use crate::types::OrderStatus;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, message: &str) -> Result<(), String>;
}

/// Format the user-facing message for a status change.
pub fn format_status_message(event: &OrderStatusEvent) -> String {
    match event.status {
        OrderStatus::Pending => format!("Order {} is now PENDING.", event.order_id),
        OrderStatus::Processing => format!("Order {} is being PROCESSED.", event.order_id),
        OrderStatus::Completed => {
            format!("Order {} has been COMPLETED successfully!", event.order_id)
        }
        OrderStatus::Cancelled => format!("Order {} has been CANCELLED.", event.order_id),
        OrderStatus::Failed => format!("Order {} FAILED.", event.order_id),
        OrderStatus::Expired => format!("Order {} has EXPIRED.", event.order_id),
    }
}

/// Notifier that only writes to the log. Used when no Telegram token is
/// configured and in tests.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, message: &str) -> Result<(), String> {
        logger::info(LogTag::Notify, &format!("[{}] {}", recipient, message));
        Ok(())
    }
}

/// Telegram bot-API notifier.
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token: bot_token.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, recipient: &str, message: &str) -> Result<(), String> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": recipient,
                "text": message,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("telegram API returned HTTP {}", response.status()));
        }
        Ok(())
    }
}

/// Consume status events until the channel closes.
pub async fn run_notification_loop(
    mut rx: mpsc::UnboundedReceiver<OrderStatusEvent>,
    notifier: Arc<dyn Notifier>,
) {
    logger::info(LogTag::Notify, "Notification consumer started");
    while let Some(event) = rx.recv().await {
        let Some(recipient) = event.owner_ref.clone() else {
            logger::debug(
                LogTag::Notify,
                &format!("No recipient for order {}, skipping", event.order_id),
            );
            continue;
        };
        let message = format_status_message(&event);
        if let Err(e) = notifier.notify(&recipient, &message).await {
            logger::warning(
                LogTag::Notify,
                &format!("Failed to notify {} for order {}: {}", recipient, event.order_id, e),
            );
        }
    }
    logger::info(LogTag::Notify, "Notification consumer stopped");
}
