// src/services/notification.rs

use rust_decimal::Decimal;
use tokio::sync::mpsc;

/// Messages delivered after the database work that triggers them has committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    OrderConfirmed {
        to_email: String,
        customer_name: String,
        order_number: String,
        amount: Decimal,
    },
}

pub struct EmailService {
    from_email: String,
}

impl EmailService {
    pub fn new(from_email: String) -> Self {
        Self { from_email }
    }

    // Log-only sender. Swap the body for a provider call when one is wired in.
    pub async fn send(&self, notification: &Notification) -> Result<(), anyhow::Error> {
        match notification {
            Notification::OrderConfirmed {
                to_email,
                customer_name,
                order_number,
                amount,
            } => {
                if to_email.is_empty() {
                    anyhow::bail!("order {} has no recipient", order_number);
                }
                tracing::info!(
                    from = %self.from_email,
                    to = %to_email,
                    "Order confirmation for {}: {} paid ₹{} for order {}",
                    order_number,
                    customer_name,
                    amount,
                    order_number
                );
                Ok(())
            }
        }
    }
}

/// Handle to the notification queue. Cloning is cheap; all clones feed the
/// same worker.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Spawns the delivery worker on the current runtime.
    pub fn spawn(email: EmailService) -> Self {
        let (notifier, mut rx) = Self::channel();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                if let Err(e) = email.send(&notification).await {
                    // Delivery failures never touch payment state.
                    tracing::warn!("Failed to deliver {:?}: {}", notification, e);
                }
            }
            tracing::info!("Notification queue closed");
        });

        notifier
    }

    /// Queue without a worker; the caller owns the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            tracing::warn!("Notification queue is closed, dropping {:?}", e.0);
        }
    }
}
