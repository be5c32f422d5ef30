//! Customer and merchant notifications, driven by engine events.
//!
//! The engine only defines what gets sent and when. How a mail is actually delivered is up to the [`Mailer`]
//! implementation supplied by the server.
use std::{future::Future, pin::Pin, sync::Arc};

use futures_util::future::BoxFuture;
use log::*;
use thiserror::Error;

use crate::{
    db_types::{Order, Transaction},
    events::{EventHandlers, EventHooks, PaymentCompletedEvent, RefundIssuedEvent},
};

#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("The mail could not be delivered. {0}")]
    DeliveryFailed(String),
    #[error("The mailer is not configured correctly. {0}")]
    Configuration(String),
}

#[cfg_attr(test, mockall::automock)]
pub trait Mailer: Send + Sync {
    /// Tells the customer their payment went through.
    fn order_confirmation_mail(
        &self,
        order: &Order,
        transaction: &Transaction,
    ) -> BoxFuture<'static, Result<(), MailerError>>;

    /// Tells the merchant a paid order is waiting to be fulfilled.
    fn order_received_mail(
        &self,
        order: &Order,
        transaction: &Transaction,
    ) -> BoxFuture<'static, Result<(), MailerError>>;
}

/// Sends both notification mails for a completed payment. Failures are logged and never propagate: the payment has
/// already been committed by the time this runs.
pub async fn notify_payment_completed(mailer: &dyn Mailer, event: &PaymentCompletedEvent) {
    let PaymentCompletedEvent { order, transaction } = event;
    match mailer.order_confirmation_mail(order, transaction).await {
        Ok(()) => info!("📧️ Order confirmation for order {} sent to {}", order.id, order.email),
        Err(e) => error!("📧️ Could not send the order confirmation for order {} to {}. {e}", order.id, order.email),
    }
    match mailer.order_received_mail(order, transaction).await {
        Ok(()) => debug!("📧️ Merchant notified of paid order {}", order.id),
        Err(e) => error!("📧️ Could not notify the merchant of paid order {}. {e}", order.id),
    }
}

pub fn notification_hooks(mailer: Arc<dyn Mailer>) -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_payment_completed(move |ev: PaymentCompletedEvent| {
        let mailer = Arc::clone(&mailer);
        Box::pin(async move {
            notify_payment_completed(mailer.as_ref(), &ev).await;
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_refund_issued(|ev: RefundIssuedEvent| {
        Box::pin(async move {
            let tx = ev.transaction;
            info!("💸️ Refund {} of {} {} issued against order {}", tx.id, tx.amount, tx.currency, tx.order_id);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}

pub fn create_notification_handlers(mailer: Arc<dyn Mailer>, buffer_size: usize) -> EventHandlers {
    EventHandlers::new(buffer_size, notification_hooks(mailer))
}
