//! [`Mailer`] implementations for order notifications.
//!
//! Mail templates live with the relay service. This server only tells the relay which template to use and supplies
//! the order details.
use std::sync::Arc;

use commerce_payment_engine::{
    db_types::{Order, Transaction},
    notifications::{Mailer, MailerError},
};
use cpg_common::Secret;
use futures::future::BoxFuture;
use log::*;
use reqwest::{header::AUTHORIZATION, Client};
use serde::Serialize;

use crate::config::MailerConfig;

pub const ORDER_CONFIRMATION_TEMPLATE: &str = "order_confirmation";
pub const ORDER_RECEIVED_TEMPLATE: &str = "order_received";

/// Builds the mailer for the given configuration. Without a relay URL, mails are logged and dropped.
pub fn mailer_from_config(config: &MailerConfig) -> Result<Arc<dyn Mailer>, MailerError> {
    match &config.relay_url {
        Some(_) => Ok(Arc::new(HttpMailer::new(config)?)),
        None => Ok(Arc::new(LoggingMailer)),
    }
}

#[derive(Debug, Clone, Serialize)]
struct MailRequest {
    template: &'static str,
    to: String,
    subject: String,
    order_id: i64,
    transaction_id: String,
    amount: String,
    currency: String,
}

impl MailRequest {
    fn new(template: &'static str, to: String, subject: String, order: &Order, transaction: &Transaction) -> Self {
        Self {
            template,
            to,
            subject,
            order_id: order.id,
            transaction_id: transaction.id.clone(),
            amount: transaction.amount.to_decimal_string(),
            currency: transaction.currency.clone(),
        }
    }
}

//-------------------------------------------------  HttpMailer  -------------------------------------------------------
/// Posts mail requests as JSON to a mail relay.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    url: String,
    api_key: Secret<String>,
    admin_email: Option<String>,
    confirmation_subject: String,
}

impl HttpMailer {
    pub fn new(config: &MailerConfig) -> Result<Self, MailerError> {
        let url = config
            .relay_url
            .clone()
            .ok_or_else(|| MailerError::Configuration("No mail relay URL has been configured".to_string()))?;
        let client = Client::builder().build().map_err(|e| MailerError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            admin_email: config.admin_email.clone(),
            confirmation_subject: config.confirmation_subject.clone(),
        })
    }

    fn send(&self, request: MailRequest) -> BoxFuture<'static, Result<(), MailerError>> {
        let client = self.client.clone();
        let url = self.url.clone();
        let api_key = self.api_key.clone();
        Box::pin(async move {
            trace!("📧️ Sending {} mail for order {} to the relay", request.template, request.order_id);
            let mut builder = client.post(&url).json(&request);
            if !api_key.is_empty() {
                builder = builder.header(AUTHORIZATION, format!("Bearer {}", api_key.reveal()));
            }
            let response = builder.send().await.map_err(|e| MailerError::DeliveryFailed(e.to_string()))?;
            let status = response.status();
            if status.is_success() {
                debug!("📧️ Relay accepted the {} mail for order {}", request.template, request.order_id);
                Ok(())
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(MailerError::DeliveryFailed(format!("The mail relay responded with {status}. {body}")))
            }
        })
    }
}

impl Mailer for HttpMailer {
    fn order_confirmation_mail(
        &self,
        order: &Order,
        transaction: &Transaction,
    ) -> BoxFuture<'static, Result<(), MailerError>> {
        let subject = self.confirmation_subject.clone();
        let request = MailRequest::new(ORDER_CONFIRMATION_TEMPLATE, order.email.clone(), subject, order, transaction);
        self.send(request)
    }

    fn order_received_mail(
        &self,
        order: &Order,
        transaction: &Transaction,
    ) -> BoxFuture<'static, Result<(), MailerError>> {
        let to = match &self.admin_email {
            Some(email) => email.clone(),
            None => {
                return Box::pin(async {
                    Err(MailerError::Configuration("No merchant address has been configured".to_string()))
                })
            },
        };
        let subject = format!("Order {} has been paid", order.id);
        self.send(MailRequest::new(ORDER_RECEIVED_TEMPLATE, to, subject, order, transaction))
    }
}

//-------------------------------------------------  LoggingMailer  ----------------------------------------------------
/// Stands in for a real mailer during development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMailer;

impl Mailer for LoggingMailer {
    fn order_confirmation_mail(
        &self,
        order: &Order,
        transaction: &Transaction,
    ) -> BoxFuture<'static, Result<(), MailerError>> {
        info!(
            "📧️ [not sent] Order confirmation to {} for order {}: {} {}",
            order.email, order.id, transaction.amount, transaction.currency
        );
        Box::pin(async { Ok(()) })
    }

    fn order_received_mail(
        &self,
        order: &Order,
        transaction: &Transaction,
    ) -> BoxFuture<'static, Result<(), MailerError>> {
        info!("📧️ [not sent] Order {} received. Payment {}", order.id, transaction.id);
        Box::pin(async { Ok(()) })
    }
}
