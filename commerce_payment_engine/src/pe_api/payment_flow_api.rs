use std::{fmt::Debug, sync::Arc};

use cpg_common::MinorUnits;
use log::*;
use serde_json::json;

use crate::{
    db::traits::{LedgerTransaction, PaymentLedger},
    db_types::{NewHook, NewTransaction, Order, PaymentState, Settlement, Transaction, TransactionType},
    events::{EventProducers, PaymentCompletedEvent, RefundIssuedEvent},
    pe_api::{
        access_control::{AccessControl, Caller},
        errors::PaymentApiError,
        payment_objects::{ChargeCredentials, PaymentRequest, RefundRequest},
    },
    providers::{ChargeProvider, ChargeProviders, ProviderError},
};

pub const PAYMENT_HOOK_EVENT: &str = "payment";
pub const REFUND_HOOK_EVENT: &str = "refund";

/// Where webhook records for each kind of financial event should be delivered. An unset target means no record is
/// written for that kind of event.
#[derive(Debug, Clone, Default)]
pub struct WebhookTargets {
    pub payment: Option<String>,
    pub refund: Option<String>,
}

impl WebhookTargets {
    pub fn new(payment: Option<String>, refund: Option<String>) -> Self {
        Self { payment, refund }
    }
}

/// `PaymentFlowApi` runs the money-moving workflows: charging an order and refunding a charge.
///
/// Both workflows follow the same shape. Every precondition is checked inside a single ledger transaction, a
/// `pending` record of the attempt is written, the gateway is called, the outcome is recorded and the ledger
/// transaction is committed whether or not the gateway call succeeded. A precondition failure rolls everything back.
///
/// The gateway call happens while the ledger transaction is open. If the process dies after the gateway has taken the
/// money but before the commit, the local record of the charge is lost.
pub struct PaymentFlowApi<B> {
    db: B,
    providers: ChargeProviders,
    access: AccessControl,
    webhooks: WebhookTargets,
    producers: EventProducers,
}

impl<B> Debug for PaymentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi ({:?})", self.providers)
    }
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B, providers: ChargeProviders, producers: EventProducers) -> Self {
        Self { db, providers, access: AccessControl::default(), webhooks: WebhookTargets::default(), producers }
    }

    pub fn with_access_control(mut self, access: AccessControl) -> Self {
        self.access = access;
        self
    }

    pub fn with_webhooks(mut self, webhooks: WebhookTargets) -> Self {
        self.webhooks = webhooks;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PaymentFlowApi<B>
where B: PaymentLedger
{
    /// Charges an order.
    ///
    /// On success the returned transaction is `paid` and the order has moved to `paid`. If the gateway rejects the
    /// charge, the failed attempt is still committed and [`PaymentApiError::ProviderError`] is returned.
    pub async fn create_payment(
        &self,
        caller: Option<&Caller>,
        request: PaymentRequest,
    ) -> Result<Transaction, PaymentApiError> {
        let credentials = request.credentials().ok_or_else(|| {
            PaymentApiError::InvalidRequest(
                "A card token, or both a wallet payment id and a payer id, must be supplied".to_string(),
            )
        })?;
        let provider = self.provider_for(&credentials)?;
        let mut tx = self.db.begin().await.map_err(PaymentApiError::database)?;
        let order = match check_payable(&mut tx, caller, &request).await {
            Ok(order) => order,
            Err(e) => return Err(abort(tx, e).await),
        };
        let order_id = order.id;
        trace!("💳️ Order {order_id} passed all payment checks. Recording the charge attempt.");
        let new_charge = NewTransaction::charge(&order, request.amount, &request.currency);
        let pending = match tx.insert_transaction(new_charge).await {
            Ok(t) => t,
            Err(e) => return Err(abort(tx, PaymentApiError::database(e)).await),
        };
        let charge_request = credentials.into_charge_request(request.amount, &request.currency);
        let outcome = provider.charge(charge_request).await;
        let recorded = self.record_charge(&mut tx, order, &pending, &provider, outcome).await;
        let (transaction, order, failure) = match recorded {
            Ok(result) => result,
            Err(e) => return Err(abort(tx, e).await),
        };
        if let Err(e) = tx.commit().await {
            if failure.is_none() {
                error!(
                    "💳️ The gateway accepted charge {} for order {order_id}, but the ledger could not commit it. The \
                     customer has been charged without a local record. {e}",
                    transaction.id
                );
            }
            return Err(PaymentApiError::database(e));
        }
        match failure {
            None => {
                info!("💳️ Order {order_id} paid with charge {} via {}", transaction.id, provider.processor());
                self.call_payment_completed_hook(order, transaction.clone());
                Ok(transaction)
            },
            Some(e) => {
                warn!("💳️ Charge {} for order {order_id} failed. {e}", transaction.id);
                Err(e.into())
            },
        }
    }

    /// Refunds part or all of a paid charge. Administrators only.
    pub async fn refund_payment(
        &self,
        caller: Option<&Caller>,
        request: RefundRequest,
    ) -> Result<Transaction, PaymentApiError> {
        let admin = self.access.require_admin(caller)?;
        debug!("💸️ {} requested a refund of {} against {}", admin.subject_id, request.amount, request.transaction_id);
        let mut tx = self.db.begin().await.map_err(PaymentApiError::database)?;
        let (original, provider) = match self.check_refundable(&mut tx, &request).await {
            Ok(checked) => checked,
            Err(e) => return Err(abort(tx, e).await),
        };
        let charge_reference = match original.processor_id.clone() {
            Some(r) => r,
            None => {
                let e = PaymentApiError::InternalInconsistency(format!(
                    "Charge {} is paid but has no gateway reference",
                    original.id
                ));
                return Err(abort(tx, e).await);
            },
        };
        let pending = match tx.insert_transaction(NewTransaction::refund(&original, request.amount)).await {
            Ok(t) => t,
            Err(e) => return Err(abort(tx, PaymentApiError::database(e)).await),
        };
        let outcome = provider.refund(request.amount, charge_reference).await;
        let failure = outcome.as_ref().err().cloned();
        let refund = match self.record_refund(&mut tx, &pending, outcome).await {
            Ok(t) => t,
            Err(e) => return Err(abort(tx, e).await),
        };
        tx.commit().await.map_err(PaymentApiError::database)?;
        match failure {
            None => {
                info!("💸️ Refund {} of {} issued against charge {}", refund.id, refund.amount, original.id);
                self.call_refund_issued_hook(refund.clone());
                Ok(refund)
            },
            Some(e) => {
                warn!("💸️ Refund {} against charge {} failed. {e}", refund.id, original.id);
                Err(e.into())
            },
        }
    }

    fn provider_for(&self, credentials: &ChargeCredentials) -> Result<Arc<dyn ChargeProvider>, PaymentApiError> {
        match credentials {
            ChargeCredentials::Card { .. } => Ok(Arc::clone(self.providers.card())),
            ChargeCredentials::Wallet { .. } => self.providers.wallet().cloned().ok_or_else(|| {
                PaymentApiError::InvalidRequest("Wallet payments are not enabled on this server".to_string())
            }),
        }
    }

    /// Settles the pending charge, marks the order as paid on success and writes the payment webhook record.
    /// Returns the settled charge, the order as it now stands and the gateway failure, if there was one.
    async fn record_charge(
        &self,
        tx: &mut B::Tx,
        order: Order,
        pending: &Transaction,
        provider: &Arc<dyn ChargeProvider>,
        outcome: Result<String, ProviderError>,
    ) -> Result<(Transaction, Order, Option<ProviderError>), PaymentApiError> {
        let (settlement, failure) = settlement_for(outcome);
        let transaction = tx.settle_transaction(&pending.id, &settlement).await.map_err(PaymentApiError::database)?;
        let order = if failure.is_none() {
            let processor = provider.processor();
            let marked = tx.mark_order_paid(order.id, processor).await.map_err(PaymentApiError::database)?;
            if !marked {
                error!(
                    "💳️ Order {} was already paid when charge {} completed. The customer has probably been charged \
                     twice and charge {} should be refunded.",
                    order.id, transaction.id, transaction.id
                );
            }
            let fallback = Order { payment_state: PaymentState::Paid, payment_processor: Some(processor), ..order };
            tx.fetch_order(fallback.id).await.map_err(PaymentApiError::database)?.unwrap_or(fallback)
        } else {
            order
        };
        if let Some(url) = &self.webhooks.payment {
            let payload = json!({ "order": order, "transaction": transaction });
            let hook = NewHook::new(PAYMENT_HOOK_EVENT, url.as_str(), order.user_id.as_str(), payload);
            let id = tx.insert_hook(hook).await.map_err(PaymentApiError::database)?;
            trace!("💳️ Payment webhook record #{id} created for order {}", order.id);
        }
        Ok((transaction, order, failure))
    }

    async fn record_refund(
        &self,
        tx: &mut B::Tx,
        pending: &Transaction,
        outcome: Result<String, ProviderError>,
    ) -> Result<Transaction, PaymentApiError> {
        let (settlement, _) = settlement_for(outcome);
        let refund = tx.settle_transaction(&pending.id, &settlement).await.map_err(PaymentApiError::database)?;
        if let Some(url) = &self.webhooks.refund {
            let payload = json!({ "transaction": refund });
            let hook = NewHook::new(REFUND_HOOK_EVENT, url.as_str(), refund.user_id.as_str(), payload);
            let id = tx.insert_hook(hook).await.map_err(PaymentApiError::database)?;
            trace!("💸️ Refund webhook record #{id} created for refund {}", refund.id);
        }
        Ok(refund)
    }

    async fn check_refundable(
        &self,
        tx: &mut B::Tx,
        request: &RefundRequest,
    ) -> Result<(Transaction, Arc<dyn ChargeProvider>), PaymentApiError> {
        let original = tx
            .fetch_transaction(&request.transaction_id)
            .await
            .map_err(PaymentApiError::database)?
            .ok_or_else(|| PaymentApiError::NotFound(format!("Transaction {}", request.transaction_id)))?;
        if original.currency != request.currency {
            return Err(PaymentApiError::InvalidRequest(format!(
                "Refund currency {} does not match the charge currency {}",
                request.currency, original.currency
            )));
        }
        if !request.amount.is_positive() || request.amount > original.amount {
            return Err(PaymentApiError::InvalidRequest(format!(
                "The refund amount must be greater than zero and at most {}",
                original.amount
            )));
        }
        if original.is_failed() {
            let msg = format!("Transaction {} failed and cannot be refunded", original.id);
            return Err(PaymentApiError::InvalidState(msg));
        }
        if !original.is_paid() {
            return Err(PaymentApiError::InvalidState(format!("Transaction {} has not been paid", original.id)));
        }
        if original.tx_type != TransactionType::Charge {
            return Err(PaymentApiError::InvalidRequest(format!("Transaction {} is not a charge", original.id)));
        }
        let order = tx
            .fetch_order(original.order_id)
            .await
            .map_err(PaymentApiError::database)?
            .ok_or_else(|| {
                PaymentApiError::InternalInconsistency(format!(
                    "Charge {} belongs to order {}, which does not exist",
                    original.id, original.order_id
                ))
            })?;
        let provider = self
            .providers
            .for_processor(order.payment_processor)
            .filter(|p| p.supports_refunds())
            .cloned()
            .ok_or_else(|| {
                let processor = order.payment_processor.map(|p| p.to_string()).unwrap_or_else(|| "unknown".into());
                PaymentApiError::Unsupported(format!("Refunds are not supported for {processor} payments"))
            })?;
        let refunded = tx.refunded_total(order.id).await.map_err(PaymentApiError::database)?;
        let remaining = refundable_balance(&original, refunded);
        if request.amount > remaining {
            return Err(PaymentApiError::InvalidRequest(format!(
                "Only {remaining} of charge {} remains refundable ({refunded} already refunded)",
                original.id
            )));
        }
        Ok((original, provider))
    }

    fn call_payment_completed_hook(&self, order: Order, transaction: Transaction) {
        for emitter in &self.producers.payment_completed_producer {
            debug!("💳️ Notifying payment completed hook subscribers");
            emitter.try_publish_event(PaymentCompletedEvent::new(order.clone(), transaction.clone()));
        }
    }

    fn call_refund_issued_hook(&self, refund: Transaction) {
        for emitter in &self.producers.refund_issued_producer {
            debug!("💸️ Notifying refund issued hook subscribers");
            emitter.try_publish_event(RefundIssuedEvent::new(refund.clone()));
        }
    }
}

/// Runs the charge preconditions in order and returns the order as it stands after any ownership claim.
async fn check_payable<T: LedgerTransaction>(
    tx: &mut T,
    caller: Option<&Caller>,
    request: &PaymentRequest,
) -> Result<Order, PaymentApiError> {
    let mut order = tx
        .fetch_order(request.order_id)
        .await
        .map_err(PaymentApiError::database)?
        .ok_or_else(|| PaymentApiError::NotFound(format!("Order {}", request.order_id)))?;
    if order.is_paid() {
        return Err(PaymentApiError::InvalidState(format!("Order {} has already been paid", order.id)));
    }
    if order.currency != request.currency {
        return Err(PaymentApiError::InvalidRequest(format!(
            "Currency mismatch. The order is in {}, but the payment is in {}",
            order.currency, request.currency
        )));
    }
    match (order.is_anonymous(), caller) {
        (true, Some(caller)) => {
            tx.assign_order_owner(order.id, &caller.subject_id).await.map_err(PaymentApiError::database)?;
            debug!("💳️ Order {} claimed by {}", order.id, caller.subject_id);
            order.user_id = caller.subject_id.clone();
        },
        (true, None) => trace!("💳️ Order {} is being paid anonymously", order.id),
        (false, Some(caller)) if caller.subject_id == order.user_id => {},
        (false, _) => {
            return Err(PaymentApiError::Unauthorized(format!("Order {} belongs to another user", order.id)));
        },
    }
    if request.amount != order.total {
        error!(
            "💳️ The client tried to pay {} for order {}, but the order total is {}. Either the client and server \
             disagree on how totals are computed, or the request was tampered with.",
            request.amount, order.id, order.total
        );
        return Err(PaymentApiError::InternalInconsistency(format!(
            "The payment amount {} does not match the order total {}",
            request.amount, order.total
        )));
    }
    Ok(order)
}

fn settlement_for(outcome: Result<String, ProviderError>) -> (Settlement, Option<ProviderError>) {
    match outcome {
        Ok(processor_id) => (Settlement::Paid { processor_id }, None),
        Err(e) => (Settlement::Failed { code: e.failure_code(), description: e.to_string() }, Some(e)),
    }
}

/// Rolls back the ledger transaction and hands back the error that caused it.
async fn abort<T: LedgerTransaction>(tx: T, e: PaymentApiError) -> PaymentApiError {
    if let Err(rollback_err) = tx.rollback().await {
        error!("🗃️ Could not roll back the ledger transaction after \"{e}\". {rollback_err}");
    }
    e
}

/// The amount of a charge that may still be refunded.
pub fn refundable_balance(charge: &Transaction, refunded: MinorUnits) -> MinorUnits {
    charge.amount - refunded
}
