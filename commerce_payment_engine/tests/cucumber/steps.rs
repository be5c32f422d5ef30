use commerce_payment_engine::{
    db_types::{NewLineItem, NewOrder, PaymentState, TransactionStatus, TransactionType},
    test_utils::fixtures::{admin, customer},
    Caller,
    PaymentApiError,
    PaymentQueries,
    PaymentQueryFilter,
    PaymentRequest,
    RefundRequest,
};
use cpg_common::MinorUnits;
use cucumber::{given, then, when};

use crate::cucumber::PaymentsWorld;

fn error_kind(e: &PaymentApiError) -> &'static str {
    match e {
        PaymentApiError::InvalidRequest(_) => "InvalidRequest",
        PaymentApiError::Unauthenticated => "Unauthenticated",
        PaymentApiError::Unauthorized(_) => "Unauthorized",
        PaymentApiError::NotFound(_) => "NotFound",
        PaymentApiError::InvalidState(_) => "InvalidState",
        PaymentApiError::Unsupported(_) => "Unsupported",
        PaymentApiError::ProviderError(_) => "ProviderError",
        PaymentApiError::InternalInconsistency(_) => "InternalInconsistency",
        PaymentApiError::DatabaseError(_) => "DatabaseError",
    }
}

/// `anonymous` means no identity, `admin` the administrator, anything else a customer with that id.
fn caller_named(name: &str) -> Option<Caller> {
    match name {
        "anonymous" => None,
        "admin" => Some(admin()),
        id => Some(customer(id)),
    }
}

#[given(expr = "order {word} for {int} {word} owned by {word}")]
async fn create_order(world: &mut PaymentsWorld, name: String, total: i64, currency: String, owner: String) {
    let owner = if owner == "nobody" { String::new() } else { owner };
    let order = NewOrder::new(owner.as_str(), "shopper@example.com", currency.as_str())
        .with_item(NewLineItem::new("SKU-001", "Scenario item", MinorUnits::from(total), 1));
    let order = world.system().orders.create_order(order).await.expect("Error creating order");
    world.orders.insert(name, order);
}

#[when(expr = "{word} pays {int} {word} for order {word} with card token {string}")]
async fn pay_with_card(
    world: &mut PaymentsWorld,
    who: String,
    amount: i64,
    currency: String,
    name: String,
    token: String,
) {
    let order_id = world.order(&name).id;
    let request = PaymentRequest::new(order_id, MinorUnits::from(amount), currency).with_card_token(token);
    let caller = caller_named(&who);
    let result = world.system().flow.create_payment(caller.as_ref(), request).await;
    world.record(&name, result);
}

#[when(expr = "{word} pays {int} {word} for order {word} with wallet payment {string} from payer {string}")]
async fn pay_with_wallet(
    world: &mut PaymentsWorld,
    who: String,
    amount: i64,
    currency: String,
    name: String,
    payment_id: String,
    payer_id: String,
) {
    let order_id = world.order(&name).id;
    let request =
        PaymentRequest::new(order_id, MinorUnits::from(amount), currency).with_wallet_payment(payment_id, payer_id);
    let caller = caller_named(&who);
    let result = world.system().flow.create_payment(caller.as_ref(), request).await;
    world.record(&name, result);
}

#[when(expr = "{word} refunds {int} {word} of the charge for order {word}")]
async fn refund_charge(world: &mut PaymentsWorld, who: String, amount: i64, currency: String, name: String) {
    let charge_id = world.charge(&name).id.clone();
    let request = RefundRequest::new(charge_id, MinorUnits::from(amount), currency);
    let caller = caller_named(&who);
    let result = world.system().flow.refund_payment(caller.as_ref(), request).await;
    world.record(&name, result);
}

#[when(expr = "{word} refunds {int} {word} of the failed charge for order {word}")]
async fn refund_failed_charge(world: &mut PaymentsWorld, who: String, amount: i64, currency: String, name: String) {
    let order_id = world.order(&name).id;
    let filter = PaymentQueryFilter::default().with_order_id(order_id).with_status(TransactionStatus::Failed);
    let failed = world.system().db.search_transactions(filter).await.expect("Error searching transactions");
    let charge_id = failed.first().expect("The order has no failed charge").id.clone();
    let request = RefundRequest::new(charge_id, MinorUnits::from(amount), currency);
    let caller = caller_named(&who);
    let result = world.system().flow.refund_payment(caller.as_ref(), request).await;
    world.record(&name, result);
}

#[then("the request succeeds")]
async fn request_succeeds(world: &mut PaymentsWorld) {
    match world.last_result.as_ref().expect("No request has been made") {
        Ok(_) => {},
        Err(e) => panic!("Expected success, but got {e}"),
    }
}

#[then(expr = "the request fails with {word}")]
async fn request_fails(world: &mut PaymentsWorld, kind: String) {
    match world.last_result.as_ref().expect("No request has been made") {
        Ok(tx) => panic!("Expected {kind}, but the request succeeded with transaction {}", tx.id),
        Err(e) => assert_eq!(error_kind(e), kind, "Unexpected error: {e}"),
    }
}

#[then(expr = "the resulting transaction is {word} with reference {string}")]
async fn resulting_transaction(world: &mut PaymentsWorld, status: String, reference: String) {
    let tx = match world.last_result.as_ref() {
        Some(Ok(tx)) => tx,
        other => panic!("Expected a transaction, got {other:?}"),
    };
    assert_eq!(tx.status.to_string(), status);
    assert_eq!(tx.processor_id.as_deref(), Some(reference.as_str()));
}

#[then(expr = "order {word} is {word}")]
async fn order_payment_state(world: &mut PaymentsWorld, name: String, state: String) {
    let order_id = world.order(&name).id;
    let order = world.system().db.fetch_order(order_id).await.expect("Error fetching order").expect("Order missing");
    let expected = match state.as_str() {
        "paid" => PaymentState::Paid,
        "pending" => PaymentState::Pending,
        other => panic!("Unknown payment state {other}"),
    };
    assert_eq!(order.payment_state, expected);
}

#[then(expr = "order {word} belongs to {word}")]
async fn order_owner(world: &mut PaymentsWorld, name: String, owner: String) {
    let order_id = world.order(&name).id;
    let order = world.system().db.fetch_order(order_id).await.expect("Error fetching order").expect("Order missing");
    assert_eq!(order.user_id, owner);
}

#[then(expr = "order {word} has {int} {word} transaction(s)")]
async fn transaction_count(world: &mut PaymentsWorld, name: String, count: usize, kind: String) {
    let order_id = world.order(&name).id;
    let mut filter = PaymentQueryFilter::default().with_order_id(order_id);
    filter = match kind.as_str() {
        "charge" => filter.with_tx_type(TransactionType::Charge),
        "refund" => filter.with_tx_type(TransactionType::Refund),
        "failed" => filter.with_status(TransactionStatus::Failed),
        "paid" => filter.with_status(TransactionStatus::Paid),
        _ => filter,
    };
    let txs = world.system().db.search_transactions(filter).await.expect("Error searching transactions");
    assert_eq!(txs.len(), count, "Transactions: {txs:?}");
}

#[then(expr = "the card gateway was asked for {int} charge(s) and {int} refund(s)")]
async fn card_gateway_calls(world: &mut PaymentsWorld, charges: usize, refunds: usize) {
    let card = &world.system().card;
    assert_eq!(card.charge_count(), charges, "charge calls");
    assert_eq!(card.refund_count(), refunds, "refund calls");
}

#[then(expr = "the wallet gateway was asked for {int} charge(s)")]
async fn wallet_gateway_calls(world: &mut PaymentsWorld, charges: usize) {
    assert_eq!(world.system().wallet.charge_count(), charges);
}

#[then(expr = "{int} {word} webhook record(s) exist(s)")]
async fn webhook_records(world: &mut PaymentsWorld, count: usize, event_type: String) {
    let root = admin();
    let hooks = world
        .system()
        .payments
        .webhook_records(Some(&root), Some(event_type.as_str()))
        .await
        .expect("Error fetching webhook records");
    assert_eq!(hooks.len(), count);
}

#[then(expr = "{word} sees {int} payment(s) for order {word}")]
async fn payments_visible(world: &mut PaymentsWorld, who: String, count: usize, name: String) {
    let order_id = world.order(&name).id;
    let caller = caller_named(&who);
    let txs = world
        .system()
        .payments
        .payments_for_order(caller.as_ref(), order_id)
        .await
        .expect("Error fetching payments");
    assert_eq!(txs.len(), count);
}

#[then(expr = "{word} may not see the payments for order {word}")]
async fn payments_hidden(world: &mut PaymentsWorld, who: String, name: String) {
    let order_id = world.order(&name).id;
    let caller = caller_named(&who);
    let result = world.system().payments.payments_for_order(caller.as_ref(), order_id).await;
    assert!(
        matches!(result, Err(PaymentApiError::Unauthorized(_)) | Err(PaymentApiError::Unauthenticated)),
        "{result:?}"
    );
}
