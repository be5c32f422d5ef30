use commerce_payment_engine::{db_types::PaymentProcessor, test_utils::stub_providers::ScriptedProvider};
use cucumber::given;

use crate::cucumber::{payments_world::PaymentSystem, PaymentsWorld};

#[given(expr = "a payment server whose card gateway approves charges with reference {string}")]
async fn approving_gateway(world: &mut PaymentsWorld, reference: String) {
    let card = ScriptedProvider::succeeding(PaymentProcessor::Stripe, &reference);
    world.system = Some(PaymentSystem::new(card).await);
}

#[given(expr = "a payment server whose card gateway declines every charge with {string}")]
async fn declining_gateway(world: &mut PaymentsWorld, message: String) {
    let card = ScriptedProvider::failing(PaymentProcessor::Stripe, &message);
    world.system = Some(PaymentSystem::new(card).await);
}

#[given(expr = "a payment server whose card gateway approves charges but rejects refunds with {string}")]
async fn refund_rejecting_gateway(world: &mut PaymentsWorld, message: String) {
    let card = ScriptedProvider::succeeding(PaymentProcessor::Stripe, "ch_1").with_failing_refunds(&message);
    world.system = Some(PaymentSystem::new(card).await);
}
