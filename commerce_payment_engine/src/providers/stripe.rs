use cpg_common::MinorUnits;
use futures_util::future::BoxFuture;
use gateway_tools::{StripeApi, StripeConfig};
use log::*;

use crate::{
    db_types::PaymentProcessor,
    providers::{ChargeProvider, ChargeRequest, ProviderError},
};

/// Card-network provider. Charges one-time card tokens and supports partial and full refunds.
#[derive(Clone)]
pub struct StripeProvider {
    api: StripeApi,
}

impl StripeProvider {
    pub fn new(config: StripeConfig) -> Result<Self, ProviderError> {
        if config.secret_key.is_empty() {
            warn!("💳️ No Stripe secret key is configured. Every card charge will be rejected by the gateway.");
        }
        let api = StripeApi::new(config)?;
        Ok(Self { api })
    }
}

impl ChargeProvider for StripeProvider {
    fn processor(&self) -> PaymentProcessor {
        PaymentProcessor::Stripe
    }

    fn charge(&self, request: ChargeRequest) -> BoxFuture<'_, Result<String, ProviderError>> {
        Box::pin(async move {
            let charge = self.api.create_charge(request.amount, &request.currency, &request.token).await?;
            Ok(charge.id)
        })
    }

    fn refund(&self, amount: MinorUnits, charge_reference: String) -> BoxFuture<'_, Result<String, ProviderError>> {
        Box::pin(async move {
            let refund = self.api.create_refund(&charge_reference, amount).await?;
            Ok(refund.id)
        })
    }
}
