use cpg_common::MinorUnits;
use futures_util::future::BoxFuture;
use gateway_tools::{PaypalApi, PaypalConfig, PaypalPayment};
use log::*;

use crate::{
    db_types::PaymentProcessor,
    providers::{ChargeProvider, ChargeRequest, ProviderError},
};

/// Wallet-redirect provider. The customer approves the payment on the gateway's side; we check it matches the order
/// and then execute it. Refunds are not supported.
#[derive(Clone)]
pub struct PaypalProvider {
    api: PaypalApi,
}

impl PaypalProvider {
    pub fn new(config: PaypalConfig) -> Result<Self, ProviderError> {
        info!("💳️ PayPal wallet payments enabled ({} environment)", config.environment);
        let api = PaypalApi::new(config)?;
        Ok(Self { api })
    }
}

/// Checks that an approved wallet payment is for exactly the amount and currency being charged.
///
/// The payment must carry exactly one transaction, and that transaction must report an amount. The gateway reports
/// totals as two-decimal strings, so the comparison is made on that representation.
pub fn validate_wallet_payment(
    payment: &PaypalPayment,
    amount: MinorUnits,
    currency: &str,
) -> Result<(), ProviderError> {
    if payment.transactions.len() != 1 {
        return Err(ProviderError::MalformedPayment(format!(
            "Expected exactly one transaction on payment {}, found {}",
            payment.id,
            payment.transactions.len()
        )));
    }
    let reported = payment.transactions[0]
        .amount
        .as_ref()
        .ok_or_else(|| ProviderError::MalformedPayment(format!("Payment {} has no amount", payment.id)))?;
    let expected_total = amount.to_decimal_string();
    if reported.total != expected_total || reported.currency != currency {
        return Err(ProviderError::AmountMismatch {
            expected: format!("{expected_total} {currency}"),
            reported: format!("{} {}", reported.total, reported.currency),
        });
    }
    Ok(())
}

impl ChargeProvider for PaypalProvider {
    fn processor(&self) -> PaymentProcessor {
        PaymentProcessor::Paypal
    }

    fn supports_refunds(&self) -> bool {
        false
    }

    fn charge(&self, request: ChargeRequest) -> BoxFuture<'_, Result<String, ProviderError>> {
        Box::pin(async move {
            let payer_id = request
                .secondary_token
                .ok_or_else(|| ProviderError::MalformedPayment("No payer id was supplied".to_string()))?;
            let payment = self.api.get_payment(&request.token).await?;
            validate_wallet_payment(&payment, request.amount, &request.currency)?;
            let executed = self.api.execute_payment(&payment.id, &payer_id).await?;
            debug!("💳️ PayPal payment {} executed for payer {payer_id}", executed.id);
            Ok(executed.id)
        })
    }

    fn refund(&self, _amount: MinorUnits, charge_reference: String) -> BoxFuture<'_, Result<String, ProviderError>> {
        warn!("💳️ Refund requested for PayPal payment {charge_reference}, but PayPal refunds are not supported");
        Box::pin(async { Err(ProviderError::Unsupported(PaymentProcessor::Paypal)) })
    }
}
