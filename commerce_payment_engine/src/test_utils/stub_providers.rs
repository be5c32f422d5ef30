//! Charge providers that never leave the process. Each one follows a fixed script and counts how often it was called.
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use cpg_common::MinorUnits;
use futures_util::future::BoxFuture;

use crate::{
    db_types::PaymentProcessor,
    providers::{ChargeProvider, ChargeRequest, ProviderError},
};

#[derive(Debug, Clone)]
enum Script {
    Succeed(String),
    Fail(String),
}

#[derive(Debug)]
pub struct ScriptedProvider {
    processor: PaymentProcessor,
    charge_script: Script,
    refund_script: Script,
    supports_refunds: bool,
    charges: AtomicUsize,
    refunds: AtomicUsize,
    last_charge: Mutex<Option<ChargeRequest>>,
}

impl ScriptedProvider {
    /// A provider whose charges succeed with `reference` and whose refunds succeed with `re_<reference>`.
    pub fn succeeding(processor: PaymentProcessor, reference: &str) -> Self {
        Self {
            processor,
            charge_script: Script::Succeed(reference.to_string()),
            refund_script: Script::Succeed(format!("re_{reference}")),
            supports_refunds: processor != PaymentProcessor::Paypal,
            charges: AtomicUsize::new(0),
            refunds: AtomicUsize::new(0),
            last_charge: Mutex::new(None),
        }
    }

    /// A provider that rejects every call with `message`.
    pub fn failing(processor: PaymentProcessor, message: &str) -> Self {
        Self {
            charge_script: Script::Fail(message.to_string()),
            refund_script: Script::Fail(message.to_string()),
            ..Self::succeeding(processor, "unused")
        }
    }

    pub fn with_failing_refunds(mut self, message: &str) -> Self {
        self.refund_script = Script::Fail(message.to_string());
        self
    }

    pub fn with_refund_support(mut self, supported: bool) -> Self {
        self.supports_refunds = supported;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn charge_count(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }

    pub fn refund_count(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }

    pub fn last_charge(&self) -> Option<ChargeRequest> {
        self.last_charge.lock().ok().and_then(|c| c.clone())
    }

    fn run(script: &Script) -> Result<String, ProviderError> {
        match script {
            Script::Succeed(reference) => Ok(reference.clone()),
            Script::Fail(message) => {
                Err(ProviderError::Gateway { code: Some("card_declined".to_string()), message: message.clone() })
            },
        }
    }
}

impl ChargeProvider for ScriptedProvider {
    fn processor(&self) -> PaymentProcessor {
        self.processor
    }

    fn supports_refunds(&self) -> bool {
        self.supports_refunds
    }

    fn charge(&self, request: ChargeRequest) -> BoxFuture<'_, Result<String, ProviderError>> {
        self.charges.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_charge.lock() {
            *last = Some(request);
        }
        let result = Self::run(&self.charge_script);
        Box::pin(async move { result })
    }

    fn refund(&self, _amount: MinorUnits, _charge_reference: String) -> BoxFuture<'_, Result<String, ProviderError>> {
        self.refunds.fetch_add(1, Ordering::SeqCst);
        let result = if self.supports_refunds {
            Self::run(&self.refund_script)
        } else {
            Err(ProviderError::Unsupported(self.processor))
        };
        Box::pin(async move { result })
    }
}
