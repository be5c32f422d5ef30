use std::{collections::HashMap, sync::Arc};

use commerce_payment_engine::{
    db_types::{Order, PaymentProcessor, Transaction},
    events::EventProducers,
    test_utils::{
        prepare_env::{create_database, random_db_path, run_migrations},
        stub_providers::ScriptedProvider,
    },
    ChargeProvider,
    ChargeProviders,
    OrderApi,
    PaymentApiError,
    PaymentFlowApi,
    PaymentsApi,
    SqliteDatabase,
    WebhookTargets,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct PaymentsWorld {
    pub system: Option<PaymentSystem>,
    /// Orders created in the scenario, by the name the feature file gives them
    pub orders: HashMap<String, Order>,
    /// The successful charge for each named order
    pub charges: HashMap<String, Transaction>,
    pub last_result: Option<Result<Transaction, PaymentApiError>>,
}

#[derive(Debug)]
pub struct PaymentSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub card: Arc<ScriptedProvider>,
    pub wallet: Arc<ScriptedProvider>,
    pub flow: PaymentFlowApi<SqliteDatabase>,
    pub orders: OrderApi<SqliteDatabase>,
    pub payments: PaymentsApi<SqliteDatabase>,
}

impl PaymentsWorld {
    pub fn system(&self) -> &PaymentSystem {
        self.system.as_ref().expect("Payment system not initialised")
    }

    pub fn order(&self, name: &str) -> &Order {
        self.orders.get(name).unwrap_or_else(|| panic!("No order named {name}"))
    }

    pub fn charge(&self, name: &str) -> &Transaction {
        self.charges.get(name).unwrap_or_else(|| panic!("Order {name} has not been charged successfully"))
    }

    pub fn record(&mut self, order: &str, result: Result<Transaction, PaymentApiError>) {
        if let Ok(tx) = &result {
            if tx.tx_type == commerce_payment_engine::db_types::TransactionType::Charge {
                self.charges.insert(order.to_string(), tx.clone());
            }
        }
        self.last_result = Some(result);
    }
}

impl PaymentSystem {
    pub async fn new(card: ScriptedProvider) -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let card = card.into_arc();
        let wallet = ScriptedProvider::succeeding(PaymentProcessor::Paypal, "PAY-EXECUTED").into_arc();
        let providers = ChargeProviders::new(card.clone() as Arc<dyn ChargeProvider>)
            .with_wallet(wallet.clone() as Arc<dyn ChargeProvider>);
        let webhooks = WebhookTargets::new(
            Some("https://hooks.example.com/payments".to_string()),
            Some("https://hooks.example.com/refunds".to_string()),
        );
        let flow = PaymentFlowApi::new(db.clone(), providers, EventProducers::default()).with_webhooks(webhooks);
        let orders = OrderApi::new(db.clone());
        let payments = PaymentsApi::new(db.clone());
        Self { db_path: url, db, card, wallet, flow, orders, payments }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
