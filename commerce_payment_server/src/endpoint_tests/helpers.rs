use std::sync::Arc;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use chrono::Duration;
use commerce_payment_engine::{
    db_types::{Order, PaymentProcessor},
    events::EventProducers,
    test_utils::{fixtures::order_with_total, prepare_env::test_database, stub_providers::ScriptedProvider},
    ChargeProviders,
    OrderApi,
    PaymentFlowApi,
    PaymentsApi,
    SqliteDatabase,
};
use log::debug;
use serde_json::Value;

use crate::{
    auth::{JwtClaims, TokenIssuer, TokenValidator},
    config::AuthConfig,
    server::payment_routes,
};

// DO NOT re-use this secret anywhere.
const TEST_JWT_SECRET: &str = "endpoint-tests-only-7c1d09f4b2";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn issue_token(id: &str, groups: &[&str], valid_for: Duration) -> String {
    let groups = groups.iter().map(|g| g.to_string()).collect();
    let email = format!("{id}@example.com");
    let claims = JwtClaims::new(id, email.as_str(), groups, valid_for);
    TokenIssuer::new(&get_auth_config()).issue_token(&claims).expect("Failed to sign token")
}

pub fn customer_token(id: &str) -> String {
    issue_token(id, &[], Duration::hours(1))
}

pub fn admin_token() -> String {
    issue_token("root", &["admin"], Duration::hours(1))
}

/// A fresh database plus scripted gateways. Every request gets a newly built app over the same database, the way
/// each actix worker builds its own.
pub struct TestContext {
    pub db: SqliteDatabase,
    pub card: Arc<ScriptedProvider>,
    pub wallet: Arc<ScriptedProvider>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_card(ScriptedProvider::succeeding(PaymentProcessor::Stripe, "ch_test")).await
    }

    pub async fn with_card(card: ScriptedProvider) -> Self {
        let db = test_database().await;
        let wallet = ScriptedProvider::succeeding(PaymentProcessor::Paypal, "PAY-test").into_arc();
        Self { db, card: card.into_arc(), wallet }
    }

    pub async fn create_order(&self, user_id: &str, total: i64) -> Order {
        let api = OrderApi::new(self.db.clone());
        api.create_order(order_with_total(user_id, total)).await.expect("Error creating order")
    }

    pub async fn send(&self, token: Option<&str>, req: TestRequest) -> (StatusCode, String) {
        let req = match token {
            Some(t) => req.insert_header(("Authorization", format!("Bearer {t}"))),
            None => req,
        };
        self.send_raw(req).await
    }

    pub async fn send_raw(&self, req: TestRequest) -> (StatusCode, String) {
        let providers = ChargeProviders::new(self.card.clone()).with_wallet(self.wallet.clone());
        let flow_api = PaymentFlowApi::new(self.db.clone(), providers, EventProducers::default());
        let payments_api = PaymentsApi::new(self.db.clone());
        let orders_api = OrderApi::new(self.db.clone());
        let app = App::new()
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(TokenValidator::new(&get_auth_config())))
            .configure(payment_routes::<SqliteDatabase>);
        let service = test::init_service(app).await;
        debug!("Making request");
        let res = test::call_service(&service, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        (status, String::from_utf8_lossy(&body).into_owned())
    }
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {body}"))
}
