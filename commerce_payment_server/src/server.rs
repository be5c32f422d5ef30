use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use commerce_payment_engine::{
    events::EventProducers,
    notifications::create_notification_handlers,
    AccessControl,
    ChargeProviders,
    OrderApi,
    OrderManagement,
    PaymentFlowApi,
    PaymentLedger,
    PaymentQueries,
    PaymentsApi,
    PaypalProvider,
    SqliteDatabase,
    StripeProvider,
    WebhookTargets,
};
use log::*;

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    errors::ServerError,
    integrations::mailer::mailer_from_config,
    routes::{
        health,
        CreateOrderRoute,
        CreatePaymentRoute,
        OrderByIdRoute,
        OrderPaymentsRoute,
        PaymentByIdRoute,
        PaymentsRoute,
        RefundPaymentRoute,
        UpdateOrderRoute,
        UserPaymentsRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 50;
const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = if config.database_url.is_empty() {
        SqliteDatabase::new(MAX_DB_CONNECTIONS).await
    } else {
        SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS).await
    }
    .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        info!("🗃️ Running database migrations");
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let providers = build_providers(&config)?;
    info!("💳️ Payment providers ready: {providers:?}");
    let mailer = mailer_from_config(&config.mailer).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_handlers(mailer, EVENT_BUFFER_SIZE);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, providers, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The card provider is always present. The wallet provider is added when it has been configured.
pub fn build_providers(config: &ServerConfig) -> Result<ChargeProviders, ServerError> {
    let card = StripeProvider::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mut providers = ChargeProviders::new(Arc::new(card));
    if let Some(paypal) = &config.paypal {
        let wallet = PaypalProvider::new(paypal.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        providers = providers.with_wallet(Arc::new(wallet));
    }
    Ok(providers)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    providers: ChargeProviders,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let webhooks = WebhookTargets::new(config.webhooks.payment_url.clone(), config.webhooks.refund_url.clone());
    let srv = HttpServer::new(move || {
        let access = AccessControl::new(config.admin_group.clone());
        let flow_api = PaymentFlowApi::new(db.clone(), providers.clone(), producers.clone())
            .with_access_control(access.clone())
            .with_webhooks(webhooks.clone());
        let payments_api = PaymentsApi::new(db.clone()).with_access_control(access.clone());
        let orders_api = OrderApi::new(db.clone()).with_access_control(access);
        let validator = TokenValidator::new(&config.auth);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cpg::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(validator))
            .configure(payment_routes::<SqliteDatabase>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route plus the extractor configuration that turns malformed input into JSON errors.
///
/// The caller supplies the API objects and the [`TokenValidator`] as app data.
pub fn payment_routes<B>(cfg: &mut web::ServiceConfig)
where B: PaymentLedger + PaymentQueries + OrderManagement + 'static {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into()),
    )
    .app_data(web::QueryConfig::default().error_handler(|err, _req| ServerError::InvalidQuery(err.to_string()).into()))
    .service(health)
    .service(CreateOrderRoute::<B>::new())
    .service(OrderByIdRoute::<B>::new())
    .service(UpdateOrderRoute::<B>::new())
    .service(OrderPaymentsRoute::<B>::new())
    .service(CreatePaymentRoute::<B>::new())
    .service(UserPaymentsRoute::<B>::new())
    .service(PaymentsRoute::<B>::new())
    .service(PaymentByIdRoute::<B>::new())
    .service(RefundPaymentRoute::<B>::new());
}
