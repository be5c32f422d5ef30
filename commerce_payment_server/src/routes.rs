//! Request handler definitions
//!
//! Define each route and its handler here. Handlers translate between HTTP and the engine APIs and nothing more; any
//! payment logic belongs in the engine.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database or a gateway, so they are
//! all async. Never call blocking I/O from a handler.
use actix_web::{get, web, HttpResponse, Responder};
use commerce_payment_engine::{
    db_types::OrderUpdate,
    OrderApi,
    OrderManagement,
    PaymentFlowApi,
    PaymentLedger,
    PaymentQueries,
    PaymentQueryFilter,
    PaymentsApi,
};
use log::*;

use crate::{
    auth::Identity,
    data_objects::{CreateOrderParams, CreatePaymentParams, RefundParams},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement);
/// Checkout. Signed-in callers own the new order; anonymous callers create an anonymous order that the first paying
/// customer will claim.
pub async fn create_order<B: OrderManagement>(
    identity: Identity,
    body: web::Json<CreateOrderParams>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner().into_new_order(identity.caller())?;
    debug!("💻️ POST new order with {} line items for '{}'", order.line_items.len(), order.user_id);
    let order = api.create_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement);
/// Owner or administrator only.
pub async fn order_by_id<B: OrderManagement>(
    identity: Identity,
    path: web::Path<i64>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET order {order_id}");
    let order = api.fetch_order(identity.caller(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order => Post "/orders/{order_id}" impl OrderManagement);
/// Partial order update for administrators. Paid orders reject changes to their currency, billing address and line
/// items with a 409.
pub async fn update_order<B: OrderManagement>(
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<OrderUpdate>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST update to order {order_id}");
    let order = api.update_order(identity.caller(), order_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_payments => Get "/orders/{order_id}/payments" impl PaymentQueries);
/// All transactions recorded against an order. Owner or administrator only.
pub async fn order_payments<B: PaymentQueries>(
    identity: Identity,
    path: web::Path<i64>,
    api: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET payments for order {order_id}");
    let payments = api.payments_for_order(identity.caller(), order_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(create_payment => Post "/orders/{order_id}/payments" impl PaymentLedger);
/// Charges an order with either a card token or an approved wallet payment.
///
/// The response is the resulting `paid` transaction. A gateway rejection is reported as an error, but the failed
/// attempt is still recorded and will show up in the order's payment list.
pub async fn create_payment<B: PaymentLedger>(
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<CreatePaymentParams>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let request = body.into_inner().into_payment_request(order_id);
    debug!("💻️ POST payment of {} {} for order {order_id}", request.amount, request.currency);
    let transaction = api.create_payment(identity.caller(), request).await?;
    Ok(HttpResponse::Ok().json(transaction))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(user_payments => Get "/users/{user_id}/payments" impl PaymentQueries);
pub async fn user_payments<B: PaymentQueries>(
    identity: Identity,
    path: web::Path<String>,
    api: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    trace!("💻️ GET payments for user {user_id}");
    let payments = api.payments_for_user(identity.caller(), &user_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(payments => Get "/payments" impl PaymentQueries);
/// Administrator search over every transaction. The query string carries the filter fields, e.g.
/// `/payments?status=failed&currency=USD`.
pub async fn payments<B: PaymentQueries>(
    identity: Identity,
    query: web::Query<PaymentQueryFilter>,
    api: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner();
    trace!("💻️ GET payments matching {filter:?}");
    let payments = api.list_payments(identity.caller(), filter).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(payment_by_id => Get "/payments/{pay_id}" impl PaymentQueries);
pub async fn payment_by_id<B: PaymentQueries>(
    identity: Identity,
    path: web::Path<String>,
    api: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let pay_id = path.into_inner();
    trace!("💻️ GET payment {pay_id}");
    let payment = api.get_payment(identity.caller(), &pay_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(refund_payment => Post "/payments/{pay_id}/refund" impl PaymentLedger);
/// Refunds some or all of a paid charge.
pub async fn refund_payment<B: PaymentLedger>(
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<RefundParams>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner().into_refund_request(path.into_inner());
    debug!("💻️ POST refund of {} {} against {}", request.amount, request.currency, request.transaction_id);
    let refund = api.refund_payment(identity.caller(), request).await?;
    Ok(HttpResponse::Ok().json(refund))
}
