//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every settlement is a database transaction, so all handlers here
//! are async and await the engine rather than blocking on it.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use serde_json::json;
use settlement_engine::{
    db_types::{NewOrder, OrderId, PosSale},
    order_objects::OrderQueryFilter,
    traits::{CustomerManagement, SettlementDatabase},
    CustomerApi,
    SettlementApi,
};

use crate::{
    data_objects::{
        AdjustPointsParams,
        CompleteOrderParams,
        JsonResponse,
        OrderSearchParams,
        PaymentNotification,
        SettlementResponse,
        StatusUpdateParams,
    },
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
route!(place_order => Post "/orders" impl SettlementDatabase);
/// Hands a new order over from the storefront checkout. Regular orders reserve their stock here.
pub async fn place_order<B: SettlementDatabase>(
    body: web::Json<NewOrder>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner();
    debug!("💻️ Received new order {}", order.order_id);
    let order = api.place_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(order_by_id => Get "/orders/{order_id}" impl CustomerManagement);
pub async fn order_by_id<B: CustomerManagement>(
    path: web::Path<String>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    trace!("💻️ GET order {order_id}");
    let order =
        api.order_by_id(&order_id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id}")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(record_payment => Post "/orders/{order_id}/payment" impl SettlementDatabase);
/// The payment gateway's capture signal. Redelivering the same signal is harmless.
pub async fn record_payment<B: SettlementDatabase>(
    path: web::Path<String>,
    body: web::Json<PaymentNotification>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let PaymentNotification { captured, reference } = body.into_inner();
    debug!("💻️ Payment signal for {order_id}: captured={captured}, reference={reference}");
    let outcome = api.record_payment(&order_id, captured, &reference).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": outcome.message(),
        "order": outcome.order(),
    })))
}

route!(advance_order_status => Post "/orders/{order_id}/status" impl SettlementDatabase);
pub async fn advance_order_status<B: SettlementDatabase>(
    path: web::Path<String>,
    body: web::Json<StatusUpdateParams>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let change = api.advance_order_status(&order_id, body.status).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(change.message())))
}

route!(complete_order => Post "/orders/{order_id}/complete" impl SettlementDatabase);
/// Settles an online order. Completing an order that was already settled or canceled returns
/// `"Order already processed"` with a 200 status.
pub async fn complete_order<B: SettlementDatabase>(
    path: web::Path<String>,
    body: web::Json<CompleteOrderParams>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ Completing order {order_id} as {}", body.target_status);
    let outcome = api.complete_order(&order_id, body.target_status).await?;
    Ok(HttpResponse::Ok().json(SettlementResponse::from(outcome)))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl SettlementDatabase);
pub async fn cancel_order<B: SettlementDatabase>(
    path: web::Path<String>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ Cancelling order {order_id}");
    let outcome = api.cancel_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(outcome.message())))
}

route!(search_orders => Get "/search/orders" impl CustomerManagement);
pub async fn search_orders<B: CustomerManagement>(
    query: web::Query<OrderSearchParams>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::try_from(query.into_inner())?;
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   POS  ----------------------------------------------------
route!(pos_sale => Post "/pos/sales" impl SettlementDatabase);
pub async fn pos_sale<B: SettlementDatabase>(
    body: web::Json<PosSale>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let sale = body.into_inner();
    debug!("💻️ POS sale {} from outlet {}", sale.sale_id, sale.outlet_id);
    let outcome = api.complete_pos_sale(sale).await?;
    Ok(HttpResponse::Ok().json(SettlementResponse::from(outcome)))
}

//----------------------------------------------   Customers  ----------------------------------------------------
route!(customer_by_id => Get "/customers/{customer_id}" impl CustomerManagement);
pub async fn customer_by_id<B: CustomerManagement>(
    path: web::Path<String>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    let customer = api
        .customer_by_id(&customer_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Customer {customer_id}")))?;
    Ok(HttpResponse::Ok().json(customer))
}

route!(customer_ledger => Get "/customers/{customer_id}/ledger" impl CustomerManagement);
pub async fn customer_ledger<B: CustomerManagement>(
    path: web::Path<String>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    let entries = api.ledger_for_customer(&customer_id).await?;
    Ok(HttpResponse::Ok().json(entries))
}

route!(adjust_points => Post "/customers/{customer_id}/points" impl SettlementDatabase);
/// A manual correction to a customer's point balance. A reason is mandatory.
pub async fn adjust_points<B: SettlementDatabase>(
    path: web::Path<String>,
    body: web::Json<AdjustPointsParams>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    let AdjustPointsParams { delta, reason } = body.into_inner();
    info!("💻️ Adjusting points for {customer_id} by {delta}: {reason}");
    let adjustment = api.adjust_points(&customer_id, delta, &reason).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": adjustment.message(),
        "customer": adjustment.customer,
        "entry": adjustment.entry,
    })))
}
