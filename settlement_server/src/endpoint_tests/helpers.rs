use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use serde_json::Value;
use settlement_engine::db_types::{Money, Order, OrderId, OrderItem, OrderStatusType, OrderType, PaymentStatus};

pub async fn get_request(path: &str, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, Value) {
    call(TestRequest::get().uri(path), configure).await
}

pub async fn post_request(path: &str, body: Value, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, Value) {
    call(TestRequest::post().uri(path).set_json(body), configure).await
}

async fn call(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, Value) {
    let _ = env_logger::try_init();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let bytes = res.into_body().try_into_bytes().unwrap_or_default();
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
    (status, body)
}

pub fn sample_order(status: OrderStatusType, payment_status: PaymentStatus) -> Order {
    Order {
        id: 1,
        order_id: OrderId::from("1001"),
        customer_id: Some("alice".into()),
        order_type: OrderType::Regular,
        status,
        payment_status,
        payment_reference: None,
        outlet_id: Some("jkt-central".into()),
        total_price: Money::from(1000),
        points_redeemed: 0,
        stock_reserved: true,
        created_at: Utc.with_ymd_and_hms(2024, 8, 1, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 8, 1, 9, 30, 0).unwrap(),
        items: vec![OrderItem::new("tee", "tee-m", 2, Money::from(500))],
    }
}
