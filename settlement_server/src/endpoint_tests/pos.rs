use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;
use settlement_engine::{
    db_types::OrderStatusType,
    events::EventProducers,
    settlement_objects::{SettlementOutcome, SettlementSummary},
    SettlementApi,
    SettlementError,
};

use super::helpers::post_request;
use crate::{endpoint_tests::mocks::MockBackend, routes::PosSaleRoute};

fn configure_with(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(PosSaleRoute::<MockBackend>::new())
            .app_data(web::Data::new(SettlementApi::new(backend, EventProducers::default())));
    }
}

fn sale_body() -> serde_json::Value {
    json!({
        "sale_id": "pos-1",
        "outlet_id": "bdg-mall",
        "customer_id": "frank",
        "items": [{ "product_id": "mug", "sku": "mug-std", "quantity": 5, "unit_price": 100 }],
        "total_price": 500,
        "promo_code": null
    })
}

#[actix_web::test]
async fn insufficient_stock_is_a_conflict() {
    let mut backend = MockBackend::new();
    backend.expect_complete_pos_sale().withf(|s| s.sale_id == "pos-1" && s.items[0].quantity == 5).returning(|_| {
        Err(SettlementError::InsufficientStock { product: "Enamel Mug".into(), available: 3, requested: 5 })
    });
    let (status, body) = post_request("/pos/sales", sale_body(), configure_with(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "The request conflicts with the current state. Insufficient stock for Enamel Mug. 3 available, but 5 requested"
    );
}

#[actix_web::test]
async fn anonymous_sale() {
    let mut backend = MockBackend::new();
    backend.expect_complete_pos_sale().returning(|s| {
        Ok(SettlementOutcome::Settled(SettlementSummary::anonymous(s.sale_id, OrderStatusType::Fulfilled)))
    });
    let (status, body) = post_request("/pos/sales", sale_body(), configure_with(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["reference"], "pos-1");
    assert_eq!(body["summary"]["status"], "fulfilled");
    assert_eq!(body["summary"]["new_balance"], serde_json::Value::Null);
}

#[actix_web::test]
async fn malformed_sales_are_rejected() {
    let mut backend = MockBackend::new();
    backend.expect_complete_pos_sale().never();
    let body = json!({ "sale_id": "pos-1" });
    let (status, _) = post_request("/pos/sales", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
