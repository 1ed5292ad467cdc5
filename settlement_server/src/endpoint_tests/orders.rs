use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;
use settlement_engine::{
    db_types::{Money, OrderId, OrderStatusType, PaymentStatus, Tier},
    events::EventProducers,
    settlement_objects::{CancelOutcome, PaymentOutcome, SettlementOutcome, SettlementSummary, TierChange},
    CustomerApi,
    SettlementApi,
    SettlementError,
};

use super::helpers::{get_request, post_request, sample_order};
use crate::{
    endpoint_tests::mocks::MockBackend,
    routes::{CancelOrderRoute, CompleteOrderRoute, OrderByIdRoute, PlaceOrderRoute, RecordPaymentRoute},
};

fn configure_with(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let mut reader = MockBackend::new();
        reader
            .expect_fetch_order_by_order_id()
            .returning(|id| {
                Ok((id.as_str() == "1001").then(|| sample_order(OrderStatusType::New, PaymentStatus::Paid)))
            });
        cfg.service(PlaceOrderRoute::<MockBackend>::new())
            .service(OrderByIdRoute::<MockBackend>::new())
            .service(RecordPaymentRoute::<MockBackend>::new())
            .service(CompleteOrderRoute::<MockBackend>::new())
            .service(CancelOrderRoute::<MockBackend>::new())
            .app_data(web::Data::new(SettlementApi::new(backend, EventProducers::default())))
            .app_data(web::Data::new(CustomerApi::new(reader)));
    }
}

fn promoted_summary() -> SettlementSummary {
    SettlementSummary {
        reference: "#1001".into(),
        message: "#1001 settled as delivered. 20 points earned, 0 redeemed. Customer promoted to gold.".into(),
        status: OrderStatusType::Delivered,
        customer_id: Some("alice".into()),
        points_earned: 20,
        points_redeemed: 0,
        redemption_skipped: false,
        new_balance: Some(20),
        new_lifetime_spend: Some(Money::from(5200)),
        tier_change: Some(TierChange { customer_id: "alice".into(), old_tier: Tier::Silver, new_tier: Tier::Gold }),
    }
}

#[actix_web::test]
async fn complete_order_reports_the_summary() {
    let mut backend = MockBackend::new();
    backend
        .expect_complete_order()
        .withf(|id, target| id == &OrderId::from("1001") && *target == OrderStatusType::Delivered)
        .times(1)
        .returning(|_, _| Ok(SettlementOutcome::Settled(promoted_summary())));
    let body = json!({ "target_status": "delivered" });
    let (status, body) = post_request("/orders/1001/complete", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["already_processed"], false);
    assert_eq!(body["summary"]["points_earned"], 20);
    assert_eq!(body["summary"]["tier_change"]["new_tier"], "gold");
}

#[actix_web::test]
async fn completing_a_processed_order_is_not_an_error() {
    let mut backend = MockBackend::new();
    backend.expect_complete_order().returning(|_, _| Ok(SettlementOutcome::already_settled("#1001")));
    let body = json!({ "target_status": "fulfilled" });
    let (status, body) = post_request("/orders/1001/complete", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order already processed");
    assert_eq!(body["already_processed"], true);
    assert!(body.get("summary").is_none());
}

#[actix_web::test]
async fn complete_order_errors() {
    let mut backend = MockBackend::new();
    backend
        .expect_complete_order()
        .returning(|id, _| Err(SettlementError::OrderNotFound(id.clone())));
    let body = json!({ "target_status": "delivered" });
    let (status, body) = post_request("/orders/404/complete", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let mut backend = MockBackend::new();
    backend.expect_complete_order().returning(|_, _| Err(SettlementError::PolicyNotConfigured));
    let body = json!({ "target_status": "delivered" });
    let (status, _) = post_request("/orders/1001/complete", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn complete_order_rejects_unknown_statuses() {
    let mut backend = MockBackend::new();
    backend.expect_complete_order().never();
    let body = json!({ "target_status": "teleported" });
    let (status, _) = post_request("/orders/1001/complete", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn place_order_conflicts() {
    let mut backend = MockBackend::new();
    backend.expect_place_order().returning(|o| Err(SettlementError::OrderAlreadyExists(o.order_id)));
    let body = json!({
        "order_id": "1001",
        "customer_id": "alice",
        "outlet_id": "jkt-central",
        "items": [{ "product_id": "tee", "sku": "tee-m", "quantity": 2, "unit_price": 500 }],
        "total_price": 1000
    });
    let (status, body) = post_request("/orders", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("already exists"));
}

#[actix_web::test]
async fn place_order() {
    let mut backend = MockBackend::new();
    backend
        .expect_place_order()
        .withf(|o| o.items.len() == 1 && o.points_redeemed == 0)
        .returning(|_| Ok(sample_order(OrderStatusType::PendingPayment, PaymentStatus::Unpaid)));
    let body = json!({
        "order_id": "1001",
        "customer_id": "alice",
        "outlet_id": "jkt-central",
        "items": [{ "product_id": "tee", "sku": "tee-m", "quantity": 2, "unit_price": 500 }],
        "total_price": 1000
    });
    let (status, body) = post_request("/orders", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending_payment");
    assert_eq!(body["payment_status"], "unpaid");
}

#[actix_web::test]
async fn fetch_order() {
    let (status, body) = get_request("/orders/1001", configure_with(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_id"], "1001");
    assert_eq!(body["items"][0]["sku"], "tee-m");

    let (status, _) = get_request("/orders/9999", configure_with(MockBackend::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn payment_signal() {
    let mut backend = MockBackend::new();
    backend.expect_record_payment().withf(|_, captured, reference| *captured && reference == "pay_123").returning(
        |_, _, _| {
            let order = sample_order(OrderStatusType::New, PaymentStatus::Paid);
            Ok(PaymentOutcome::Captured { order, points_earned: 50 })
        },
    );
    let body = json!({ "captured": true, "reference": "pay_123" });
    let (status, body) = post_request("/orders/1001/payment", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment for #1001 captured. 50 points earned");
    assert_eq!(body["order"]["status"], "new");
}

#[actix_web::test]
async fn cancel_order() {
    let mut backend = MockBackend::new();
    backend.expect_cancel_order().returning(|_| {
        let order = sample_order(OrderStatusType::Canceled, PaymentStatus::Unpaid);
        Ok(CancelOutcome::Canceled { order, restocked: true })
    });
    let (status, body) = post_request("/orders/1001/cancel", json!({}), configure_with(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order #1001 canceled and restocked");

    let mut backend = MockBackend::new();
    backend.expect_cancel_order().returning(|id| {
        Err(SettlementError::InvalidTransition {
            order_id: id.clone(),
            from: OrderStatusType::Delivered,
            to: OrderStatusType::Canceled,
        })
    });
    let (status, _) = post_request("/orders/1001/cancel", json!({}), configure_with(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
