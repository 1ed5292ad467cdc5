use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use serde_json::json;
use settlement_engine::{
    db_types::{Customer, LedgerEntry, LedgerEntryType, Money, OrderStatusType, PaymentStatus, Tier},
    events::EventProducers,
    settlement_objects::PointsAdjustment,
    CustomerApi,
    SettlementApi,
    SettlementError,
};

use super::helpers::{get_request, post_request, sample_order};
use crate::{
    endpoint_tests::mocks::MockBackend,
    routes::{AdjustPointsRoute, CustomerByIdRoute, CustomerLedgerRoute, SearchOrdersRoute},
};

fn customer(balance: i64) -> Customer {
    Customer {
        id: "alice".into(),
        lifetime_spend: Money::from(5200),
        points_balance: balance,
        tier: Tier::Gold,
        created_at: Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 8, 2, 9, 0, 0).unwrap(),
    }
}

fn entry(id: i64, delta: i64, entry_type: LedgerEntryType, reason: &str) -> LedgerEntry {
    LedgerEntry {
        id,
        customer_id: "alice".into(),
        delta,
        entry_type,
        reason: reason.into(),
        created_at: Utc.with_ymd_and_hms(2024, 8, 2, 9, 0, 0).unwrap(),
    }
}

fn configure_with(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let mut reader = MockBackend::new();
        reader.expect_fetch_customer().returning(|id| Ok((id == "alice").then(|| customer(270))));
        reader.expect_fetch_ledger_for_customer().returning(|_| {
            Ok(vec![
                entry(1, 300, LedgerEntryType::Adjustment, "Migrated balance"),
                entry(2, 20, LedgerEntryType::Earn, "Points earned from order #1001"),
                entry(3, -50, LedgerEntryType::Redeem, "Points redeemed on order #1001"),
            ])
        });
        reader.expect_search_orders().returning(|filter| {
            let wanted = filter.status.clone().unwrap_or_default();
            let orders = [sample_order(OrderStatusType::New, PaymentStatus::Paid)]
                .into_iter()
                .filter(|o| wanted.is_empty() || wanted.contains(&o.status))
                .collect();
            Ok(orders)
        });
        cfg.service(CustomerByIdRoute::<MockBackend>::new())
            .service(CustomerLedgerRoute::<MockBackend>::new())
            .service(AdjustPointsRoute::<MockBackend>::new())
            .service(SearchOrdersRoute::<MockBackend>::new())
            .app_data(web::Data::new(SettlementApi::new(backend, EventProducers::default())))
            .app_data(web::Data::new(CustomerApi::new(reader)));
    }
}

#[actix_web::test]
async fn fetch_customer() {
    let (status, body) = get_request("/customers/alice", configure_with(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points_balance"], 270);
    assert_eq!(body["tier"], "gold");
    assert_eq!(body["lifetime_spend"], 5200);

    let (status, body) = get_request("/customers/bob", configure_with(MockBackend::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn fetch_ledger() {
    let (status, body) = get_request("/customers/alice/ledger", configure_with(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2]["entry_type"], "redeem");
    let sum = entries.iter().map(|e| e["delta"].as_i64().unwrap()).sum::<i64>();
    assert_eq!(sum, 270);
}

#[actix_web::test]
async fn adjust_points() {
    let mut backend = MockBackend::new();
    backend
        .expect_adjust_points()
        .withf(|id, delta, reason| id == "alice" && *delta == 25 && reason == "Goodwill")
        .returning(|_, delta, reason| {
            let entry = entry(4, delta, LedgerEntryType::Adjustment, reason);
            Ok(PointsAdjustment { customer: customer(295), entry })
        });
    let body = json!({ "delta": 25, "reason": "Goodwill" });
    let (status, body) = post_request("/customers/alice/points", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Adjusted points for alice by 25. New balance is 295");
    assert_eq!(body["entry"]["entry_type"], "adjustment");
}

#[actix_web::test]
async fn adjust_points_needs_a_reason() {
    let mut backend = MockBackend::new();
    backend
        .expect_adjust_points()
        .returning(|_, _, _| {
            Err(SettlementError::InvalidRequest("A reason is required for a points adjustment".into()))
        });
    let body = json!({ "delta": 25, "reason": "" });
    let (status, body) = post_request("/customers/alice/points", body, configure_with(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn search_orders_by_status() {
    let (status, body) =
        get_request("/search/orders?customer_id=alice&status=new,preparing", configure_with(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "new");

    let (status, body) = get_request("/search/orders?status=delivered", configure_with(MockBackend::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = get_request("/search/orders?status=shipped", configure_with(MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
