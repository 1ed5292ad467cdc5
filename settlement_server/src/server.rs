use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use settlement_engine::{
    events::{EventHandlers, EventProducers},
    CustomerApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    notifications::notification_hooks,
    routes::{
        health,
        AdjustPointsRoute,
        AdvanceOrderStatusRoute,
        CancelOrderRoute,
        CompleteOrderRoute,
        CustomerByIdRoute,
        CustomerLedgerRoute,
        OrderByIdRoute,
        PlaceOrderRoute,
        PosSaleRoute,
        RecordPaymentRoute,
        SearchOrdersRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 256;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?
        .with_config(config.engine);
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!(
        "🚀️ Settlement engine ready. Online policy mode: {}, POS policy mode: {}",
        config.engine.online_policy_mode, config.engine.pos_policy_mode
    );
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, notification_hooks(config.storefront_url.clone()));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let settlement_api = SettlementApi::new(db.clone(), producers.clone());
        let customer_api = CustomerApi::new(db.clone());
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        let api_scope = web::scope("/api")
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(SearchOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(RecordPaymentRoute::<SqliteDatabase>::new())
            .service(AdvanceOrderStatusRoute::<SqliteDatabase>::new())
            .service(CompleteOrderRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(PosSaleRoute::<SqliteDatabase>::new())
            .service(CustomerByIdRoute::<SqliteDatabase>::new())
            .service(CustomerLedgerRoute::<SqliteDatabase>::new())
            .service(AdjustPointsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("rse::access_log"))
            .app_data(json_config)
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(customer_api))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
