use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voyago_api::{
    app,
    state::{AppState, AuthConfig},
    worker,
};
use voyago_booking::{PaymentOrchestrator, SimulatedGateway};
use voyago_store::{
    booking_repo::StoreBookingRepository, inventory_repo::StoreInventoryRepository,
    payment_repo::StorePaymentRepository, payment_repo::StoreWalletRepository,
    search_repo::StoreSearchRepository, DbClient, EventProducer, RedisClient,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "voyago_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = voyago_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Voyago API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let redis_client = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");

    let kafka_producer =
        EventProducer::new(&config.kafka.brokers).expect("Failed to create Kafka producer");

    let app_state = AppState {
        bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
        inventory: Arc::new(StoreInventoryRepository::new(db.pool.clone())),
        payments: Arc::new(StorePaymentRepository::new(db.pool.clone())),
        wallets: Arc::new(StoreWalletRepository::new(db.pool.clone())),
        search: Arc::new(StoreSearchRepository::new(
            db.pool.clone(),
            config.booking_rules.service_tax_percent,
        )),
        redis: Arc::new(redis_client),
        kafka: Arc::new(kafka_producer),
        gateway: Arc::new(PaymentOrchestrator::new(Arc::new(SimulatedGateway))),
        rules: config.booking_rules.clone(),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    tokio::spawn(worker::run_expiry_sweep(app_state.clone()));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
