use std::sync::Arc;
use voyago_booking::PaymentOrchestrator;
use voyago_core::repository::{
    BookingRepository, InventoryRepository, PaymentRepository, SearchRepository, WalletRepository,
};
use voyago_store::app_config::BookingRules;
use voyago_store::{EventProducer, RedisClient};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub wallets: Arc<dyn WalletRepository>,
    pub search: Arc<dyn SearchRepository>,
    pub redis: Arc<RedisClient>,
    pub kafka: Arc<EventProducer>,
    pub gateway: Arc<PaymentOrchestrator>,
    pub rules: BookingRules,
    pub auth: AuthConfig,
}
