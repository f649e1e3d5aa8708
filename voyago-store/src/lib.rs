pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod inventory_repo;
pub mod payment_repo;
pub mod redis_repo;
pub mod search_repo;

pub use database::DbClient;
pub use events::EventProducer;
pub use redis_repo::RedisClient;
