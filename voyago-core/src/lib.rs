pub mod booking;
pub mod money;
pub mod payment;
pub mod repository;
pub mod search;
