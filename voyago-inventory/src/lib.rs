pub mod allocation;
pub mod fare;
pub mod pricing;
pub mod rac;
pub mod refund;
pub mod rental;
