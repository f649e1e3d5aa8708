pub mod finance;
pub mod lifecycle;
pub mod orchestrator;

pub use finance::{plan_refund, RefundPlan};
pub use lifecycle::{check_transition, LifecycleError};
pub use orchestrator::{PaymentOrchestrator, SimulatedGateway};
