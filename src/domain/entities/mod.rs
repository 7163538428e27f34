pub mod customer;
pub mod plan;
pub mod subscription;
pub mod subscription_transition;
