pub mod attendance;
pub mod membership;
pub mod payment;
