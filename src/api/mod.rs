pub mod attendance;
pub mod dashboard;
pub mod membership;
pub mod payment;

#[cfg(test)]
pub(crate) mod fake_upstream;
