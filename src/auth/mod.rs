pub mod bearer;
pub mod middleware;
