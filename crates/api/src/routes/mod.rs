pub mod health;
pub mod marathons;
pub mod metrics;
pub mod registrations;
pub mod session;
