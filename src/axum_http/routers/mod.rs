pub mod images;
pub mod plans;
pub mod subscriptions;
