pub mod enums;
pub mod images;
pub mod operations;
pub mod plans;
pub mod subscriptions;
