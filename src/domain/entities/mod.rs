pub mod image_records;
pub mod plans;
pub mod subscriptions;
