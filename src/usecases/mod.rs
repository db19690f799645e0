pub mod image_processing;
pub mod plans;
pub mod subscriptions;
