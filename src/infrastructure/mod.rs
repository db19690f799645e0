pub mod engine;
pub mod postgres;
