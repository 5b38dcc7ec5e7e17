pub mod audit;
pub mod config;
pub mod errors;
pub mod fulfillment;
pub mod kernel;
pub mod traits;
pub mod types;
