pub mod core;
pub mod exchanges;

pub use core::{
    audit::{AuditEntry, AuditSink, JsonlAuditSink, MemoryAuditSink},
    config::ExchangeConfig,
    errors::ExchangeError,
    fulfillment::{FulfillmentWaiter, RetryPolicy},
    traits::{AccountInfo, ExchangeConnector, OrderPlacer, OrderTracker},
    types::*,
};
pub use exchanges::binance::{create_binance_connector, BinanceConnector};
