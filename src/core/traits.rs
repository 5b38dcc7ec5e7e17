use crate::core::{
    errors::ExchangeError,
    types::{
        Balance, FillRecord, LimitOrder, MarketOrder, OrderReference, OrderStatusSnapshot,
    },
};
use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait OrderPlacer {
    /// Place a limit order and return a reference to it. Acceptance does not
    /// imply execution.
    async fn place_limit_order(&self, order: LimitOrder) -> Result<OrderReference, ExchangeError>;

    /// Place a market order. The exchange reports the fills inline.
    async fn place_market_order(&self, order: MarketOrder) -> Result<Vec<FillRecord>, ExchangeError>;
}

/// Status lookups and cancellation for orders that were already placed
#[async_trait]
pub trait OrderTracker: Send + Sync {
    /// Fresh status of the order; never served from a cache.
    async fn query_order(&self, order: &OrderReference) -> Result<OrderStatusSnapshot, ExchangeError>;

    /// Cancel the order and return the quantity executed before cancellation.
    async fn cancel_order(&self, order: &OrderReference) -> Result<Decimal, ExchangeError>;
}

#[async_trait]
pub trait AccountInfo {
    async fn get_account_balance(&self) -> Result<Vec<Balance>, ExchangeError>;

    /// Balances that hold anything, free or locked
    async fn get_positions(&self) -> Result<Vec<Balance>, ExchangeError>;
}

// Composite trait for callers that need the whole trading surface
pub trait ExchangeConnector: OrderPlacer + OrderTracker + AccountInfo {}
