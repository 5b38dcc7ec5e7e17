use crate::core::{
    config::ExchangeConfig,
    errors::ExchangeError,
    fulfillment::{FulfillmentWaiter, RetryPolicy},
    kernel::RestClient,
    traits::{AccountInfo, ExchangeConnector, OrderPlacer, OrderTracker},
    types::{
        AllOrdersQuery, Balance, FillRecord, FulfillmentOutcome, LimitOrder, MarketOrder,
        OrderReference, OrderStatusSnapshot,
    },
};
use crate::exchanges::binance::converters::{
    convert_binance_balance, convert_binance_order, convert_order_fills, simulated_market_fill,
};
use crate::exchanges::binance::rest::BinanceRestClient;
use crate::exchanges::binance::types::{
    BinanceAccountInfo, BinanceCanceledOrder, BinanceDeposit, BinanceOrder, BinanceTrade,
    BinanceWithdraw,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Binance spot connector over an injected `RestClient`
pub struct BinanceConnector<R: RestClient> {
    rest: BinanceRestClient<R>,
    config: ExchangeConfig,
    retry_policy: RetryPolicy,
}

impl<R: RestClient> BinanceConnector<R> {
    pub fn new(rest: R, config: ExchangeConfig) -> Self {
        Self {
            rest: BinanceRestClient::new(rest, config.recv_window),
            config,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replace the polling budget used by `place_limit_order_and_wait`
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    pub fn rest(&self) -> &R {
        self.rest.inner()
    }

    /// Check if authentication is available
    pub fn can_authenticate(&self) -> bool {
        self.config.has_credentials()
    }
}

impl<R: RestClient> ExchangeConnector for BinanceConnector<R> {}

/// Account and order history
impl<R: RestClient> BinanceConnector<R> {
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn get_account_info(&self) -> Result<BinanceAccountInfo, ExchangeError> {
        self.rest.get_account_info().await
    }

    /// Current status of an order
    #[instrument(skip(self, order), fields(exchange = "binance", order = %order))]
    pub async fn check_order(&self, order: &OrderReference) -> Result<BinanceOrder, ExchangeError> {
        order.validate()?;
        self.rest.get_order(order).await
    }

    /// Cancel an open order and return the exchange's view of it
    #[instrument(skip(self, order), fields(exchange = "binance", order = %order))]
    pub async fn cancel_order(
        &self,
        order: &OrderReference,
    ) -> Result<BinanceCanceledOrder, ExchangeError> {
        order.validate()?;
        self.rest.cancel_order(order).await
    }

    /// Open orders on one symbol, or across the account when `symbol` is `None`
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn get_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<BinanceOrder>, ExchangeError> {
        if let Some(symbol) = symbol {
            crate::core::types::validate_symbol(symbol)?;
        }
        self.rest.get_open_orders(symbol).await
    }

    /// Every order on `query.symbol`: active, canceled or filled
    #[instrument(skip(self), fields(exchange = "binance", symbol = %query.symbol))]
    pub async fn get_all_orders(
        &self,
        query: &AllOrdersQuery,
    ) -> Result<Vec<BinanceOrder>, ExchangeError> {
        query.validate()?;
        self.rest.get_all_orders(query).await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn get_trades(&self, symbol: &str) -> Result<Vec<BinanceTrade>, ExchangeError> {
        crate::core::types::validate_symbol(symbol)?;
        self.rest.get_my_trades(symbol).await
    }

    /// Trades on `order.symbol` that belong to `order`
    #[instrument(skip(self, order), fields(exchange = "binance", order = %order))]
    pub async fn get_trades_for_order(
        &self,
        order: &OrderReference,
    ) -> Result<Vec<BinanceTrade>, ExchangeError> {
        order.validate()?;
        let trades = self.rest.get_my_trades(&order.symbol).await?;
        Ok(trades
            .into_iter()
            .filter(|trade| trade.order_id == order.order_id)
            .collect())
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn get_withdraw_history(&self) -> Result<Vec<BinanceWithdraw>, ExchangeError> {
        self.rest.get_withdraw_history().await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn get_deposit_history(&self) -> Result<Vec<BinanceDeposit>, ExchangeError> {
        self.rest.get_deposit_history().await
    }
}

/// Test orders and synchronous placement
impl<R: RestClient> BinanceConnector<R> {
    /// Submit a market order to the test endpoint. The exchange validates it
    /// and nothing is placed.
    #[instrument(skip(self), fields(exchange = "binance", symbol = %order.symbol))]
    pub async fn place_test_order(&self, order: &MarketOrder) -> Result<(), ExchangeError> {
        order.validate()?;
        self.rest.test_market_order(order).await
    }

    #[instrument(skip(self), fields(exchange = "binance", symbol = %order.symbol))]
    pub async fn place_test_limit_order(&self, order: &LimitOrder) -> Result<(), ExchangeError> {
        order.validate()?;
        self.rest.test_limit_order(order).await
    }

    /// Submit a test market order and fabricate the fill it would have had at
    /// `reference_price`. The returned record is flagged `simulated`.
    #[instrument(skip(self), fields(exchange = "binance", symbol = %order.symbol))]
    pub async fn place_test_order_simulated(
        &self,
        order: &MarketOrder,
        reference_price: Decimal,
    ) -> Result<FillRecord, ExchangeError> {
        crate::core::types::validate_positive("reference price", reference_price)?;
        let fill = simulated_market_fill(order, reference_price)?;
        self.place_test_order(order).await?;

        info!(price = %fill.price, quantity = %fill.quantity, "simulated test fill");
        Ok(fill)
    }

    /// Place a limit order and block until it fills, closes or times out.
    /// See [`FulfillmentWaiter::await_fulfillment`] for the outcomes.
    pub async fn place_limit_order_and_wait(
        &self,
        order: LimitOrder,
    ) -> Result<FulfillmentOutcome, ExchangeError> {
        let placed = self.place_limit_order(order).await?;
        FulfillmentWaiter::new(self, self.retry_policy)
            .await_fulfillment(&placed)
            .await
    }

    /// Same as `place_limit_order_and_wait`, but polling stops and the order
    /// is canceled as soon as `abort` is cancelled.
    pub async fn place_limit_order_and_wait_with_abort(
        &self,
        order: LimitOrder,
        abort: CancellationToken,
    ) -> Result<FulfillmentOutcome, ExchangeError> {
        let placed = self.place_limit_order(order).await?;
        FulfillmentWaiter::new(self, self.retry_policy)
            .with_abort_token(abort)
            .await_fulfillment(&placed)
            .await
    }
}

#[async_trait]
impl<R: RestClient> OrderPlacer for BinanceConnector<R> {
    #[instrument(skip(self), fields(exchange = "binance", symbol = %order.symbol))]
    async fn place_limit_order(&self, order: LimitOrder) -> Result<OrderReference, ExchangeError> {
        order.validate()?;
        let response = self.rest.place_limit_order(&order).await?;
        Ok(OrderReference::new(response.symbol, response.order_id))
    }

    #[instrument(skip(self), fields(exchange = "binance", symbol = %order.symbol))]
    async fn place_market_order(
        &self,
        order: MarketOrder,
    ) -> Result<Vec<FillRecord>, ExchangeError> {
        order.validate()?;
        let response = self.rest.place_market_order(&order).await?;
        Ok(convert_order_fills(&response))
    }
}

#[async_trait]
impl<R: RestClient> OrderTracker for BinanceConnector<R> {
    async fn query_order(
        &self,
        order: &OrderReference,
    ) -> Result<OrderStatusSnapshot, ExchangeError> {
        let status = self.rest.get_order(order).await?;
        Ok(convert_binance_order(status))
    }

    async fn cancel_order(&self, order: &OrderReference) -> Result<Decimal, ExchangeError> {
        let canceled = self.rest.cancel_order(order).await?;
        Ok(canceled.executed_qty)
    }
}

#[async_trait]
impl<R: RestClient> AccountInfo for BinanceConnector<R> {
    #[instrument(skip(self), fields(exchange = "binance"))]
    async fn get_account_balance(&self) -> Result<Vec<Balance>, ExchangeError> {
        let account = self.rest.get_account_info().await?;
        Ok(account
            .balances
            .into_iter()
            .map(convert_binance_balance)
            .collect())
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    async fn get_positions(&self) -> Result<Vec<Balance>, ExchangeError> {
        let balances = self.get_account_balance().await?;
        Ok(balances
            .into_iter()
            .filter(|balance| !balance.is_empty())
            .collect())
    }
}
