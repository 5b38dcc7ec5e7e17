use crate::core::errors::ExchangeError;
use crate::core::kernel::{RequestSpec, RestClient};
use crate::core::types::{AllOrdersQuery, LimitOrder, MarketOrder, OrderReference, OrderType};
use crate::exchanges::binance::types::{
    BinanceAccountInfo, BinanceCanceledOrder, BinanceDeposit, BinanceOrder,
    BinanceOrderResponse, BinanceTrade, BinanceWithdraw,
};
use serde::de::IgnoredAny;

const ACCOUNT: &str = "/api/v3/account";
const ORDER: &str = "/api/v3/order";
const TEST_ORDER: &str = "/api/v3/order/test";
const OPEN_ORDERS: &str = "/api/v3/openOrders";
const ALL_ORDERS: &str = "/api/v3/allOrders";
const MY_TRADES: &str = "/api/v3/myTrades";
const WITHDRAW_HISTORY: &str = "/sapi/v1/capital/withdraw/history";
const DEPOSIT_HISTORY: &str = "/sapi/v1/capital/deposit/hisrec";

/// Thin typed wrapper around `RestClient` for the Binance spot API.
///
/// Every method here is a single signed round trip. Arguments are expected to
/// be validated by the caller.
pub struct BinanceRestClient<R: RestClient> {
    client: R,
    recv_window: Option<u64>,
}

impl<R: RestClient> BinanceRestClient<R> {
    pub fn new(client: R, recv_window: Option<u64>) -> Self {
        Self {
            client,
            recv_window,
        }
    }

    pub fn inner(&self) -> &R {
        &self.client
    }

    fn limit_order_spec(&self, path: &str, order: &LimitOrder) -> RequestSpec {
        RequestSpec::post(path)
            .signed()
            .param("symbol", &order.symbol)
            .param("side", order.side.as_str())
            .param("type", OrderType::Limit.as_str())
            .param("timeInForce", order.time_in_force.as_str())
            .param("quantity", order.quantity)
            .param("price", order.price)
            .param_opt("recvWindow", self.recv_window)
    }

    fn market_order_spec(&self, path: &str, order: &MarketOrder) -> RequestSpec {
        RequestSpec::post(path)
            .signed()
            .param("symbol", &order.symbol)
            .param("side", order.side.as_str())
            .param("type", OrderType::Market.as_str())
            .param("quantity", order.quantity)
            .param_opt("recvWindow", self.recv_window)
            .param("newOrderRespType", "FULL")
    }

    fn order_ref_spec(&self, spec: RequestSpec, order: &OrderReference) -> RequestSpec {
        spec.signed()
            .param("symbol", &order.symbol)
            .param("orderId", order.order_id)
            .param_opt("recvWindow", self.recv_window)
    }

    /// Get account information
    pub async fn get_account_info(&self) -> Result<BinanceAccountInfo, ExchangeError> {
        self.client
            .execute(RequestSpec::get(ACCOUNT).signed())
            .await
    }

    pub async fn place_limit_order(
        &self,
        order: &LimitOrder,
    ) -> Result<BinanceOrderResponse, ExchangeError> {
        self.client
            .execute(self.limit_order_spec(ORDER, order))
            .await
    }

    pub async fn place_market_order(
        &self,
        order: &MarketOrder,
    ) -> Result<BinanceOrderResponse, ExchangeError> {
        self.client
            .execute(self.market_order_spec(ORDER, order))
            .await
    }

    /// Validate a limit order against the matching engine without placing it.
    /// The exchange answers with an empty object.
    pub async fn test_limit_order(&self, order: &LimitOrder) -> Result<(), ExchangeError> {
        let _: IgnoredAny = self
            .client
            .execute(self.limit_order_spec(TEST_ORDER, order))
            .await?;
        Ok(())
    }

    pub async fn test_market_order(&self, order: &MarketOrder) -> Result<(), ExchangeError> {
        let _: IgnoredAny = self
            .client
            .execute(self.market_order_spec(TEST_ORDER, order))
            .await?;
        Ok(())
    }

    /// Query a single order
    pub async fn get_order(&self, order: &OrderReference) -> Result<BinanceOrder, ExchangeError> {
        self.client
            .execute(self.order_ref_spec(RequestSpec::get(ORDER), order))
            .await
    }

    /// Cancel an order
    pub async fn cancel_order(
        &self,
        order: &OrderReference,
    ) -> Result<BinanceCanceledOrder, ExchangeError> {
        self.client
            .execute(self.order_ref_spec(RequestSpec::delete(ORDER), order))
            .await
    }

    /// Open orders for `symbol`, or for every symbol when `None`
    pub async fn get_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<BinanceOrder>, ExchangeError> {
        let spec = RequestSpec::get(OPEN_ORDERS)
            .signed()
            .param_opt("symbol", symbol)
            .param_opt("recvWindow", self.recv_window);
        self.client.execute(spec).await
    }

    pub async fn get_all_orders(
        &self,
        query: &AllOrdersQuery,
    ) -> Result<Vec<BinanceOrder>, ExchangeError> {
        let spec = RequestSpec::get(ALL_ORDERS)
            .signed()
            .param("symbol", &query.symbol)
            .param_opt("recvWindow", self.recv_window)
            .param("limit", query.limit)
            .param_opt("orderId", query.order_id);
        self.client.execute(spec).await
    }

    pub async fn get_my_trades(&self, symbol: &str) -> Result<Vec<BinanceTrade>, ExchangeError> {
        let spec = RequestSpec::get(MY_TRADES)
            .signed()
            .param("symbol", symbol)
            .param_opt("recvWindow", self.recv_window);
        self.client.execute(spec).await
    }

    pub async fn get_withdraw_history(&self) -> Result<Vec<BinanceWithdraw>, ExchangeError> {
        let spec = RequestSpec::get(WITHDRAW_HISTORY)
            .signed()
            .param_opt("recvWindow", self.recv_window);
        self.client.execute(spec).await
    }

    pub async fn get_deposit_history(&self) -> Result<Vec<BinanceDeposit>, ExchangeError> {
        let spec = RequestSpec::get(DEPOSIT_HISTORY)
            .signed()
            .param_opt("recvWindow", self.recv_window);
        self.client.execute(spec).await
    }
}
