use crate::core::types::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceAccountInfo {
    #[serde(rename = "makerCommission", default)]
    pub maker_commission: i64,
    #[serde(rename = "takerCommission", default)]
    pub taker_commission: i64,
    #[serde(rename = "buyerCommission", default)]
    pub buyer_commission: i64,
    #[serde(rename = "sellerCommission", default)]
    pub seller_commission: i64,
    #[serde(rename = "canTrade", default)]
    pub can_trade: bool,
    #[serde(rename = "canWithdraw", default)]
    pub can_withdraw: bool,
    #[serde(rename = "canDeposit", default)]
    pub can_deposit: bool,
    #[serde(rename = "updateTime", default)]
    pub update_time: i64,
    pub balances: Vec<BinanceBalance>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

/// Response to `POST /api/v3/order`. With `newOrderRespType=FULL` the
/// exchange reports the fills inline; the ACK variant only carries the ids.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceOrderResponse {
    pub symbol: String,
    #[serde(rename = "orderId")]
    pub order_id: i64,
    #[serde(rename = "clientOrderId", default)]
    pub client_order_id: String,
    #[serde(rename = "transactTime", default)]
    pub transact_time: i64,
    #[serde(default)]
    pub price: Decimal,
    #[serde(rename = "origQty", default)]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty", default)]
    pub executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty", default)]
    pub cummulative_quote_qty: Decimal,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(rename = "timeInForce", default)]
    pub time_in_force: String,
    #[serde(rename = "type", default)]
    pub order_type: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub fills: Vec<BinanceFill>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceFill {
    pub price: Decimal,
    pub qty: Decimal,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(rename = "commissionAsset", default)]
    pub commission_asset: String,
    #[serde(rename = "tradeId", default)]
    pub trade_id: i64,
}

/// Order as returned by `GET /api/v3/order`, `openOrders` and `allOrders`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceOrder {
    pub symbol: String,
    #[serde(rename = "orderId")]
    pub order_id: i64,
    #[serde(rename = "clientOrderId", default)]
    pub client_order_id: String,
    pub price: Decimal,
    #[serde(rename = "origQty")]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty")]
    pub executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty", default)]
    pub cummulative_quote_qty: Decimal,
    pub status: OrderStatus,
    #[serde(rename = "timeInForce", default)]
    pub time_in_force: String,
    #[serde(rename = "type", default)]
    pub order_type: String,
    #[serde(default)]
    pub side: String,
    #[serde(rename = "stopPrice", default)]
    pub stop_price: Decimal,
    #[serde(rename = "icebergQty", default)]
    pub iceberg_qty: Decimal,
    #[serde(default)]
    pub time: i64,
    #[serde(rename = "updateTime", default)]
    pub update_time: i64,
    #[serde(rename = "isWorking", default)]
    pub is_working: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceCanceledOrder {
    pub symbol: String,
    #[serde(rename = "origClientOrderId", default)]
    pub orig_client_order_id: String,
    #[serde(rename = "orderId")]
    pub order_id: i64,
    #[serde(rename = "clientOrderId", default)]
    pub client_order_id: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(rename = "origQty", default)]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty", default)]
    pub executed_qty: Decimal,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceTrade {
    pub symbol: String,
    pub id: i64,
    #[serde(rename = "orderId")]
    pub order_id: i64,
    pub price: Decimal,
    pub qty: Decimal,
    #[serde(rename = "quoteQty", default)]
    pub quote_qty: Decimal,
    pub commission: Decimal,
    #[serde(rename = "commissionAsset")]
    pub commission_asset: String,
    pub time: i64,
    #[serde(rename = "isBuyer")]
    pub is_buyer: bool,
    #[serde(rename = "isMaker")]
    pub is_maker: bool,
    #[serde(rename = "isBestMatch", default)]
    pub is_best_match: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceDeposit {
    pub amount: Decimal,
    pub coin: String,
    #[serde(default)]
    pub network: String,
    /// 0 pending, 6 credited but cannot withdraw, 1 success
    pub status: i32,
    pub address: String,
    #[serde(rename = "addressTag", default)]
    pub address_tag: String,
    #[serde(rename = "txId", default)]
    pub tx_id: String,
    #[serde(rename = "insertTime")]
    pub insert_time: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinanceWithdraw {
    pub id: String,
    pub amount: Decimal,
    #[serde(rename = "transactionFee", default)]
    pub transaction_fee: Decimal,
    pub coin: String,
    /// 0 email sent, 1 canceled, 2 awaiting approval, 3 rejected,
    /// 4 processing, 5 failure, 6 completed
    pub status: i32,
    pub address: String,
    #[serde(rename = "txId", default)]
    pub tx_id: String,
    #[serde(rename = "applyTime")]
    pub apply_time: String,
    #[serde(default)]
    pub network: String,
}
